//! Command-line and environment configuration.

use std::net::{IpAddr, SocketAddr};

use bugdesk_memory::InMemoryStore;
use bugdesk_store::{
    backend::StoreBackendBuilder,
    error::DocumentStoreResult,
    store::DynDocumentStore,
};
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Bug report and user tracking API server")]
pub struct Config {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0", env = "BUGDESK_HOST")]
    pub host: IpAddr,

    /// Server port
    #[arg(short = 'p', long, default_value = "5000", env = "PORT")]
    pub port: u16,

    /// Document store backend
    #[arg(long, value_enum, default_value_t = BackendKind::Memory, env = "BUGDESK_BACKEND")]
    pub backend: BackendKind,

    /// MongoDB connection string, used by the mongodb backend
    #[arg(long, default_value = "mongodb://localhost:27017", env = "MONGODB_URI")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, default_value = "bugdesk", env = "BUGDESK_DATABASE")]
    pub database: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, env = "BUGDESK_LOG_FORMAT")]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Builds the configured backend and wraps it in a store handle.
    pub async fn connect_store(&self) -> DocumentStoreResult<DynDocumentStore> {
        match self.backend {
            BackendKind::Memory => InMemoryStore::builder()
                .build()
                .await
                .map(DynDocumentStore::from_backend),
            BackendKind::Mongodb => self.connect_mongodb().await,
        }
    }

    #[cfg(feature = "mongodb")]
    async fn connect_mongodb(&self) -> DocumentStoreResult<DynDocumentStore> {
        bugdesk_mongodb::MongoDbStore::builder(&self.mongodb_uri, &self.database)
            .build()
            .await
            .map(DynDocumentStore::from_backend)
    }

    #[cfg(not(feature = "mongodb"))]
    async fn connect_mongodb(&self) -> DocumentStoreResult<DynDocumentStore> {
        Err(bugdesk_store::error::DocumentStoreError::Initialization(
            "the mongodb backend requires building bugdesk with the `mongodb` feature".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("bugdesk").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "--host", "127.0.0.1",
            "--port", "8080",
            "--backend", "mongodb",
            "--database", "tracker",
            "--log-format", "json",
        ]);

        assert_eq!(config.socket_addr(), "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.backend, BackendKind::Mongodb);
        assert_eq!(config.database, "tracker");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let result = Config::try_parse_from(["bugdesk", "--backend", "postgres"]);

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn memory_backend_connects() {
        let store = parse(&["--backend", "memory"]).connect_store().await.unwrap();

        assert!(store.shutdown().await.is_ok());
    }

    #[cfg(not(feature = "mongodb"))]
    #[tokio::test]
    async fn mongodb_backend_needs_the_feature() {
        let err = parse(&["--backend", "mongodb"]).connect_store().await.unwrap_err();

        assert!(matches!(err, bugdesk_store::error::DocumentStoreError::Initialization(_)));
    }
}
