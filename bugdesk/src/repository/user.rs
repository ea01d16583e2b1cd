use std::sync::Arc;

use bson::Uuid;
use bugdesk_store::{
    collection::{Collection, not_found_as_none},
    query::{Query, SortDirection},
    store::DynDocumentStore,
};
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    model::user::{User, UserFilter, UserPayload, UserStats},
};

/// Email uniqueness is left to the store's unique index on `email`.
#[derive(Debug, Clone)]
pub struct UserRepository {
    store: Arc<DynDocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<DynDocumentStore>) -> Self {
        Self { store }
    }

    fn users(&self) -> Collection<'_, User> {
        self.store.collection::<User>()
    }

    pub async fn list(&self, filter: &UserFilter) -> AppResult<Vec<User>> {
        let query = Query::builder()
            .maybe_filter(filter.to_expr())
            .sort("createdAt", SortDirection::Desc)
            .build();

        Ok(self.users().query(query).await?)
    }

    pub async fn find(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users().get(id).await?)
    }

    pub async fn create(&self, payload: UserPayload) -> AppResult<User> {
        let user = User::new(payload.validate().map_err(AppError::Validation)?);

        self.users().insert(user.clone()).await?;
        info!(user.id = %user.id, "User created");

        Ok(user)
    }

    pub async fn update(&self, id: Uuid, payload: UserPayload) -> AppResult<Option<User>> {
        let Some(mut user) = self.find(id).await? else {
            return Ok(None);
        };

        user.apply(
            payload
                .overlay(UserPayload::from(&user))
                .validate()
                .map_err(AppError::Validation)?,
        );

        let saved = not_found_as_none(self.users().update(user.clone()).await)?;
        if saved.is_some() {
            info!(user.id = %user.id, "User updated");
        }

        Ok(saved.map(|()| user))
    }

    pub async fn update_status(&self, id: Uuid, status: &str) -> AppResult<Option<User>> {
        let payload = UserPayload {
            status: Some(status.to_string()),
            ..UserPayload::default()
        };

        self.update(id, payload).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let deleted = not_found_as_none(self.users().delete(id).await)?.is_some();

        if deleted {
            info!(user.id = %id, "User deleted");
        }

        Ok(deleted)
    }

    pub async fn stats(&self) -> AppResult<UserStats> {
        let users = self.users().query(Query::new()).await?;

        Ok(users.iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::memory_store;

    fn person(name: &str, email: &str) -> UserPayload {
        UserPayload {
            name: Some(Some(name.into())),
            email: Some(Some(email.into())),
            ..UserPayload::default()
        }
    }

    #[tokio::test]
    async fn duplicate_email_differing_in_case_is_rejected() {
        let repo = UserRepository::new(memory_store().await);
        repo.create(person("Alice", "alice@example.com")).await.unwrap();

        let err = repo.create(person("Other Alice", "ALICE@example.com")).await.unwrap_err();

        assert!(matches!(&err, AppError::Uniqueness(field) if field == "email"));
        assert_eq!(err.to_string(), "Email already exists");
    }

    #[tokio::test]
    async fn update_may_keep_own_email_but_not_take_another() {
        let repo = UserRepository::new(memory_store().await);
        let alice = repo.create(person("Alice", "alice@example.com")).await.unwrap();
        repo.create(person("Bob", "bob@example.com")).await.unwrap();

        let renamed = repo
            .update(alice.id, person("Alicia", "alice@example.com"))
            .await
            .unwrap()
            .unwrap();
        let err = repo
            .update(alice.id, UserPayload { email: Some(Some("bob@example.com".into())), ..UserPayload::default() })
            .await
            .unwrap_err();

        assert_eq!(renamed.name, "Alicia");
        assert!(matches!(err, AppError::Uniqueness(_)));
        assert_eq!(repo.find(alice.id).await.unwrap().unwrap().email, "alice@example.com");
    }

    #[tokio::test]
    async fn stats_cover_every_user() {
        let repo = UserRepository::new(memory_store().await);
        let admin = repo.create(person("Alice", "alice@example.com")).await.unwrap();
        repo.create(person("Bob", "bob@example.com")).await.unwrap();
        repo.update(admin.id, UserPayload { role: Some("admin".into()), ..UserPayload::default() })
            .await
            .unwrap();
        repo.update_status(admin.id, "inactive").await.unwrap();

        let stats = repo.stats().await.unwrap();

        assert_eq!(
            stats,
            UserStats { total: 2, active: 1, inactive: 1, developer: 1, admin: 1, ..UserStats::default() }
        );
    }
}
