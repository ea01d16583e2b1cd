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
    model::bug::{Bug, BugFilter, BugPayload, BugStats},
};

#[derive(Debug, Clone)]
pub struct BugRepository {
    store: Arc<DynDocumentStore>,
}

impl BugRepository {
    pub fn new(store: Arc<DynDocumentStore>) -> Self {
        Self { store }
    }

    fn bugs(&self) -> Collection<'_, Bug> {
        self.store.collection::<Bug>()
    }

    /// Lists bugs matching every supplied filter, newest first.
    pub async fn list(&self, filter: &BugFilter) -> AppResult<Vec<Bug>> {
        let query = Query::builder()
            .maybe_filter(filter.to_expr())
            .sort("createdAt", SortDirection::Desc)
            .build();

        Ok(self.bugs().query(query).await?)
    }

    pub async fn find(&self, id: Uuid) -> AppResult<Option<Bug>> {
        Ok(self.bugs().get(id).await?)
    }

    pub async fn create(&self, payload: BugPayload) -> AppResult<Bug> {
        let bug = Bug::new(payload.validate().map_err(AppError::Validation)?);

        self.bugs().insert(bug.clone()).await?;
        info!(bug.id = %bug.id, "Bug created");

        Ok(bug)
    }

    /// Merges `payload` onto the stored bug and saves the validated result.
    ///
    /// Returns `None` if there is no bug with this id.
    pub async fn update(&self, id: Uuid, payload: BugPayload) -> AppResult<Option<Bug>> {
        let Some(mut bug) = self.find(id).await? else {
            return Ok(None);
        };

        bug.apply(
            payload
                .overlay(BugPayload::from(&bug))
                .validate()
                .map_err(AppError::Validation)?,
        );

        let saved = not_found_as_none(self.bugs().update(bug.clone()).await)?;
        if saved.is_some() {
            info!(bug.id = %bug.id, "Bug updated");
        }

        Ok(saved.map(|()| bug))
    }

    pub async fn update_status(&self, id: Uuid, status: &str) -> AppResult<Option<Bug>> {
        let payload = BugPayload {
            status: Some(status.to_string()),
            ..BugPayload::default()
        };

        self.update(id, payload).await
    }

    /// Returns `false` if there was no bug with this id.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let deleted = not_found_as_none(self.bugs().delete(id).await)?.is_some();

        if deleted {
            info!(bug.id = %id, "Bug deleted");
        }

        Ok(deleted)
    }

    pub async fn stats(&self) -> AppResult<BugStats> {
        let bugs = self.bugs().query(Query::new()).await?;

        Ok(bugs.iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::{model::bug::BugStatus, repository::testing::memory_store};

    fn report(title: &str, project: &str) -> BugPayload {
        BugPayload {
            title: Some(Some(title.into())),
            description: Some(Some("steps to reproduce".into())),
            reported_by: Some(Some("alice".into())),
            project: Some(project.into()),
            ..BugPayload::default()
        }
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() {
        let repo = BugRepository::new(memory_store().await);

        for (title, project) in [("first", "Web"), ("second", "Mobile"), ("third", "Web")] {
            repo.create(report(title, project)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let web = repo
            .list(&BugFilter { project: Some("Web".into()), ..BugFilter::default() })
            .await
            .unwrap();
        let titles = web.iter().map(|bug| bug.title.as_str()).collect::<Vec<_>>();

        assert_eq!(titles, vec!["third", "first"]);
        assert_eq!(repo.list(&BugFilter::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_of_missing_bug_is_none() {
        let repo = BugRepository::new(memory_store().await);

        assert!(repo.update(Uuid::new(), BugPayload::default()).await.unwrap().is_none());
        assert!(repo.update_status(Uuid::new(), "closed").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_status_keeps_other_fields() {
        let repo = BugRepository::new(memory_store().await);
        let bug = repo.create(report("Crash on save", "Web")).await.unwrap();

        let updated = repo.update_status(bug.id, "in-progress").await.unwrap().unwrap();

        assert_eq!(updated.status, BugStatus::InProgress);
        assert_eq!(updated.title, bug.title);
        assert_eq!(updated.created_at, bug.created_at);
        assert!(updated.updated_at >= bug.updated_at);
    }

    #[tokio::test]
    async fn invalid_status_leaves_bug_untouched() {
        let repo = BugRepository::new(memory_store().await);
        let bug = repo.create(report("Crash on save", "Web")).await.unwrap();

        let err = repo.update_status(bug.id, "done").await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(repo.find(bug.id).await.unwrap(), Some(bug));
    }

    #[tokio::test]
    async fn delete_reports_whether_a_bug_was_removed() {
        let repo = BugRepository::new(memory_store().await);
        let bug = repo.create(report("Crash on save", "Web")).await.unwrap();

        assert!(repo.delete(bug.id).await.unwrap());
        assert!(!repo.delete(bug.id).await.unwrap());
        assert_eq!(repo.find(bug.id).await.unwrap(), None);
    }
}
