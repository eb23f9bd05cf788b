// RelatedEntities backed by the project and activity containers.
//
// A reference exists when the document can be read in the tenant's partition and
// carries no soft-delete sentinel.

use crate::modules::time_entries::core::ports::RelatedEntities;
use crate::shared::infrastructure::document_store::{DocumentStore, StoreError};
use crate::shared::infrastructure::query_builder::DELETED_FIELD;
use crate::shared::infrastructure::repository::RepositoryError;
use async_trait::async_trait;
use std::sync::Arc;

pub struct DocumentRelatedEntities {
    projects: Arc<dyn DocumentStore>,
    activities: Arc<dyn DocumentStore>,
}

impl DocumentRelatedEntities {
    pub fn new(projects: Arc<dyn DocumentStore>, activities: Arc<dyn DocumentStore>) -> Self {
        Self { projects, activities }
    }
}

async fn visible(
    store: &dyn DocumentStore,
    tenant_id: &str,
    id: &str,
) -> Result<bool, RepositoryError> {
    match store.read(tenant_id, id).await {
        Ok(document) => Ok(!document.contains_key(DELETED_FIELD)),
        Err(StoreError::NotFound { .. }) => Ok(false),
        Err(error) => Err(RepositoryError::Store(error)),
    }
}

#[async_trait]
impl RelatedEntities for DocumentRelatedEntities {
    async fn project_exists(
        &self,
        tenant_id: &str,
        project_id: &str,
    ) -> Result<bool, RepositoryError> {
        visible(self.projects.as_ref(), tenant_id, project_id).await
    }

    async fn activity_exists(
        &self,
        tenant_id: &str,
        activity_id: &str,
    ) -> Result<bool, RepositoryError> {
        visible(self.activities.as_ref(), tenant_id, activity_id).await
    }
}
