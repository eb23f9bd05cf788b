// Ports define what the time entry core needs from the outside world, without implementing it.
//
// Purpose
// - Existence checks for the project and activity a time entry points at.
//
// Boundaries
// - No concrete input or output here. Adapters implement these traits in the adapters layer.
//
// Testing guidance
// - Back the adapter with in memory document stores in tests.

use crate::shared::infrastructure::repository::RepositoryError;
use async_trait::async_trait;

#[async_trait]
pub trait RelatedEntities: Send + Sync {
    async fn project_exists(
        &self,
        tenant_id: &str,
        project_id: &str,
    ) -> Result<bool, RepositoryError>;
    async fn activity_exists(
        &self,
        tenant_id: &str,
        activity_id: &str,
    ) -> Result<bool, RepositoryError>;
}
