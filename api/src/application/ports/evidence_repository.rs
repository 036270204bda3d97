use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::evidence::{Evidence, NewEvidence};

#[async_trait]
pub trait EvidenceRepository: Send + Sync {
    async fn list_for_indicator(
        &self,
        indicator_id: Uuid,
        include_inactive: bool,
    ) -> anyhow::Result<Vec<Evidence>>;
    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Evidence>>;
    async fn insert(&self, evidence: &NewEvidence) -> anyhow::Result<Evidence>;
    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool>;
}
