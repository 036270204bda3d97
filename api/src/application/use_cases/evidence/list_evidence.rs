use uuid::Uuid;

use crate::application::ports::evidence_repository::EvidenceRepository;
use crate::domain::evidence::Evidence;

pub struct ListEvidence<'a, E: EvidenceRepository + ?Sized> {
    pub evidence: &'a E,
}

impl<'a, E: EvidenceRepository + ?Sized> ListEvidence<'a, E> {
    pub async fn execute(
        &self,
        indicator_id: Uuid,
        include_inactive: bool,
    ) -> anyhow::Result<Vec<Evidence>> {
        self.evidence
            .list_for_indicator(indicator_id, include_inactive)
            .await
    }
}
