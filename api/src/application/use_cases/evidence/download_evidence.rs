use uuid::Uuid;

use crate::application::errors::ServiceError;
use crate::application::ports::evidence_repository::EvidenceRepository;
use crate::application::ports::evidence_store::EvidenceStore;
use crate::domain::evidence::Evidence;

pub struct DownloadEvidence<'a, E, S>
where
    E: EvidenceRepository + ?Sized,
    S: EvidenceStore + ?Sized,
{
    pub evidence: &'a E,
    pub store: &'a S,
}

impl<'a, E, S> DownloadEvidence<'a, E, S>
where
    E: EvidenceRepository + ?Sized,
    S: EvidenceStore + ?Sized,
{
    /// Inactive evidence is only served when `include_inactive` is set.
    pub async fn execute(
        &self,
        id: Uuid,
        include_inactive: bool,
    ) -> Result<(Evidence, Vec<u8>), ServiceError> {
        let evidence = self
            .evidence
            .find(id)
            .await?
            .filter(|e| include_inactive || e.is_active)
            .ok_or(ServiceError::NotFound)?;
        let bytes = self.store.read(&evidence.storage_path).await.map_err(|err| {
            tracing::warn!(error = ?err, evidence_id = %id, "evidence_file_missing");
            ServiceError::NotFound
        })?;
        Ok((evidence, bytes))
    }
}
