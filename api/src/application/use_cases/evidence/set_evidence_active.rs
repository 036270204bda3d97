use uuid::Uuid;

use crate::application::errors::ServiceError;
use crate::application::ports::evidence_repository::EvidenceRepository;

pub struct SetEvidenceActive<'a, E: EvidenceRepository + ?Sized> {
    pub evidence: &'a E,
}

impl<'a, E: EvidenceRepository + ?Sized> SetEvidenceActive<'a, E> {
    /// Returns the owning indicator id. Stored bytes are left in place.
    pub async fn execute(&self, id: Uuid, active: bool) -> Result<Uuid, ServiceError> {
        let evidence = self
            .evidence
            .find(id)
            .await?
            .ok_or(ServiceError::NotFound)?;
        self.evidence.set_active(id, active).await?;
        tracing::info!(evidence_id = %id, active, "evidence_active_changed");
        Ok(evidence.indicator_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::evidence::fakes::{MemoryEvidence, MemoryStore};
    use crate::application::use_cases::evidence::list_evidence::ListEvidence;

    #[tokio::test]
    async fn deactivated_evidence_leaves_default_listing() {
        let evidence = MemoryEvidence::default();
        let store = MemoryStore::default();
        let saved = evidence.seed(&store, "foto.png", b"\x89PNG", true).await;

        let uc = SetEvidenceActive {
            evidence: &evidence,
        };
        assert_eq!(uc.execute(saved.id, false).await.unwrap(), saved.indicator_id);

        let list = ListEvidence {
            evidence: &evidence,
        };
        assert!(list.execute(saved.indicator_id, false).await.unwrap().is_empty());
        assert_eq!(list.execute(saved.indicator_id, true).await.unwrap().len(), 1);
        assert_eq!(store.files(), 1);
    }

    #[tokio::test]
    async fn unknown_evidence_is_not_found() {
        let evidence = MemoryEvidence::default();
        let uc = SetEvidenceActive {
            evidence: &evidence,
        };
        assert!(matches!(
            uc.execute(Uuid::new_v4(), true).await,
            Err(ServiceError::NotFound)
        ));
    }
}
