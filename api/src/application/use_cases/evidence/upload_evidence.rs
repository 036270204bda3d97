use uuid::Uuid;

use crate::application::errors::ServiceError;
use crate::application::ports::evidence_repository::EvidenceRepository;
use crate::application::ports::evidence_store::EvidenceStore;
use crate::application::ports::record_repository::RecordRepository;
use crate::domain::evidence::{ALLOWED_EXTENSIONS, Evidence, NewEvidence, extension_allowed};
use crate::domain::planning::Indicator;
use crate::domain::validation::{DESCRIPTION_MAX, FieldErrors};

pub struct UploadEvidence<'a, I, E, S>
where
    I: RecordRepository<Record = Indicator> + ?Sized,
    E: EvidenceRepository + ?Sized,
    S: EvidenceStore + ?Sized,
{
    pub indicators: &'a I,
    pub evidence: &'a E,
    pub store: &'a S,
    pub max_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct EvidenceUpload {
    pub indicator_id: Uuid,
    pub original_filename: String,
    pub content_type: Option<String>,
    pub description: Option<String>,
    pub bytes: Vec<u8>,
    pub uploaded_by: Uuid,
}

impl<'a, I, E, S> UploadEvidence<'a, I, E, S>
where
    I: RecordRepository<Record = Indicator> + ?Sized,
    E: EvidenceRepository + ?Sized,
    S: EvidenceStore + ?Sized,
{
    pub async fn execute(&self, upload: EvidenceUpload) -> Result<Evidence, ServiceError> {
        let indicator = self
            .indicators
            .find(upload.indicator_id)
            .await?
            .filter(|i| i.is_active)
            .ok_or(ServiceError::NotFound)?;

        let mut errors = FieldErrors::new();
        if upload.bytes.is_empty() {
            errors.add("file", "Choose a non-empty file");
        } else if upload.bytes.len() > self.max_bytes {
            errors.add(
                "file",
                format!("File exceeds the {} byte limit", self.max_bytes),
            );
        }
        if !extension_allowed(&upload.original_filename) {
            errors.add(
                "file",
                format!("Allowed file types: {}", ALLOWED_EXTENSIONS.join(", ")),
            );
        }
        errors.optional_text("description", upload.description.as_deref(), DESCRIPTION_MAX);
        errors.into_result()?;

        let stored = self
            .store
            .store(indicator.id, &upload.original_filename, &upload.bytes)
            .await
            .map_err(|err| {
                tracing::error!(error = ?err, indicator_id = %indicator.id, "store_evidence_failed");
                err
            })?;
        let content_type = upload.content_type.filter(|c| !c.trim().is_empty()).or_else(|| {
            mime_guess::from_path(&upload.original_filename)
                .first()
                .map(|m| m.essence_str().to_string())
        });
        let inserted = self
            .evidence
            .insert(&NewEvidence {
                indicator_id: indicator.id,
                original_filename: upload.original_filename,
                filename: stored.filename,
                content_type,
                size: stored.size,
                storage_path: stored.relative_path.clone(),
                content_hash: stored.content_hash,
                description: upload.description,
                uploaded_by: upload.uploaded_by,
            })
            .await;
        let evidence = match inserted {
            Ok(evidence) => evidence,
            Err(err) => {
                tracing::error!(error = ?err, indicator_id = %indicator.id, "insert_evidence_failed");
                // the file has no row referencing it
                if let Err(cleanup) = self.store.remove(&stored.relative_path).await {
                    tracing::warn!(error = ?cleanup, path = %stored.relative_path, "orphan_evidence_cleanup_failed");
                }
                return Err(err.into());
            }
        };
        tracing::info!(evidence_id = %evidence.id, indicator_id = %indicator.id, size = evidence.size, "evidence_uploaded");
        Ok(evidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::evidence::fakes::{
        MemoryEvidence, MemoryIndicators, MemoryStore,
    };
    use async_trait::async_trait;

    struct RejectingEvidence;

    #[async_trait]
    impl EvidenceRepository for RejectingEvidence {
        async fn list_for_indicator(
            &self,
            _indicator_id: Uuid,
            _include_inactive: bool,
        ) -> anyhow::Result<Vec<Evidence>> {
            Ok(Vec::new())
        }
        async fn find(&self, _id: Uuid) -> anyhow::Result<Option<Evidence>> {
            Ok(None)
        }
        async fn insert(&self, _evidence: &NewEvidence) -> anyhow::Result<Evidence> {
            anyhow::bail!("connection reset")
        }
        async fn set_active(&self, _id: Uuid, _active: bool) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    fn upload(indicator_id: Uuid, name: &str, bytes: &[u8]) -> EvidenceUpload {
        EvidenceUpload {
            indicator_id,
            original_filename: name.into(),
            content_type: None,
            description: Some("Signed minutes".into()),
            bytes: bytes.to_vec(),
            uploaded_by: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn stores_file_and_records_metadata() {
        let indicators = MemoryIndicators::with_active();
        let evidence = MemoryEvidence::default();
        let store = MemoryStore::default();
        let uc = UploadEvidence {
            indicators: &indicators,
            evidence: &evidence,
            store: &store,
            max_bytes: 1024,
        };
        let saved = uc
            .execute(upload(indicators.active_id(), "acta.pdf", b"%PDF-1.4"))
            .await
            .unwrap();
        assert_eq!(saved.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(saved.size, 8);
        assert_eq!(store.files(), 1);
    }

    #[tokio::test]
    async fn rejects_disallowed_and_oversized_files() {
        let indicators = MemoryIndicators::with_active();
        let evidence = MemoryEvidence::default();
        let store = MemoryStore::default();
        let uc = UploadEvidence {
            indicators: &indicators,
            evidence: &evidence,
            store: &store,
            max_bytes: 4,
        };
        let err = uc
            .execute(upload(indicators.active_id(), "run.exe", b"MZ"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.contains("file")));

        let err = uc
            .execute(upload(indicators.active_id(), "big.pdf", b"0123456789"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref e) if e.contains("file")));
        assert_eq!(store.files(), 0);
    }

    #[tokio::test]
    async fn unknown_indicator_is_not_found() {
        let indicators = MemoryIndicators::with_active();
        let evidence = MemoryEvidence::default();
        let store = MemoryStore::default();
        let uc = UploadEvidence {
            indicators: &indicators,
            evidence: &evidence,
            store: &store,
            max_bytes: 1024,
        };
        let err = uc
            .execute(upload(Uuid::new_v4(), "acta.pdf", b"%PDF"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn failed_insert_removes_stored_file() {
        let indicators = MemoryIndicators::with_active();
        let store = MemoryStore::default();
        let uc = UploadEvidence {
            indicators: &indicators,
            evidence: &RejectingEvidence,
            store: &store,
            max_bytes: 1024,
        };
        let err = uc
            .execute(upload(indicators.active_id(), "acta.pdf", b"%PDF"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Internal(_)));
        assert_eq!(store.files(), 0);
    }
}
