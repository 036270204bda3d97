use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::application::ports::evidence_repository::EvidenceRepository;
use crate::application::ports::evidence_store::{EvidenceStore, StoredFile};
use crate::application::ports::record_repository::RecordRepository;
use crate::domain::evidence::{Evidence, NewEvidence};
use crate::domain::paging::{ListFilter, Page, SelectOption};
use crate::domain::planning::{Indicator, IndicatorInput};
use crate::domain::validation::FieldErrors;

pub(crate) struct MemoryIndicators {
    rows: Vec<Indicator>,
}

impl MemoryIndicators {
    pub(crate) fn with_active() -> Self {
        let now = Utc::now();
        Self {
            rows: vec![Indicator {
                id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                product_name: "Aulas dotadas".into(),
                code: "IND-01".into(),
                name: "Aulas con conectividad".into(),
                unit: "aulas".into(),
                baseline: 0.0,
                target: 40.0,
                current_value: 10.0,
                is_active: true,
                created_at: now,
                updated_at: now,
            }],
        }
    }

    pub(crate) fn active_id(&self) -> Uuid {
        self.rows[0].id
    }
}

#[async_trait]
impl RecordRepository for MemoryIndicators {
    type Record = Indicator;
    type Input = IndicatorInput;

    async fn list(&self, filter: &ListFilter) -> anyhow::Result<Page<Indicator>> {
        let total = self.rows.len() as i64;
        Ok(Page::new(self.rows.clone(), filter.page, total))
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Indicator>> {
        Ok(self.rows.iter().find(|i| i.id == id).cloned())
    }

    async fn insert(&self, _input: &IndicatorInput) -> anyhow::Result<Indicator> {
        anyhow::bail!("read-only fake")
    }

    async fn update(
        &self,
        _id: Uuid,
        _input: &IndicatorInput,
    ) -> anyhow::Result<Option<Indicator>> {
        anyhow::bail!("read-only fake")
    }

    async fn set_active(&self, _id: Uuid, _active: bool) -> anyhow::Result<bool> {
        anyhow::bail!("read-only fake")
    }

    async fn conflicts(
        &self,
        _input: &IndicatorInput,
        _except: Option<Uuid>,
    ) -> anyhow::Result<FieldErrors> {
        Ok(FieldErrors::new())
    }

    async fn active_dependents(&self, _id: Uuid) -> anyhow::Result<i64> {
        Ok(0)
    }

    async fn options(&self, _parent_id: Option<Uuid>) -> anyhow::Result<Vec<SelectOption>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub(crate) struct MemoryEvidence {
    rows: Mutex<Vec<Evidence>>,
}

impl MemoryEvidence {
    pub(crate) async fn seed(
        &self,
        store: &MemoryStore,
        name: &str,
        bytes: &[u8],
        active: bool,
    ) -> Evidence {
        let indicator_id = Uuid::new_v4();
        let stored = store.store(indicator_id, name, bytes).await.unwrap();
        let saved = self
            .insert(&NewEvidence {
                indicator_id,
                original_filename: name.into(),
                filename: stored.filename,
                content_type: None,
                size: stored.size,
                storage_path: stored.relative_path,
                content_hash: stored.content_hash,
                description: None,
                uploaded_by: Uuid::new_v4(),
            })
            .await
            .unwrap();
        self.set_active(saved.id, active).await.unwrap();
        self.find(saved.id).await.unwrap().unwrap()
    }
}

#[async_trait]
impl EvidenceRepository for MemoryEvidence {
    async fn list_for_indicator(
        &self,
        indicator_id: Uuid,
        include_inactive: bool,
    ) -> anyhow::Result<Vec<Evidence>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.indicator_id == indicator_id && (include_inactive || e.is_active))
            .cloned()
            .collect())
    }

    async fn find(&self, id: Uuid) -> anyhow::Result<Option<Evidence>> {
        Ok(self.rows.lock().unwrap().iter().find(|e| e.id == id).cloned())
    }

    async fn insert(&self, evidence: &NewEvidence) -> anyhow::Result<Evidence> {
        let row = Evidence {
            id: Uuid::new_v4(),
            indicator_id: evidence.indicator_id,
            original_filename: evidence.original_filename.clone(),
            filename: evidence.filename.clone(),
            content_type: evidence.content_type.clone(),
            size: evidence.size,
            storage_path: evidence.storage_path.clone(),
            content_hash: evidence.content_hash.clone(),
            description: evidence.description.clone(),
            uploaded_by: Some(evidence.uploaded_by),
            uploaded_by_name: None,
            is_active: true,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        Ok(rows
            .iter_mut()
            .find(|e| e.id == id)
            .map(|e| e.is_active = active)
            .is_some())
    }
}

#[derive(Default)]
pub(crate) struct MemoryStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub(crate) fn files(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl EvidenceStore for MemoryStore {
    async fn store(
        &self,
        indicator_id: Uuid,
        original_filename: &str,
        bytes: &[u8],
    ) -> anyhow::Result<StoredFile> {
        let filename = format!("{}-{}", Uuid::new_v4(), original_filename);
        let relative_path = format!("evidence/{}/{}", indicator_id, filename);
        self.files
            .lock()
            .unwrap()
            .insert(relative_path.clone(), bytes.to_vec());
        Ok(StoredFile {
            filename,
            relative_path,
            size: bytes.len() as i64,
            content_hash: format!("len{}", bytes.len()),
        })
    }

    async fn read(&self, relative_path: &str) -> anyhow::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(relative_path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("missing file"))
    }

    async fn remove(&self, relative_path: &str) -> anyhow::Result<()> {
        self.files
            .lock()
            .unwrap()
            .remove(relative_path)
            .map(|_| ())
            .ok_or_else(|| anyhow::anyhow!("missing file"))
    }
}
