use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub relative_path: String,
    pub size: i64,
    pub content_hash: String,
}

/// Byte storage for evidence files; paths are relative to the uploads root.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    async fn store(
        &self,
        indicator_id: Uuid,
        original_filename: &str,
        bytes: &[u8],
    ) -> anyhow::Result<StoredFile>;
    async fn read(&self, relative_path: &str) -> anyhow::Result<Vec<u8>>;
    async fn remove(&self, relative_path: &str) -> anyhow::Result<()>;
}
