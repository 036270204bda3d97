use std::fmt::Write;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::application::ports::evidence_store::{EvidenceStore, StoredFile};

pub struct FsEvidenceStore {
    pub uploads_root: PathBuf,
}

impl FsEvidenceStore {
    pub fn new(uploads_root: impl Into<PathBuf>) -> Self {
        Self {
            uploads_root: uploads_root.into(),
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut hex = String::with_capacity(64);
    for byte in digest {
        let _ = write!(&mut hex, "{:02x}", byte);
    }
    hex
}

#[async_trait::async_trait]
impl EvidenceStore for FsEvidenceStore {
    async fn store(
        &self,
        indicator_id: Uuid,
        original_filename: &str,
        bytes: &[u8],
    ) -> anyhow::Result<StoredFile> {
        let dir = self
            .uploads_root
            .join("evidence")
            .join(indicator_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let filename = format!(
            "{}-{}",
            Uuid::new_v4(),
            super::sanitize_filename(original_filename)
        );
        let full = dir.join(&filename);
        tokio::fs::write(&full, bytes).await?;

        Ok(StoredFile {
            relative_path: super::relative_from_uploads(&self.uploads_root, &full),
            filename,
            size: bytes.len() as i64,
            content_hash: sha256_hex(bytes),
        })
    }

    async fn read(&self, relative_path: &str) -> anyhow::Result<Vec<u8>> {
        let full = super::resolve_under(&self.uploads_root, relative_path)?;
        let data = tokio::fs::read(&full).await?;
        Ok(data)
    }

    async fn remove(&self, relative_path: &str) -> anyhow::Result<()> {
        let full = super::resolve_under(&self.uploads_root, relative_path)?;
        tokio::fs::remove_file(&full).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_under_indicator_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsEvidenceStore::new(tmp.path());
        let indicator = Uuid::new_v4();
        let stored = store
            .store(indicator, "Informe final.pdf", b"hello")
            .await
            .unwrap();

        assert!(stored.filename.ends_with("-Informe_final.pdf"));
        assert_eq!(
            stored.relative_path,
            format!("evidence/{}/{}", indicator, stored.filename)
        );
        assert_eq!(stored.size, 5);
        assert_eq!(
            stored.content_hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(store.read(&stored.relative_path).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn read_refuses_paths_outside_root() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsEvidenceStore::new(tmp.path().join("uploads"));
        tokio::fs::write(tmp.path().join("secret.txt"), b"x")
            .await
            .unwrap();
        assert!(store.read("../secret.txt").await.is_err());
    }

    #[tokio::test]
    async fn remove_deletes_stored_file() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsEvidenceStore::new(tmp.path());
        let stored = store
            .store(Uuid::new_v4(), "acta.pdf", b"%PDF")
            .await
            .unwrap();
        store.remove(&stored.relative_path).await.unwrap();
        assert!(store.read(&stored.relative_path).await.is_err());
        assert!(store.remove("../outside.pdf").await.is_err());
    }
}
