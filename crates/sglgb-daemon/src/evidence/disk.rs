//! Local-disk evidence gateway

use async_trait::async_trait;
use bytes::Bytes;
use sglgb_engine::{EvidenceGateway, EvidenceMetadata, GatewayError, GatewayResult};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Stores MOV files under a root directory, one file per blob
#[derive(Debug, Clone)]
pub struct LocalDiskGateway {
    root: PathBuf,
}

impl LocalDiskGateway {
    /// Create the gateway, creating the root directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a storage path under the root, refusing anything that could
    /// escape it
    fn resolve(&self, storage_path: &str) -> GatewayResult<PathBuf> {
        let relative = Path::new(storage_path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || storage_path.is_empty() {
            return Err(GatewayError::Rejected(format!(
                "invalid storage path: {}",
                storage_path
            )));
        }
        Ok(self.root.join(relative))
    }
}

fn unavailable(err: std::io::Error) -> GatewayError {
    GatewayError::Unavailable(err.to_string())
}

#[async_trait]
impl EvidenceGateway for LocalDiskGateway {
    async fn store(&self, bytes: Bytes, metadata: &EvidenceMetadata) -> GatewayResult<String> {
        if bytes.is_empty() {
            return Err(GatewayError::Rejected(format!("{} is empty", metadata.filename)));
        }
        let storage_path = metadata.storage_path(&bytes);
        let target = self.resolve(&storage_path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(unavailable)?;
        }

        // Write then rename so a crash never leaves a partial blob at the final path
        let partial = target.with_extension("partial");
        tokio::fs::write(&partial, &bytes).await.map_err(unavailable)?;
        tokio::fs::rename(&partial, &target).await.map_err(unavailable)?;

        tracing::debug!(storage_path = %storage_path, size = bytes.len(), "Stored evidence on disk");
        Ok(storage_path)
    }

    async fn fetch(&self, storage_path: &str) -> GatewayResult<Bytes> {
        let target = self.resolve(storage_path)?;
        match tokio::fs::read(&target).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(GatewayError::NotFound(storage_path.to_string()))
            }
            Err(err) => Err(unavailable(err)),
        }
    }

    async fn delete(&self, storage_path: &str) -> GatewayResult<()> {
        let target = self.resolve(storage_path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(unavailable(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sglgb_types::{AssessmentId, MovFileId, ResponseId, UserId};

    fn metadata(filename: &str) -> EvidenceMetadata {
        EvidenceMetadata {
            assessment_id: AssessmentId::new("a-1"),
            response_id: ResponseId::new("r-1"),
            file_id: MovFileId::new("f-1"),
            filename: filename.to_string(),
            content_type: "application/pdf".into(),
            size: 3,
            uploaded_by: UserId::new("u"),
        }
    }

    #[tokio::test]
    async fn test_store_fetch_delete() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = LocalDiskGateway::open(dir.path().join("evidence")).await.unwrap();

        let path = gateway
            .store(Bytes::from_static(b"pdf"), &metadata("budget.pdf"))
            .await
            .unwrap();
        assert!(gateway.root().join(&path).exists());
        assert_eq!(gateway.fetch(&path).await.unwrap(), Bytes::from_static(b"pdf"));

        gateway.delete(&path).await.unwrap();
        assert!(matches!(gateway.fetch(&path).await, Err(GatewayError::NotFound(_))));
        // Idempotent
        gateway.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = LocalDiskGateway::open(dir.path()).await.unwrap();
        assert!(matches!(
            gateway.fetch("../outside").await,
            Err(GatewayError::Rejected(_))
        ));
        assert!(matches!(
            gateway.delete("/etc/passwd").await,
            Err(GatewayError::Rejected(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_payload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = LocalDiskGateway::open(dir.path()).await.unwrap();
        assert!(matches!(
            gateway.store(Bytes::new(), &metadata("a.pdf")).await,
            Err(GatewayError::Rejected(_))
        ));
    }
}
