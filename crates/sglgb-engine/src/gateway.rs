//! Evidence gateway boundary
//!
//! The engine never inspects evidence bytes. It hands them to a gateway,
//! keeps the returned storage path on the response, and asks the gateway to
//! delete the blob when the BLGU removes the file. Gateway failures are never
//! retried here.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use sglgb_types::{AssessmentId, LifecycleError, MovFileId, ResponseId, UserId};
use std::sync::atomic::{AtomicBool, Ordering};

/// Gateway failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The payload was refused (empty, unacceptable type, too large)
    #[error("rejected: {0}")]
    Rejected(String),

    /// The storage backend failed
    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("blob not found: {0}")]
    NotFound(String),
}

impl From<GatewayError> for LifecycleError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected(msg) => LifecycleError::InvalidEvidence(msg),
            GatewayError::Unavailable(msg) => LifecycleError::EvidenceStorage(msg),
            GatewayError::NotFound(path) => {
                LifecycleError::EvidenceStorage(format!("blob missing at {}", path))
            }
        }
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// An uploaded file as received from the caller
#[derive(Clone, Debug)]
pub struct EvidenceUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl EvidenceUpload {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }
}

/// Context passed alongside the bytes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvidenceMetadata {
    pub assessment_id: AssessmentId,
    pub response_id: ResponseId,
    /// Id the stored file will carry on the response
    pub file_id: MovFileId,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_by: UserId,
}

impl EvidenceMetadata {
    /// Storage path, unique per file even when the same bytes are uploaded
    /// twice under one name:
    /// `{assessment}/{response}/{file id}/{blake3 prefix}-{filename}`
    pub fn storage_path(&self, bytes: &[u8]) -> String {
        let hash = blake3::hash(bytes).to_hex();
        let filename: String = self
            .filename
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '_',
                c if c.is_control() => '_',
                c => c,
            })
            .collect();
        format!(
            "{}/{}/{}/{}-{}",
            self.assessment_id,
            self.response_id,
            self.file_id,
            &hash.as_str()[..16],
            filename
        )
    }
}

/// Blob store for MOV files
#[async_trait]
pub trait EvidenceGateway: Send + Sync {
    /// Store bytes, returning the storage path
    async fn store(&self, bytes: Bytes, metadata: &EvidenceMetadata) -> GatewayResult<String>;

    /// Fetch stored bytes
    async fn fetch(&self, storage_path: &str) -> GatewayResult<Bytes>;

    /// Delete stored bytes. Deleting a missing path succeeds.
    async fn delete(&self, storage_path: &str) -> GatewayResult<()>;
}

/// In-memory gateway for development and testing
#[derive(Debug, Default)]
pub struct InMemoryEvidenceGateway {
    blobs: DashMap<String, Bytes>,
    unavailable: AtomicBool,
}

impl InMemoryEvidenceGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a backend outage
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn contains(&self, storage_path: &str) -> bool {
        self.blobs.contains_key(storage_path)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    fn check_available(&self) -> GatewayResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("in-memory gateway offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl EvidenceGateway for InMemoryEvidenceGateway {
    async fn store(&self, bytes: Bytes, metadata: &EvidenceMetadata) -> GatewayResult<String> {
        self.check_available()?;
        if bytes.is_empty() {
            return Err(GatewayError::Rejected(format!("{} is empty", metadata.filename)));
        }
        let path = metadata.storage_path(&bytes);
        self.blobs.insert(path.clone(), bytes);
        Ok(path)
    }

    async fn fetch(&self, storage_path: &str) -> GatewayResult<Bytes> {
        self.check_available()?;
        self.blobs
            .get(storage_path)
            .map(|b| b.value().clone())
            .ok_or_else(|| GatewayError::NotFound(storage_path.to_string()))
    }

    async fn delete(&self, storage_path: &str) -> GatewayResult<()> {
        self.check_available()?;
        self.blobs.remove(storage_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_storage_path_is_content_addressed_and_sanitized() {
        let meta = metadata("../etc/passwd");
        let path = meta.storage_path(b"abc");
        assert!(path.starts_with("a-1/r-1/f-1/"));
        assert!(path.ends_with("-.._etc_passwd"));
        assert_eq!(path, meta.storage_path(b"abc"));
        assert_ne!(path, meta.storage_path(b"abd"));
    }

    #[test]
    fn test_storage_path_unique_per_file() {
        let first = metadata("a.pdf");
        let second = EvidenceMetadata {
            file_id: MovFileId::new("f-2"),
            ..first.clone()
        };
        assert_ne!(first.storage_path(b"same"), second.storage_path(b"same"));
    }

    #[tokio::test]
    async fn test_duplicate_upload_survives_delete_of_other() {
        let gateway = InMemoryEvidenceGateway::new();
        let first = metadata("a.pdf");
        let second = EvidenceMetadata {
            file_id: MovFileId::new("f-2"),
            ..first.clone()
        };
        let kept = gateway.store(Bytes::from_static(b"same"), &first).await.unwrap();
        let removed = gateway.store(Bytes::from_static(b"same"), &second).await.unwrap();

        gateway.delete(&removed).await.unwrap();
        assert_eq!(gateway.fetch(&kept).await.unwrap(), Bytes::from_static(b"same"));
    }

    #[tokio::test]
    async fn test_store_fetch_delete() {
        let gateway = InMemoryEvidenceGateway::new();
        let path = gateway
            .store(Bytes::from_static(b"pdf"), &metadata("a.pdf"))
            .await
            .unwrap();
        assert_eq!(gateway.fetch(&path).await.unwrap(), Bytes::from_static(b"pdf"));

        gateway.delete(&path).await.unwrap();
        assert!(gateway.is_empty());
        gateway.delete(&path).await.unwrap();
        assert!(matches!(gateway.fetch(&path).await, Err(GatewayError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_payload_rejected() {
        let gateway = InMemoryEvidenceGateway::new();
        let err = gateway.store(Bytes::new(), &metadata("a.pdf")).await.unwrap_err();
        assert!(matches!(
            LifecycleError::from(err),
            LifecycleError::InvalidEvidence(_)
        ));
    }

    #[tokio::test]
    async fn test_outage_maps_to_storage_error() {
        let gateway = InMemoryEvidenceGateway::new();
        gateway.set_unavailable(true);
        let err = gateway
            .store(Bytes::from_static(b"x"), &metadata("a.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(
            LifecycleError::from(err),
            LifecycleError::EvidenceStorage(_)
        ));
    }
}
