//! Evidence storage backends and upload policy

mod disk;
mod policy;

pub use disk::LocalDiskGateway;
pub use policy::{UploadPolicy, UploadRule};

use crate::config::EvidenceBackend;
use sglgb_engine::{EvidenceGateway, InMemoryEvidenceGateway};
use std::sync::Arc;

/// Build the gateway for the configured backend
pub async fn open_gateway(backend: &EvidenceBackend) -> std::io::Result<Arc<dyn EvidenceGateway>> {
    Ok(match backend {
        EvidenceBackend::Memory => Arc::new(InMemoryEvidenceGateway::new()),
        EvidenceBackend::Disk { root } => Arc::new(LocalDiskGateway::open(root.clone()).await?),
    })
}
