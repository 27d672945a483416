//! External collaborators: source photo catalog and the image processor.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::transform::types::{TransformError, TransformOp};

/// Resolves a photo id to the storage locator of its original upload.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    async fn locate(&self, photo_id: Uuid) -> Option<String>;
}

/// The external image processor. Treated as a slow, possibly-failing
/// remote call; the coordinator guarantees it runs at most once per
/// distinct transform key.
#[async_trait]
pub trait Transformer: Send + Sync {
    async fn apply(
        &self,
        source_locator: &str,
        ops: &[TransformOp],
        params: &[(String, String)],
    ) -> Result<String, TransformError>;
}

/// In-memory photo catalog for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryPhotoCatalog {
    photos: DashMap<Uuid, String>,
}

impl InMemoryPhotoCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, photo_id: Uuid, locator: &str) {
        self.photos.insert(photo_id, locator.to_string());
    }
}

#[async_trait]
impl SourceCatalog for InMemoryPhotoCatalog {
    async fn locate(&self, photo_id: Uuid) -> Option<String> {
        self.photos.get(&photo_id).map(|r| r.value().clone())
    }
}
