//! Derived-asset persistence contract and the in-memory implementation.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::transform::types::{AssetStatus, DerivedAsset, TransformKey};

/// Result of the atomic create-if-absent on a pending record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginOutcome {
    /// This caller owns the computation.
    Created,
    /// Another caller's computation is in flight.
    InFlight,
    /// A finished asset already exists.
    Ready(String),
}

/// Storage for derived-asset records keyed by transform request.
///
/// `begin_pending` is the mutual-exclusion point for single-flight: under
/// concurrent calls for one key, exactly one caller observes `Created`.
/// A `Failed` record is replaced by the new pending record, so failures
/// never block a retry.
#[async_trait]
pub trait DerivedAssetStore: Send + Sync {
    async fn begin_pending(&self, key: &TransformKey, now_ms: u64) -> BeginOutcome;

    async fn get(&self, key: &TransformKey) -> Option<DerivedAsset>;

    async fn complete(&self, key: &TransformKey, locator: &str);

    async fn fail(&self, key: &TransformKey, reason: &str);
}

/// Concurrent in-memory asset store.
#[derive(Default)]
pub struct InMemoryAssetStore {
    assets: DashMap<TransformKey, DerivedAsset>,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[async_trait]
impl DerivedAssetStore for InMemoryAssetStore {
    async fn begin_pending(&self, key: &TransformKey, now_ms: u64) -> BeginOutcome {
        use dashmap::mapref::entry::Entry;
        // The entry guard makes the whole decision atomic per key.
        match self.assets.entry(key.clone()) {
            Entry::Occupied(mut occupied) => match &occupied.get().status {
                AssetStatus::Ready(locator) => BeginOutcome::Ready(locator.clone()),
                AssetStatus::Pending => BeginOutcome::InFlight,
                AssetStatus::Failed(_) => {
                    occupied.insert(DerivedAsset::pending(key.clone(), now_ms));
                    BeginOutcome::Created
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(DerivedAsset::pending(key.clone(), now_ms));
                BeginOutcome::Created
            }
        }
    }

    async fn get(&self, key: &TransformKey) -> Option<DerivedAsset> {
        self.assets.get(key).map(|r| r.value().clone())
    }

    async fn complete(&self, key: &TransformKey, locator: &str) {
        if let Some(mut asset) = self.assets.get_mut(key) {
            asset.status = AssetStatus::Ready(locator.to_string());
        }
    }

    async fn fail(&self, key: &TransformKey, reason: &str) {
        if let Some(mut asset) = self.assets.get_mut(key) {
            asset.status = AssetStatus::Failed(reason.to_string());
        }
    }
}
