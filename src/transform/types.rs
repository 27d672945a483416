//! Transform request keys, derived-asset records, and the error taxonomy.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

/// Named transformation presets applied by the external image processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformOp {
    Avatar,
    Grayscale,
    RemoveBackground,
    OilPaint,
    Sepia,
    Outline,
}

impl TransformOp {
    pub fn as_str(self) -> &'static str {
        match self {
            TransformOp::Avatar => "avatar",
            TransformOp::Grayscale => "grayscale",
            TransformOp::RemoveBackground => "remove_background",
            TransformOp::OilPaint => "oil_paint",
            TransformOp::Sepia => "sepia",
            TransformOp::Outline => "outline",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "avatar" => Some(TransformOp::Avatar),
            "grayscale" => Some(TransformOp::Grayscale),
            "remove_background" => Some(TransformOp::RemoveBackground),
            "oil_paint" => Some(TransformOp::OilPaint),
            "sepia" => Some(TransformOp::Sepia),
            "outline" => Some(TransformOp::Outline),
            _ => None,
        }
    }
}

/// Canonical identity of one transform request. Two requests with the same
/// photo, operation sequence, and parameter set address the same derived
/// asset; parameters are sorted at construction so their order never
/// changes the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformKey {
    pub photo_id: Uuid,
    pub ops: Vec<TransformOp>,
    pub params: Vec<(String, String)>,
}

impl TransformKey {
    pub fn new(photo_id: Uuid, ops: Vec<TransformOp>, mut params: Vec<(String, String)>) -> Self {
        params.sort();
        Self {
            photo_id,
            ops,
            params,
        }
    }

    fn canonical(&self) -> String {
        let ops = self
            .ops
            .iter()
            .map(|op| op.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let params = self
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(",");
        format!("{}|{}|{}", self.photo_id, ops, params)
    }

    /// Deterministic short digest used to address the derived asset.
    pub fn locator_digest(&self) -> String {
        let digest = Sha256::digest(self.canonical().as_bytes());
        hex::encode(digest)[..12].to_string()
    }
}

/// Lifecycle of one derived asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetStatus {
    /// Computation in flight; at most one per key.
    Pending,
    /// Immutable, reusable by any future request with the same key.
    Ready(String),
    /// Retryable; the next request for the key starts fresh.
    Failed(String),
}

/// Stored record for a derived asset.
#[derive(Debug, Clone)]
pub struct DerivedAsset {
    pub key: TransformKey,
    pub status: AssetStatus,
    pub created_at_ms: u64,
}

impl DerivedAsset {
    pub fn pending(key: TransformKey, now_ms: u64) -> Self {
        Self {
            key,
            status: AssetStatus::Pending,
            created_at_ms: now_ms,
        }
    }
}

/// Errors surfaced by the transform stage. Clone so one upstream failure
/// can be delivered to every waiter on the in-flight computation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("source photo {0} not found")]
    SourceNotFound(Uuid),

    #[error("unsupported transform operation `{0}`")]
    OperationUnsupported(String),

    #[error("transform upstream failure: {0}")]
    UpstreamFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_order_does_not_change_the_key() {
        let photo = Uuid::new_v4();
        let a = TransformKey::new(
            photo,
            vec![TransformOp::Sepia],
            vec![("width".into(), "500".into()), ("crop".into(), "scale".into())],
        );
        let b = TransformKey::new(
            photo,
            vec![TransformOp::Sepia],
            vec![("crop".into(), "scale".into()), ("width".into(), "500".into())],
        );
        assert_eq!(a, b);
        assert_eq!(a.locator_digest(), b.locator_digest());
    }

    #[test]
    fn operation_order_is_significant() {
        let photo = Uuid::new_v4();
        let a = TransformKey::new(photo, vec![TransformOp::Sepia, TransformOp::Outline], vec![]);
        let b = TransformKey::new(photo, vec![TransformOp::Outline, TransformOp::Sepia], vec![]);
        assert_ne!(a.locator_digest(), b.locator_digest());
    }

    #[test]
    fn digest_is_short_hex() {
        let key = TransformKey::new(Uuid::new_v4(), vec![TransformOp::Grayscale], vec![]);
        let digest = key.locator_digest();
        assert_eq!(digest.len(), 12);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, key.locator_digest());
    }

    #[test]
    fn op_names_roundtrip() {
        for op in [
            TransformOp::Avatar,
            TransformOp::Grayscale,
            TransformOp::RemoveBackground,
            TransformOp::OilPaint,
            TransformOp::Sepia,
            TransformOp::Outline,
        ] {
            assert_eq!(TransformOp::parse(op.as_str()), Some(op));
        }
        assert_eq!(TransformOp::parse("mirror"), None);
    }
}
