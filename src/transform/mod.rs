//! Derived-asset transformation subsystem.
//!
//! # Data Flow
//! ```text
//! request_transform(photo id, ops, params)
//!     → canonical TransformKey
//!     → ready record?        → return cached locator
//!     → in-flight sibling?   → wait on its broadcast (bounded)
//!     → otherwise            → win the pending record, call the
//!                              Transformer once, finalize, wake waiters
//! ```
//!
//! # Design Decisions
//! - The derived-asset store's create-if-absent is the cross-process
//!   mutual-exclusion point; the in-process registry only carries wakeups
//! - Failed records never block a retry; the next request replaces them
//! - Waiter timeouts abandon the wait, not the computation

pub mod coordinator;
pub mod link;
pub mod store;
pub mod types;
pub mod upstream;

pub use coordinator::TransformCoordinator;
pub use store::{BeginOutcome, DerivedAssetStore, InMemoryAssetStore};
pub use types::{AssetStatus, DerivedAsset, TransformError, TransformKey, TransformOp};
pub use upstream::{InMemoryPhotoCatalog, SourceCatalog, Transformer};
