//! Single-flight coordination of derived-asset computation.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::TransformConfig;
use crate::observability::metrics;
use crate::transform::store::{BeginOutcome, DerivedAssetStore};
use crate::transform::types::{AssetStatus, TransformError, TransformKey, TransformOp};
use crate::transform::upstream::{SourceCatalog, Transformer};

type TransformOutcome = Result<String, TransformError>;

/// How often a local leader re-reads the store while another process owns
/// the pending record.
const FOREIGN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Deduplicates and caches derived-asset computation.
///
/// The asset store's `begin_pending` decides leadership across processes;
/// the in-process registry of broadcast channels lets local siblings wait
/// for the leader's outcome instead of polling.
pub struct TransformCoordinator {
    store: Arc<dyn DerivedAssetStore>,
    sources: Arc<dyn SourceCatalog>,
    transformer: Arc<dyn Transformer>,
    clock: Arc<dyn Clock>,
    inflight: DashMap<TransformKey, broadcast::Sender<TransformOutcome>>,
    wait_timeout: Duration,
}

enum Claim {
    Leader(broadcast::Sender<TransformOutcome>),
    Waiter(broadcast::Receiver<TransformOutcome>),
}

impl TransformCoordinator {
    pub fn new(
        store: Arc<dyn DerivedAssetStore>,
        sources: Arc<dyn SourceCatalog>,
        transformer: Arc<dyn Transformer>,
        clock: Arc<dyn Clock>,
        config: &TransformConfig,
    ) -> Self {
        Self {
            store,
            sources,
            transformer,
            clock,
            inflight: DashMap::new(),
            wait_timeout: Duration::from_millis(config.wait_timeout_ms),
        }
    }

    /// Produce (or reuse) the derived asset for one transform request.
    ///
    /// Under N concurrent identical requests the transformer runs exactly
    /// once; every caller gets the same locator. A waiter that outlives
    /// the configured timeout reports `UpstreamFailure` without cancelling
    /// the in-flight computation.
    pub async fn request_transform(
        &self,
        photo_id: Uuid,
        op_names: &[String],
        params: Vec<(String, String)>,
    ) -> TransformOutcome {
        let ops = parse_ops(op_names)?;
        let key = TransformKey::new(photo_id, ops, params);

        loop {
            let claim = match self.inflight.entry(key.clone()) {
                dashmap::mapref::entry::Entry::Occupied(occupied) => {
                    Claim::Waiter(occupied.get().subscribe())
                }
                dashmap::mapref::entry::Entry::Vacant(vacant) => {
                    let (tx, _) = broadcast::channel(1);
                    vacant.insert(tx.clone());
                    Claim::Leader(tx)
                }
            };

            match claim {
                Claim::Leader(tx) => {
                    let outcome = self.lead(&key).await;
                    // Store finalization happened inside `lead`; retire the
                    // registry entry only afterwards so late subscribers
                    // re-read the finalized record.
                    self.inflight.remove(&key);
                    let _ = tx.send(outcome.clone());
                    return outcome;
                }
                Claim::Waiter(mut rx) => {
                    metrics::record_transform_fan_in();
                    tracing::debug!(key = %key.locator_digest(), "waiting on in-flight transform");
                    match tokio::time::timeout(self.wait_timeout, rx.recv()).await {
                        Ok(Ok(outcome)) => return outcome,
                        // Leader finished between lookup and subscribe; the
                        // store record is final, so loop and re-read it.
                        Ok(Err(_)) => continue,
                        Err(_) => {
                            tracing::warn!(
                                key = %key.locator_digest(),
                                timeout_ms = self.wait_timeout.as_millis() as u64,
                                "gave up waiting on in-flight transform"
                            );
                            return Err(TransformError::UpstreamFailure(
                                "timed out waiting for in-flight transform".into(),
                            ));
                        }
                    }
                }
            }
        }
    }

    /// Local-leader path: claim the store record, run the upstream call,
    /// and finalize.
    async fn lead(&self, key: &TransformKey) -> TransformOutcome {
        match self.store.begin_pending(key, self.clock.now_millis()).await {
            BeginOutcome::Ready(locator) => {
                metrics::record_transform("cache_hit");
                tracing::debug!(key = %key.locator_digest(), locator, "derived asset cache hit");
                Ok(locator)
            }
            BeginOutcome::InFlight => self.await_foreign(key).await,
            BeginOutcome::Created => {
                let outcome = self.compute(key).await;
                match &outcome {
                    Ok(locator) => {
                        self.store.complete(key, locator).await;
                        metrics::record_transform("ready");
                        tracing::info!(key = %key.locator_digest(), locator, "derived asset ready");
                    }
                    Err(err) => {
                        self.store.fail(key, &err.to_string()).await;
                        metrics::record_transform("failed");
                        tracing::warn!(key = %key.locator_digest(), error = %err, "transform failed");
                    }
                }
                outcome
            }
        }
    }

    async fn compute(&self, key: &TransformKey) -> TransformOutcome {
        let source = self
            .sources
            .locate(key.photo_id)
            .await
            .ok_or(TransformError::SourceNotFound(key.photo_id))?;
        self.transformer
            .apply(&source, &key.ops, &key.params)
            .await
    }

    /// The pending record belongs to another process; poll the store until
    /// it finalizes or the wait budget runs out.
    async fn await_foreign(&self, key: &TransformKey) -> TransformOutcome {
        let deadline = tokio::time::Instant::now() + self.wait_timeout;
        loop {
            match self.store.get(key).await.map(|asset| asset.status) {
                Some(AssetStatus::Ready(locator)) => return Ok(locator),
                Some(AssetStatus::Failed(reason)) => {
                    return Err(TransformError::UpstreamFailure(reason))
                }
                _ => {}
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(TransformError::UpstreamFailure(
                    "timed out waiting for in-flight transform".into(),
                ));
            }
            tokio::time::sleep(FOREIGN_POLL_INTERVAL).await;
        }
    }
}

fn parse_ops(op_names: &[String]) -> Result<Vec<TransformOp>, TransformError> {
    if op_names.is_empty() {
        return Err(TransformError::OperationUnsupported(String::new()));
    }
    op_names
        .iter()
        .map(|name| {
            TransformOp::parse(name)
                .ok_or_else(|| TransformError::OperationUnsupported(name.clone()))
        })
        .collect()
}
