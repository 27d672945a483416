//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout, file, remote)
//!     → Metrics recorder installed by the embedding process
//! ```
//!
//! # Design Decisions
//! - Metrics are cheap (atomic increments behind the `metrics` facade)
//! - The exposition endpoint belongs to the embedding HTTP layer, not here

pub mod logging;
pub mod metrics;
