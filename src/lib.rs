//! Admission-controlled media transformation gateway.
//!
//! # Architecture Overview
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                  GATEWAY                      │
//!                       │                                               │
//!   Inbound Request     │  ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//!   ────────────────────┼─▶│ sessions │──▶│  policy  │──▶│admission │  │
//!                       │  │ validate │   │authorize │   │  admit   │  │
//!                       │  └──────────┘   └──────────┘   └────┬─────┘  │
//!                       │                                     │        │
//!                       │                                     ▼        │
//!                       │                            ┌──────────────┐  │
//!   Derived Asset       │                            │  transform   │  │
//!   ◀───────────────────┼────────────────────────────│ coordinator  │◀─┼── Transformer
//!                       │                            └──────────────┘  │    (external)
//!                       │                                               │
//!                       │  ┌─────────────────────────────────────────┐ │
//!                       │  │          Cross-Cutting Concerns          │ │
//!                       │  │  ┌────────┐ ┌───────┐ ┌───────────────┐ │ │
//!                       │  │  │ config │ │ clock │ │ observability │ │ │
//!                       │  │  └────────┘ └───────┘ └───────────────┘ │ │
//!                       │  └─────────────────────────────────────────┘ │
//!                       └──────────────────────────────────────────────┘
//! ```
//!
//! Every request passes validate → authorize → admit in that order and
//! short-circuits on the first failing stage. Persistent engines (user
//! directory, token store, derived-asset store) and the image processor
//! sit behind trait contracts; in-memory implementations ship for tests
//! and single-process deployments.

// Core subsystems
pub mod admission;
pub mod auth;
pub mod directory;
pub mod gateway;
pub mod policy;
pub mod transform;

// Cross-cutting concerns
pub mod clock;
pub mod config;
pub mod observability;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GatewayConfig;
pub use gateway::{AuthorizedContext, Gateway, GatewayError, GatewayRequest};
