//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! login(credentials)
//!     → directory lookup + argon2 verify + ban check
//!     → SessionManager issues Session + RefreshToken (fresh family)
//!     → TokenStore persists the pair
//!
//! refresh(refresh token)
//!     → single-winner consume (rotation)
//!     → reuse detection revokes the whole token family
//!
//! validate(access token)
//!     → revocation/expiry checks + live ban re-check
//! ```
//!
//! # Design Decisions
//! - Tokens are opaque UUIDs resolved through the store, not signed blobs;
//!   revocation is therefore immediate rather than expiry-bound
//! - Family membership is an explicit id on every record so the reuse
//!   cascade is one indexed revocation, not a graph walk

pub mod manager;
pub mod store;
pub mod types;

pub use manager::SessionManager;
pub use store::{InMemoryTokenStore, TokenStore};
pub use types::{AuthError, RefreshToken, Session};
