//! Session and refresh-token records, plus the auth error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A live authenticated login instance. The session id doubles as the
/// opaque access token presented by clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub identity_id: Uuid,
    /// Groups every session descended from one login.
    pub family_id: Uuid,
    pub issued_at_ms: u64,
    pub expires_at_ms: u64,
    pub revoked: bool,
}

impl Session {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms <= now_ms
    }
}

/// Single-use token redeemed for a fresh session/refresh pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshToken {
    pub id: Uuid,
    pub session_id: Uuid,
    pub family_id: Uuid,
    pub expires_at_ms: u64,
    /// Set exactly once, by the winning redemption.
    pub consumed: bool,
}

impl RefreshToken {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms <= now_ms
    }
}

/// Errors surfaced by the authentication stage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown account or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token lifetime elapsed.
    #[error("token expired")]
    TokenExpired,

    /// Session revoked by logout, ban, or reuse cascade.
    #[error("token revoked")]
    TokenRevoked,

    /// An already-consumed refresh token was redeemed again. The whole
    /// family is revoked before this error is returned.
    #[error("refresh token reuse detected")]
    TokenReused,

    /// The owning identity is banned.
    #[error("identity is banned")]
    Banned,
}
