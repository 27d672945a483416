//! Token persistence contract and the in-memory implementation.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::auth::types::{RefreshToken, Session};

/// Storage for session and refresh-token records.
///
/// `consume_refresh` and the revocation operations must be atomic per
/// record: concurrent redemptions of the same refresh token see exactly one
/// winner.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert_pair(&self, session: Session, refresh: RefreshToken);

    async fn session(&self, id: Uuid) -> Option<Session>;

    async fn refresh_token(&self, id: Uuid) -> Option<RefreshToken>;

    /// Mark a refresh token consumed. Returns `true` only for the single
    /// caller that performed the transition.
    async fn consume_refresh(&self, id: Uuid) -> bool;

    /// Idempotent; unknown ids are a no-op.
    async fn revoke_session(&self, id: Uuid);

    /// Revoke every session in a token family (reuse cascade).
    async fn revoke_family(&self, family_id: Uuid);

    /// Revoke every live session owned by an identity (ban propagation).
    async fn revoke_identity(&self, identity_id: Uuid);
}

/// Concurrent in-memory token store. Family and identity indexes are
/// maintained on insert so cascade revocations are direct lookups.
#[derive(Default)]
pub struct InMemoryTokenStore {
    sessions: DashMap<Uuid, Session>,
    refresh_tokens: DashMap<Uuid, RefreshToken>,
    family_index: DashMap<Uuid, Vec<Uuid>>,
    identity_index: DashMap<Uuid, Vec<Uuid>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn insert_pair(&self, session: Session, refresh: RefreshToken) {
        self.family_index
            .entry(session.family_id)
            .or_default()
            .push(session.id);
        self.identity_index
            .entry(session.identity_id)
            .or_default()
            .push(session.id);
        self.refresh_tokens.insert(refresh.id, refresh);
        self.sessions.insert(session.id, session);
    }

    async fn session(&self, id: Uuid) -> Option<Session> {
        self.sessions.get(&id).map(|r| r.value().clone())
    }

    async fn refresh_token(&self, id: Uuid) -> Option<RefreshToken> {
        self.refresh_tokens.get(&id).map(|r| r.value().clone())
    }

    async fn consume_refresh(&self, id: Uuid) -> bool {
        // get_mut holds the entry lock, making check-and-set atomic.
        match self.refresh_tokens.get_mut(&id) {
            Some(mut token) if !token.consumed => {
                token.consumed = true;
                true
            }
            _ => false,
        }
    }

    async fn revoke_session(&self, id: Uuid) {
        if let Some(mut session) = self.sessions.get_mut(&id) {
            session.revoked = true;
        }
    }

    async fn revoke_family(&self, family_id: Uuid) {
        let ids = self
            .family_index
            .get(&family_id)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        for id in ids {
            if let Some(mut session) = self.sessions.get_mut(&id) {
                session.revoked = true;
            }
        }
    }

    async fn revoke_identity(&self, identity_id: Uuid) {
        let ids = self
            .identity_index
            .get(&identity_id)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        for id in ids {
            if let Some(mut session) = self.sessions.get_mut(&id) {
                session.revoked = true;
            }
        }
    }
}
