//! Session issuance, rotation, validation, and revocation.

use std::sync::Arc;

use uuid::Uuid;

use crate::auth::store::TokenStore;
use crate::auth::types::{AuthError, RefreshToken, Session};
use crate::clock::Clock;
use crate::config::AuthConfig;
use crate::directory::{verify_password, Identity, UserDirectory};
use crate::observability::metrics;

/// Issues and validates tokens against the directory and token store.
pub struct SessionManager {
    directory: Arc<dyn UserDirectory>,
    tokens: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    access_ttl_ms: u64,
    refresh_ttl_ms: u64,
}

impl SessionManager {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        tokens: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            directory,
            tokens,
            clock,
            access_ttl_ms: config.access_ttl_secs * 1_000,
            refresh_ttl_ms: config.refresh_ttl_secs * 1_000,
        }
    }

    /// Authenticate and open a fresh token family.
    ///
    /// Credentials are verified before the ban check so that `Banned` is
    /// only reported to a caller who proved ownership of the account.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(Session, RefreshToken), AuthError> {
        let identity = self
            .directory
            .find_by_username(username)
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(&identity.password_hash, password) {
            metrics::record_login("rejected");
            return Err(AuthError::InvalidCredentials);
        }

        if identity.banned {
            tracing::warn!(identity = %identity.id, "login rejected: identity banned");
            metrics::record_login("banned");
            return Err(AuthError::Banned);
        }

        let (session, refresh) = self.issue_pair(identity.id, Uuid::new_v4());
        self.tokens
            .insert_pair(session.clone(), refresh.clone())
            .await;

        tracing::info!(
            identity = %identity.id,
            session = %session.id,
            family = %session.family_id,
            "login succeeded"
        );
        metrics::record_login("ok");
        Ok((session, refresh))
    }

    /// Redeem a refresh token for a new session/refresh pair (rotation).
    ///
    /// Redeeming an already-consumed token is treated as theft evidence:
    /// the entire family is revoked before `TokenReused` is returned.
    pub async fn refresh(
        &self,
        refresh_token_id: Uuid,
    ) -> Result<(Session, RefreshToken), AuthError> {
        let token = self
            .tokens
            .refresh_token(refresh_token_id)
            .await
            .ok_or(AuthError::TokenRevoked)?;

        if token.consumed {
            return Err(self.flag_reuse(&token).await);
        }
        if token.is_expired(self.clock.now_millis()) {
            return Err(AuthError::TokenExpired);
        }

        let parent = self
            .tokens
            .session(token.session_id)
            .await
            .ok_or(AuthError::TokenRevoked)?;
        if parent.revoked {
            return Err(AuthError::TokenRevoked);
        }

        // Single winner: losing a concurrent redemption race is reuse.
        if !self.tokens.consume_refresh(refresh_token_id).await {
            return Err(self.flag_reuse(&token).await);
        }

        let (session, refresh) = self.issue_pair(parent.identity_id, token.family_id);
        self.tokens
            .insert_pair(session.clone(), refresh.clone())
            .await;

        tracing::debug!(
            identity = %parent.identity_id,
            family = %token.family_id,
            session = %session.id,
            "refresh token rotated"
        );
        Ok((session, refresh))
    }

    /// Resolve an access token to its identity. Pure read; re-checks the
    /// live ban state so a ban takes effect on the very next request.
    pub async fn validate(&self, access_token_id: Uuid) -> Result<Identity, AuthError> {
        let session = self
            .tokens
            .session(access_token_id)
            .await
            .ok_or(AuthError::TokenRevoked)?;

        let identity = self
            .directory
            .get(session.identity_id)
            .await
            .ok_or(AuthError::TokenRevoked)?;
        if identity.banned {
            return Err(AuthError::Banned);
        }

        if session.revoked {
            return Err(AuthError::TokenRevoked);
        }
        if session.is_expired(self.clock.now_millis()) {
            return Err(AuthError::TokenExpired);
        }

        Ok(identity)
    }

    /// Revoke the session behind an access token. Idempotent.
    pub async fn logout(&self, access_token_id: Uuid) {
        self.tokens.revoke_session(access_token_id).await;
        tracing::debug!(session = %access_token_id, "session revoked on logout");
    }

    async fn flag_reuse(&self, token: &RefreshToken) -> AuthError {
        tracing::warn!(
            family = %token.family_id,
            refresh_token = %token.id,
            "refresh token reuse detected, revoking family"
        );
        metrics::record_token_reuse();
        self.tokens.revoke_family(token.family_id).await;
        AuthError::TokenReused
    }

    fn issue_pair(&self, identity_id: Uuid, family_id: Uuid) -> (Session, RefreshToken) {
        let now = self.clock.now_millis();
        let session = Session {
            id: Uuid::new_v4(),
            identity_id,
            family_id,
            issued_at_ms: now,
            expires_at_ms: now + self.access_ttl_ms,
            revoked: false,
        };
        let refresh = RefreshToken {
            id: Uuid::new_v4(),
            session_id: session.id,
            family_id,
            expires_at_ms: now + self.refresh_ttl_ms,
            consumed: false,
        };
        (session, refresh)
    }
}
