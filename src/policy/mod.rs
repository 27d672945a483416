//! Access policy: capability lattice and admin mutations.
//!
//! # Responsibilities
//! - Resolve role grants against an ordered lattice (`user < moderator < admin`)
//! - Enforce the ban override: banned identities keep read-only profile
//!   access and the ban appeal, nothing else
//! - Admin-only role/ban mutations with session invalidation on new bans
//!
//! # Design Decisions
//! - Deny by default: failure is always a typed `Forbidden`/`NotFound`,
//!   never an implicit fallback grant
//! - Capability resolution is one comparison per request, not scattered
//!   per-route role lists

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::auth::store::TokenStore;
use crate::directory::{Identity, Role, UserDirectory};
use crate::observability::metrics;

/// Protected operations recognized by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Signup,
    ViewProfile,
    AppealBan,
    ViewPhoto,
    UploadPhoto,
    CommentWrite,
    DeleteOwnResource,
    RequestTransform,
    ModerateComments,
    SetRole,
    SetBan,
    DeleteAnyResource,
}

impl Action {
    /// Minimum role in the lattice that grants the action.
    pub fn required_role(self) -> Role {
        match self {
            Action::ModerateComments => Role::Moderator,
            Action::SetRole | Action::SetBan | Action::DeleteAnyResource => Role::Admin,
            _ => Role::User,
        }
    }

    /// Actions that remain available to banned identities.
    pub fn allowed_while_banned(self) -> bool {
        matches!(self, Action::ViewProfile | Action::AppealBan)
    }

    /// Actions reachable without an access token (rate limited by IP).
    pub fn anonymous(self) -> bool {
        matches!(self, Action::Signup)
    }
}

/// Errors surfaced by the authorization stage.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("operation forbidden")]
    Forbidden,

    #[error("record not found")]
    NotFound,
}

/// Resolves effective permissions and applies admin mutations.
pub struct AccessPolicy {
    directory: Arc<dyn UserDirectory>,
    tokens: Arc<dyn TokenStore>,
}

impl AccessPolicy {
    pub fn new(directory: Arc<dyn UserDirectory>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { directory, tokens }
    }

    /// Check whether `identity` may perform `action`.
    pub fn authorize(&self, identity: &Identity, action: Action) -> Result<(), AuthzError> {
        if identity.banned && !action.allowed_while_banned() {
            return Err(AuthzError::Forbidden);
        }
        if identity.role >= action.required_role() {
            Ok(())
        } else {
            Err(AuthzError::Forbidden)
        }
    }

    /// Change a target identity's role. Admin-only, idempotent.
    pub async fn set_role(
        &self,
        acting: &Identity,
        target_id: Uuid,
        new_role: Role,
    ) -> Result<(), AuthzError> {
        self.authorize(acting, Action::SetRole)?;

        let mut target = self
            .directory
            .get(target_id)
            .await
            .ok_or(AuthzError::NotFound)?;
        if target.role == new_role {
            return Ok(());
        }

        target.role = new_role;
        if !self.directory.persist(&target).await {
            return Err(AuthzError::NotFound);
        }
        tracing::info!(
            acting = %acting.id,
            target = %target_id,
            role = ?new_role,
            "role changed"
        );
        Ok(())
    }

    /// Ban or unban a target identity. Admin-only, idempotent. Newly
    /// imposing a ban revokes the target's live sessions before returning,
    /// so any validate call issued after this completes observes the ban.
    pub async fn set_ban(
        &self,
        acting: &Identity,
        target_id: Uuid,
        banned: bool,
        reason: Option<&str>,
    ) -> Result<(), AuthzError> {
        self.authorize(acting, Action::SetBan)?;

        let mut target = self
            .directory
            .get(target_id)
            .await
            .ok_or(AuthzError::NotFound)?;
        if target.banned == banned {
            return Ok(());
        }

        target.banned = banned;
        target.ban_reason = if banned { reason.map(str::to_string) } else { None };
        if !self.directory.persist(&target).await {
            return Err(AuthzError::NotFound);
        }

        if banned {
            self.tokens.revoke_identity(target_id).await;
        }

        tracing::warn!(
            acting = %acting.id,
            target = %target_id,
            banned,
            reason = reason.unwrap_or(""),
            "ban state changed"
        );
        metrics::record_ban_event(banned);
        Ok(())
    }
}
