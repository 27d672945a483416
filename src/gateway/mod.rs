//! Gateway façade: the fixed admission pipeline.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → validate access token   (SessionManager)
//!     → authorize action        (AccessPolicy)
//!     → admit by rate limit     (RateLimiter)
//!     → route logic             (TransformCoordinator for transforms)
//! ```
//!
//! # Design Decisions
//! - Stages short-circuit on the first failure with that stage's typed
//!   error; a rejected request never touches a later stage's state
//! - Anonymous routes skip validate/authorize and are admitted by IP
//! - HTTP wiring lives in the embedding server; this façade is transport
//!   agnostic

use std::net::IpAddr;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::admission::{AdmissionError, RateLimiter};
use crate::auth::{AuthError, SessionManager};
use crate::directory::Identity;
use crate::policy::{AccessPolicy, Action, AuthzError};
use crate::transform::{TransformCoordinator, TransformError};

/// Union of the pipeline stages' typed failures, surfaced unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// One inbound request as seen by the pipeline.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    /// Opaque access token, absent on anonymous routes.
    pub access_token: Option<Uuid>,
    pub client_ip: IpAddr,
    /// Route identifier used for policy lookup and logging.
    pub route: String,
    pub action: Action,
}

/// What route logic receives once the pipeline admits a request.
#[derive(Debug, Clone)]
pub struct AuthorizedContext {
    /// Resolved caller; `None` on anonymous routes.
    pub identity: Option<Identity>,
    pub route: String,
}

/// Composes the pipeline stages. Every inbound request goes through
/// `handle` (or a wrapper like `handle_transform`) before any route logic
/// runs.
pub struct Gateway {
    sessions: Arc<SessionManager>,
    policy: Arc<AccessPolicy>,
    limiter: Arc<RateLimiter>,
    transforms: Arc<TransformCoordinator>,
}

impl Gateway {
    pub fn new(
        sessions: Arc<SessionManager>,
        policy: Arc<AccessPolicy>,
        limiter: Arc<RateLimiter>,
        transforms: Arc<TransformCoordinator>,
    ) -> Self {
        Self {
            sessions,
            policy,
            limiter,
            transforms,
        }
    }

    /// Run the fixed pipeline: validate, authorize, admit.
    pub async fn handle(&self, request: &GatewayRequest) -> Result<AuthorizedContext, GatewayError> {
        let identity = match request.access_token {
            Some(token) => {
                let identity = self.sessions.validate(token).await?;
                self.policy.authorize(&identity, request.action)?;
                Some(identity)
            }
            None => {
                if !request.action.anonymous() {
                    return Err(AuthError::InvalidCredentials.into());
                }
                None
            }
        };

        let key = self.limiter.key_for(
            &request.route,
            identity.as_ref().map(|i| i.id),
            request.client_ip,
        );
        self.limiter.try_admit(&request.route, key)?;

        Ok(AuthorizedContext {
            identity,
            route: request.route.clone(),
        })
    }

    /// Pipeline plus the transform route's logic.
    pub async fn handle_transform(
        &self,
        request: &GatewayRequest,
        photo_id: Uuid,
        op_names: &[String],
        params: Vec<(String, String)>,
    ) -> Result<String, GatewayError> {
        self.handle(request).await?;
        let locator = self
            .transforms
            .request_transform(photo_id, op_names, params)
            .await?;
        Ok(locator)
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn transforms(&self) -> &TransformCoordinator {
        &self.transforms
    }
}
