//! Shared fixtures for integration tests: an in-memory gateway world with
//! a manual clock and a scripted transformer.

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use photo_gateway::admission::{RateLimiter, RateScope};
use photo_gateway::auth::{InMemoryTokenStore, RefreshToken, Session, SessionManager};
use photo_gateway::clock::ManualClock;
use photo_gateway::config::{GatewayConfig, RoutePolicyConfig};
use photo_gateway::directory::{hash_password, Identity, InMemoryDirectory, Role};
use photo_gateway::policy::AccessPolicy;
use photo_gateway::transform::{
    InMemoryAssetStore, InMemoryPhotoCatalog, TransformCoordinator, TransformError, TransformOp,
    Transformer,
};
use photo_gateway::Gateway;

/// Transformer double: counts invocations, optionally fails, optionally
/// sleeps to hold the in-flight window open.
pub struct ScriptedTransformer {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    pub delay: Duration,
}

impl ScriptedTransformer {
    pub fn new(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delay,
        }
    }

    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transformer for ScriptedTransformer {
    async fn apply(
        &self,
        source_locator: &str,
        ops: &[TransformOp],
        _params: &[(String, String)],
    ) -> Result<String, TransformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(TransformError::UpstreamFailure("processor offline".into()));
        }
        Ok(format!("{}/{}", source_locator, ops[0].as_str()))
    }
}

pub struct TestWorld {
    pub gateway: Arc<Gateway>,
    pub clock: Arc<ManualClock>,
    pub directory: Arc<InMemoryDirectory>,
    pub catalog: Arc<InMemoryPhotoCatalog>,
    pub transformer: Arc<ScriptedTransformer>,
    pub config: GatewayConfig,
}

impl TestWorld {
    pub fn register(&self, username: &str, password: &str, role: Role) -> Uuid {
        self.directory
            .register(Identity::new(
                username,
                hash_password(password).unwrap(),
                role,
            ))
            .expect("username free")
    }

    pub async fn login(&self, username: &str, password: &str) -> (Session, RefreshToken) {
        self.gateway
            .sessions()
            .login(username, password)
            .await
            .expect("login")
    }

    #[allow(dead_code)]
    pub fn add_photo(&self, locator: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.catalog.add(id, locator);
        id
    }
}

pub fn client_ip() -> IpAddr {
    "203.0.113.9".parse().unwrap()
}

/// Build a gateway over fresh in-memory stores. `transform_delay` holds the
/// upstream call open so tests can observe fan-in.
pub fn build_world(transform_delay: Duration) -> TestWorld {
    let mut config = GatewayConfig::default();
    config.admission.routes = vec![
        RoutePolicyConfig {
            route: "photos.transform".into(),
            limit: 30,
            window_secs: 60,
            scope: RateScope::Identity,
        },
        RoutePolicyConfig {
            route: "auth.signup".into(),
            limit: 3,
            window_secs: 60,
            scope: RateScope::Ip,
        },
    ];
    config.transform.wait_timeout_ms = 5_000;

    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let directory = Arc::new(InMemoryDirectory::new());
    let tokens = Arc::new(InMemoryTokenStore::new());
    let catalog = Arc::new(InMemoryPhotoCatalog::new());
    let transformer = Arc::new(ScriptedTransformer::new(transform_delay));

    let sessions = Arc::new(SessionManager::new(
        directory.clone(),
        tokens.clone(),
        clock.clone(),
        &config.auth,
    ));
    let policy = Arc::new(AccessPolicy::new(directory.clone(), tokens.clone()));
    let limiter = Arc::new(RateLimiter::new(&config.admission, clock.clone()));
    let transforms = Arc::new(TransformCoordinator::new(
        Arc::new(InMemoryAssetStore::new()),
        catalog.clone(),
        transformer.clone(),
        clock.clone(),
        &config.transform,
    ));

    TestWorld {
        gateway: Arc::new(Gateway::new(sessions, policy, limiter, transforms)),
        clock,
        directory,
        catalog,
        transformer,
        config,
    }
}
