//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits for deserialization from config
//! files, and every field has a default so minimal configs load.

use serde::{Deserialize, Serialize};

use crate::admission::RateScope;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Token lifetimes.
    pub auth: AuthConfig,

    /// Rate limiting policies.
    pub admission: AdmissionConfig,

    /// Derived-asset coordination and share-link settings.
    pub transform: TransformConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Token lifetime configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Access-token lifetime in seconds.
    pub access_ttl_secs: u64,

    /// Refresh-token lifetime in seconds. Must exceed the access TTL.
    pub refresh_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: 900,
            refresh_ttl_secs: 7 * 24 * 3600,
        }
    }
}

/// Admission-control configuration: a default policy plus per-route
/// overrides.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Default maximum admitted weight per window.
    pub default_limit: u32,

    /// Default window length in seconds.
    pub default_window_secs: u64,

    /// Per-route policies.
    pub routes: Vec<RoutePolicyConfig>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            default_limit: 60,
            default_window_secs: 60,
            routes: Vec::new(),
        }
    }
}

/// Rate policy for one route.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutePolicyConfig {
    /// Route identifier for logging/metrics.
    pub route: String,

    /// Maximum admitted weight within the window.
    pub limit: u32,

    /// Trailing window length in seconds.
    pub window_secs: u64,

    /// Counter scope (default: identity).
    #[serde(default = "default_scope")]
    pub scope: RateScope,
}

fn default_scope() -> RateScope {
    RateScope::Identity
}

/// Transform coordination configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Base URL that derived-asset locators are published under.
    pub base_url: String,

    /// How long a fan-in waiter blocks on an in-flight sibling before
    /// reporting an upstream failure, in milliseconds.
    pub wait_timeout_ms: u64,

    /// QR rendering settings.
    pub qr: QrConfig,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            base_url: "https://photos.example.com/derived".to_string(),
            wait_timeout_ms: 30_000,
            qr: QrConfig::default(),
        }
    }
}

/// QR code rendering settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QrConfig {
    /// Minimum rendered width/height in pixels.
    pub min_width: u32,

    /// Render the surrounding quiet zone.
    pub quiet_zone: bool,

    /// Foreground color (CSS color string).
    pub dark_color: String,

    /// Background color (CSS color string).
    pub light_color: String,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            min_width: 200,
            quiet_zone: true,
            dark_color: "#000000".to_string(),
            light_color: "#ffffff".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default tracing filter when RUST_LOG is unset.
    pub log_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "photo_gateway=debug".to_string(),
        }
    }
}
