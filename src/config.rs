//! Configuration management for Tollgate.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::error::{Result, TollgateError};
use crate::limiter::Quota;

/// Main configuration for the Tollgate service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TollgateConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Counter store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Admission control configuration
    #[serde(default)]
    pub limiter: LimiterConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> SocketAddr {
    "127.0.0.1:8080".parse().unwrap()
}

/// Counter store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Redis connection URL. When unset, an in-process store is used.
    pub redis_url: Option<String>,

    /// Upper bound on a single store operation, in milliseconds
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

fn default_operation_timeout_ms() -> u64 {
    1000
}

impl StoreConfig {
    /// The per-operation timeout as a [`Duration`].
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Admission control configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Default window length as a duration string (e.g. "10s", "1m")
    #[serde(default = "default_window")]
    pub window: String,

    /// Default credits granted per window
    #[serde(default = "default_credits")]
    pub credits: u64,

    /// Header carrying the caller credential
    #[serde(default = "default_credential_header")]
    pub credential_header: String,

    /// Quota resolution policy
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            window: default_window(),
            credits: default_credits(),
            credential_header: default_credential_header(),
            resolver: ResolverConfig::default(),
        }
    }
}

fn default_window() -> String {
    "10s".to_string()
}

fn default_credits() -> u64 {
    10
}

fn default_credential_header() -> String {
    "x-api-key".to_string()
}

impl LimiterConfig {
    /// Parse the configured default quota.
    pub fn default_quota(&self) -> Result<Quota> {
        let window = humantime::parse_duration(&self.window)
            .map_err(|e| TollgateError::Config(format!("invalid window '{}': {}", self.window, e)))?;
        if window.is_zero() {
            return Err(TollgateError::Config("window must be greater than zero".to_string()));
        }
        Ok(Quota::new(window, self.credits))
    }
}

/// Quota resolution policy configuration.
///
/// `token_override` reads a per-caller quota from a signed token;
/// `credential_split` selects between two static quotas based on whether
/// the caller presented a credential at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ResolverConfig {
    TokenOverride {
        /// Secret used to verify override tokens. Empty disables overrides.
        #[serde(default)]
        token_secret: String,
        /// Claim holding the window length (duration string)
        #[serde(default = "default_window_claim")]
        window_claim: String,
        /// Claim holding the credits per window (numeric)
        #[serde(default = "default_credits_claim")]
        credits_claim: String,
    },
    CredentialSplit {
        /// Credits per window for callers presenting a credential
        authenticated_credits: u64,
        /// Credits per window for anonymous (address-keyed) callers
        anonymous_credits: u64,
    },
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig::TokenOverride {
            token_secret: String::new(),
            window_claim: default_window_claim(),
            credits_claim: default_credits_claim(),
        }
    }
}

fn default_window_claim() -> String {
    "rateLimiterTimeWindow".to_string()
}

fn default_credits_claim() -> String {
    "rateLimiterCreditsPerTimeWindow".to_string()
}

impl TollgateConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: TollgateConfig = serde_yaml::from_str(&contents)
            .map_err(|e| TollgateError::Config(e.to_string()))?;
        Ok(config)
    }
}
