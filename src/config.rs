use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Action name that anti-forgery tokens for the monitoring UI are scoped to.
pub const XSRF_ACTION_NAME: &str = "view-mapreduce-ui";

/// Header the hosting platform attaches to task-queue-originated requests.
/// The platform strips it from any externally originated request, so its
/// presence is an unforgeable proof of internal origin.
pub const TASK_QUEUE_HEADER: &str = "X-AppEngine-TaskName";

/// Public prefix for human-facing monitoring pages and assets.
pub const UI_PREFIX: &str = "/mapreduce/ui";

/// Public prefix for machine-to-machine worker callbacks.
pub const WORKER_PREFIX: &str = "/mapreduce/worker";

/// Base path the wrapped job-processing engine must be told to use for its
/// internal callbacks once the gateway's route table is assembled.
pub const WORKER_BASE_PATH: &str = WORKER_PREFIX;

// Default TTL for anti-forgery tokens (2 hours)
const DEFAULT_XSRF_TOKEN_TTL_SECS: u64 = 7200;

// ============================================================================
// Configuration Structures
// ============================================================================

/// Anti-forgery token configuration
#[derive(Clone, Debug)]
pub struct XsrfConfig {
    /// HMAC secret for token signing
    pub secret: String,
    /// Token time-to-live in seconds
    pub token_ttl_secs: u64,
}

/// Gateway configuration
///
/// `ui_access_enabled` is process-wide and administrator-settable at any
/// time; the UI filter reads the current value on every request and never
/// caches it.
pub struct Config {
    ui_access_enabled: AtomicBool,
    pub xsrf: XsrfConfig,
}

impl Config {
    pub fn new(xsrf: XsrfConfig) -> Self {
        Self {
            ui_access_enabled: AtomicBool::new(false),
            xsrf,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("GATEWAY_XSRF_SECRET")
            .context("GATEWAY_XSRF_SECRET must be set")?;

        let token_ttl_secs = std::env::var("GATEWAY_XSRF_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_XSRF_TOKEN_TTL_SECS);

        let ui_access_enabled = std::env::var("GATEWAY_UI_ACCESS_ENABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let config = Self::new(XsrfConfig {
            secret,
            token_ttl_secs,
        });
        config.set_ui_access_enabled(ui_access_enabled);
        Ok(config)
    }

    /// Current state of the UI access toggle
    pub fn ui_access_enabled(&self) -> bool {
        self.ui_access_enabled.load(Ordering::Relaxed)
    }

    /// Flip the UI access toggle. Takes effect for all subsequent requests.
    pub fn set_ui_access_enabled(&self, enabled: bool) {
        self.ui_access_enabled.store(enabled, Ordering::Relaxed);
    }
}
