//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use std::time::Duration;

/// Controller-level configuration
///
/// All settings have defaults and can be overridden via environment variables,
/// typically populated from a ConfigMap with `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Requeue after a successful discrete step (seconds)
    pub step_requeue_secs: u64,
    /// Reconcile interval for Patterns that do not set `reconcileMinutes`,
    /// at least 1
    pub default_reconcile_minutes: u32,
    /// Fibonacci backoff lower bound after a failed step (minutes)
    pub backoff_min_minutes: u64,
    /// Fibonacci backoff upper bound after a failed step (minutes)
    pub backoff_max_minutes: u64,
    /// Maximum concurrent reconciliations
    pub max_concurrent_reconciliations: usize,
    /// Field manager recorded on writes to the API server
    pub field_manager: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            step_requeue_secs: DEFAULT_STEP_REQUEUE_SECS,
            default_reconcile_minutes: DEFAULT_RECONCILE_MINUTES,
            backoff_min_minutes: DEFAULT_BACKOFF_MIN_MINUTES,
            backoff_max_minutes: DEFAULT_BACKOFF_MAX_MINUTES,
            max_concurrent_reconciliations: 10,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            step_requeue_secs: env_var_or_default("STEP_REQUEUE_SECS", DEFAULT_STEP_REQUEUE_SECS),
            default_reconcile_minutes: env_var_or_default(
                "DEFAULT_RECONCILE_MINUTES",
                DEFAULT_RECONCILE_MINUTES,
            )
            .max(1),
            backoff_min_minutes: env_var_or_default(
                "BACKOFF_MIN_MINUTES",
                DEFAULT_BACKOFF_MIN_MINUTES,
            ),
            backoff_max_minutes: env_var_or_default(
                "BACKOFF_MAX_MINUTES",
                DEFAULT_BACKOFF_MAX_MINUTES,
            ),
            max_concurrent_reconciliations: env_var_or_default(
                "MAX_CONCURRENT_RECONCILIATIONS",
                10,
            ),
            field_manager: env_var_or_default_str("FIELD_MANAGER", DEFAULT_FIELD_MANAGER),
        }
    }

    /// Requeue duration after a successful step
    #[must_use]
    pub fn step_requeue(&self) -> Duration {
        Duration::from_secs(self.step_requeue_secs)
    }
}

/// Helper function to read environment variable or return default
fn env_var_or_default<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Helper function to read string environment variable or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
