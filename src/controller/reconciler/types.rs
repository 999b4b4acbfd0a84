//! # Types
//!
//! Core types for the reconciler.

use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::controller::reconciler::client::Backends;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn};

/// Error surfaced to the controller runtime
///
/// Only failed steps without an explicit requeue end up here; the runtime's
/// error policy then decides when to try again.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("reconcile step {step:?} failed: {message}")]
    StepFailed { step: String, message: String },
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_minutes, max_minutes),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }

    pub fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Emits each distinct message once per process
#[derive(Debug, Clone, Default)]
pub struct LogOnce {
    seen: Arc<Mutex<HashSet<String>>>,
}

impl LogOnce {
    /// Returns true if the message was emitted by this call
    pub fn info(&self, message: &str) -> bool {
        let first = match self.seen.lock() {
            Ok(mut seen) => seen.insert(message.to_string()),
            Err(e) => {
                warn!("Failed to lock log-once set: {}", e);
                true
            }
        };
        if first {
            info!("{}", message);
        }
        first
    }
}

/// Shared reconciler context
#[derive(Debug, Clone)]
pub struct Reconciler {
    pub backends: Backends,
    pub config: ControllerConfig,
    // Backoff state per resource (identified by namespace/name), driven by the error policy
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
    pub log_once: LogOnce,
}

impl Reconciler {
    #[must_use]
    pub fn new(backends: Backends, config: ControllerConfig) -> Self {
        Self {
            backends,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
            log_once: LogOnce::default(),
        }
    }

    /// Clear the error backoff for a resource after a clean pass
    ///
    /// Returns whether the resource had been backing off.
    pub fn reset_backoff(&self, namespace: &str, name: &str) -> bool {
        let resource_key = format!("{namespace}/{name}");
        match self.backoff_states.lock() {
            Ok(mut states) => states.get_mut(&resource_key).is_some_and(|state| {
                let had_errors = state.error_count > 0;
                state.reset();
                had_errors
            }),
            Err(e) => {
                warn!("Failed to lock backoff_states: {}", e);
                false
            }
        }
    }

    /// Drop the backoff entry of a Pattern that is gone or finalized
    pub fn forget_backoff(&self, namespace: &str, name: &str) {
        let resource_key = format!("{namespace}/{name}");
        match self.backoff_states.lock() {
            Ok(mut states) => {
                states.remove(&resource_key);
            }
            Err(e) => warn!("Failed to lock backoff_states: {}", e),
        }
    }
}
