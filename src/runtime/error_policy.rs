//! # Error Policy
//!
//! Requeue timing for reconciliations that returned an error.

use crate::controller::reconciler::{BackoffState, Reconciler, ReconcilerError};
use crate::crd::Pattern;
use crate::observability;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Fallback delay when the backoff table cannot be read
const FALLBACK_BACKOFF_SECS: u64 = 60;

/// Handle a failed reconciliation with per-resource Fibonacci backoff
///
/// Each Pattern backs off independently; a clean pass resets its state.
pub fn handle_reconciliation_error(
    pattern: Arc<Pattern>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = pattern.name_any();
    let namespace = pattern.namespace().unwrap_or_default();

    let error_span = tracing::error_span!(
        "controller.reconciliation_error",
        resource.name = %name,
        resource.namespace = %namespace,
        error = %error
    );
    let _guard = error_span.enter();

    error!("Reconciliation failed: {}", error);
    observability::metrics::increment_reconciliation_errors();

    let (backoff_seconds, error_count) = next_backoff(&ctx, &namespace, &name);
    let next_trigger = chrono::Utc::now()
        + chrono::Duration::seconds(i64::try_from(backoff_seconds).unwrap_or(i64::MAX));

    info!(
        backoff_seconds,
        error_count,
        next_retry = %next_trigger.to_rfc3339(),
        "Retrying with Fibonacci backoff"
    );

    observability::metrics::increment_requeues_total("error-backoff");
    Action::requeue(Duration::from_secs(backoff_seconds))
}

/// Advance the backoff for `namespace/name`, returning the delay and error count
fn next_backoff(ctx: &Reconciler, namespace: &str, name: &str) -> (u64, u32) {
    let resource_key = format!("{namespace}/{name}");
    match ctx.backoff_states.lock() {
        Ok(mut states) => {
            let state = states.entry(resource_key).or_insert_with(|| {
                BackoffState::new(ctx.config.backoff_min_minutes, ctx.config.backoff_max_minutes)
            });
            state.increment_error();
            (state.backoff.next_backoff_seconds(), state.error_count)
        }
        Err(e) => {
            warn!("Failed to lock backoff_states: {}, using default backoff", e);
            (FALLBACK_BACKOFF_SECS, 0)
        }
    }
}
