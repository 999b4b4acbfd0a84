//! # Status Reporting
//!
//! Records the outcome of a reconcile step on the Pattern and turns it into a
//! requeue decision.
//!
//! Requeue rules:
//! - an explicit duration on the report wins, error or not
//! - a successful step requeues after the short step delay
//! - a failed step does not requeue; the runtime's error policy takes over

use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::crd::Pattern;
use crate::error::Error;
use crate::observability;
use kube_runtime::controller::Action;
use std::time::Duration;
use tracing::{error, info, warn};

/// What a step did, before it is written to status
#[derive(Debug)]
pub struct StepReport {
    pub step: &'static str,
    pub error: Option<Error>,
    pub requeue_after: Option<Duration>,
    /// Increment `status.version` when this report is recorded
    pub bump_generation: bool,
}

impl StepReport {
    #[must_use]
    pub fn succeeded(step: &'static str) -> Self {
        Self {
            step,
            error: None,
            requeue_after: None,
            bump_generation: false,
        }
    }

    #[must_use]
    pub fn failed(step: &'static str, error: Error) -> Self {
        Self {
            error: Some(error),
            ..Self::succeeded(step)
        }
    }

    #[must_use]
    pub fn from_result<T>(step: &'static str, result: Result<T, Error>) -> Self {
        match result {
            Ok(_) => Self::succeeded(step),
            Err(e) => Self::failed(step, e),
        }
    }

    #[must_use]
    pub fn with_requeue(mut self, after: Duration) -> Self {
        self.requeue_after = Some(after);
        self
    }

    #[must_use]
    pub fn with_generation_bump(mut self, bump: bool) -> Self {
        self.bump_generation = bump;
        self
    }
}

/// Final result of one reconcile pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Step that was reported, if any
    pub step: Option<&'static str>,
    pub requeue_after: Option<Duration>,
    pub error: Option<String>,
}

impl Outcome {
    /// Nothing left to do until the next change
    #[must_use]
    pub fn done() -> Self {
        Self {
            step: None,
            requeue_after: None,
            error: None,
        }
    }

    #[must_use]
    pub fn requeue(after: Duration) -> Self {
        Self {
            requeue_after: Some(after),
            ..Self::done()
        }
    }

    /// An error that is returned to the runtime without touching status
    #[must_use]
    pub fn unreported(step: &'static str, error: &Error) -> Self {
        Self {
            step: Some(step),
            requeue_after: None,
            error: Some(error.to_string()),
        }
    }

    /// Translate into what kube-runtime expects
    ///
    /// # Errors
    ///
    /// `StepFailed` when the pass failed without an explicit requeue.
    pub fn into_action(self) -> Result<Action, ReconcilerError> {
        match (self.requeue_after, self.error) {
            (Some(after), _) => Ok(Action::requeue(after)),
            (None, Some(message)) => Err(ReconcilerError::StepFailed {
                step: self.step.unwrap_or("reconcile").to_string(),
                message,
            }),
            (None, None) => Ok(Action::await_change()),
        }
    }
}

/// Write `lastStep`/`lastError` for `report` onto `pattern` and decide the requeue
///
/// Status persistence is best effort; a failed write is logged and does not
/// change the outcome.
pub async fn report(ctx: &Reconciler, pattern: &Pattern, report: StepReport) -> Outcome {
    let mut updated = pattern.clone();
    let status = updated.status.get_or_insert_with(Default::default);

    if report.bump_generation {
        status.version += 1;
    }
    status.last_step = Some(report.step.to_string());
    status.last_error = Some(
        report
            .error
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
    );

    match &report.error {
        Some(e) => warn!(step = report.step, error = %e, "Reconcile step failed"),
        None => info!(step = report.step, "Reconcile step complete"),
    }

    if let Err(e) = ctx.backends.patterns.update_status(&updated).await {
        error!("Failed to update Pattern status: {}", e);
    }

    observability::metrics::increment_step(report.step, report.error.is_some());

    let requeue_after = report.requeue_after.or_else(|| {
        report
            .error
            .is_none()
            .then(|| ctx.config.step_requeue())
    });
    if requeue_after.is_some() {
        observability::metrics::increment_requeues_total("step");
    }

    Outcome {
        step: Some(report.step),
        requeue_after,
        error: report.error.map(|e| e.to_string()),
    }
}
