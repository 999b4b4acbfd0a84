//! # Step Runner
//!
//! The ordered steps of a reconcile pass. Each step either lets the pass
//! continue or stops it with a report; the runner executes steps until the
//! first stop, so a pass never performs more than one action.

use crate::controller::reconciler::status::StepReport;
use std::future::Future;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternStep {
    PreValidation,
    Subscription,
    GitOpsNamespace,
    Application,
    PostValidation,
}

impl PatternStep {
    /// Every step, in execution order
    pub const SEQUENCE: [PatternStep; 5] = [
        PatternStep::PreValidation,
        PatternStep::Subscription,
        PatternStep::GitOpsNamespace,
        PatternStep::Application,
        PatternStep::PostValidation,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternStep::PreValidation => "prerequisite validation",
            PatternStep::Subscription => "gitops subscription",
            PatternStep::GitOpsNamespace => "check application namespace",
            PatternStep::Application => "application",
            PatternStep::PostValidation => "validation",
        }
    }
}

/// Result of a single step
#[derive(Debug)]
pub enum Flow {
    /// Nothing to do, move on to the next step
    Continue,
    /// The step acted or failed; the pass ends with this report
    Stop(StepReport),
}

/// Run `steps` in order until one stops
///
/// Returns `None` when every step continued.
pub async fn run_sequence<F, Fut>(steps: &[PatternStep], mut run: F) -> Option<StepReport>
where
    F: FnMut(PatternStep) -> Fut,
    Fut: Future<Output = Flow>,
{
    for &step in steps {
        match run(step).await {
            Flow::Continue => debug!(step = step.as_str(), "step.no_op"),
            Flow::Stop(report) => return Some(report),
        }
    }
    None
}
