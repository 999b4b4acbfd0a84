//! # Reconciliation Logic
//!
//! One pass over a Pattern. The pass is driven by the ordered step runner
//! and ends after the first step that acts or fails, so every invocation
//! performs at most one state-changing write besides its status report.
//!
//! ## Flow
//!
//! 1. Fetch the Pattern (gone means done)
//! 2. Add the finalizer marker, or finalize when the Pattern is being deleted
//! 3. Resolve defaults and cluster facts into an effective copy
//! 4. Run the steps: validation, Subscription, namespace, Application
//! 5. Nothing to do: come back after `reconcileMinutes`

use crate::constants::APPLICATION_NAMESPACE;
use crate::controller::reconciler::application::ApplicationKind;
use crate::controller::reconciler::defaults::resolve_defaults;
use crate::controller::reconciler::dependent::reconcile_dependent;
use crate::controller::reconciler::finalizer::{add_marker, finalize_pattern, finalizers, has_marker};
use crate::controller::reconciler::status::{report, Outcome, StepReport};
use crate::controller::reconciler::steps::{run_sequence, Flow, PatternStep};
use crate::controller::reconciler::subscription::SubscriptionKind;
use crate::controller::reconciler::types::{Reconciler, ReconcilerError};
use crate::controller::reconciler::validation::{post_validation, pre_validation};
use crate::crd::Pattern;
use crate::error::Error;
use crate::observability;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, Instrument};

/// Entry point handed to the kube-runtime `Controller`
///
/// Failed steps without an explicit requeue come back as `Err` so the error
/// policy can apply its backoff.
pub async fn reconcile(
    pattern: Arc<Pattern>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let name = pattern.name_any();
    let namespace = pattern.namespace().unwrap_or_default();
    let span = info_span!(
        "reconcile",
        resource.name = %name,
        resource.namespace = %namespace,
        resource.kind = "Pattern"
    );

    async move {
        let start = Instant::now();
        observability::metrics::increment_reconciliations();

        let outcome = reconcile_pattern(&ctx, &namespace, &name).await;

        observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
        if outcome.error.is_none() && ctx.reset_backoff(&namespace, &name) {
            info!("Pattern recovered, error backoff reset");
        }
        outcome.into_action()
    }
    .instrument(span)
    .await
}

/// Run one pass for the Pattern identified by `namespace`/`name`
pub async fn reconcile_pattern(ctx: &Reconciler, namespace: &str, name: &str) -> Outcome {
    let pattern = match ctx.backends.patterns.fetch(namespace, name).await {
        Ok(Some(pattern)) => pattern,
        Ok(None) => {
            debug!("Pattern not found, nothing to do");
            ctx.forget_backoff(namespace, name);
            return Outcome::done();
        }
        Err(e) => {
            error!("Failed to fetch Pattern: {}", e);
            return Outcome::unreported("fetch pattern", &e);
        }
    };

    if pattern.metadata.deletion_timestamp.is_some() {
        return match finalize_pattern(ctx.backends.patterns.as_ref(), &pattern).await {
            Ok(()) => {
                ctx.forget_backoff(namespace, name);
                Outcome::done()
            }
            Err(e) => {
                error!("Failed to release finalizer: {}", e);
                Outcome::unreported("finalize pattern", &e)
            }
        };
    }

    if !has_marker(finalizers(&pattern)) {
        let mut marked = pattern.clone();
        marked.metadata.finalizers = Some(add_marker(finalizers(&pattern)));
        let (current, result) = match ctx.backends.patterns.update(&marked).await {
            Ok(updated) => (updated, Ok(())),
            Err(e) => (pattern, Err(e)),
        };
        return report(ctx, &current, StepReport::from_result("updated finalizer", result)).await;
    }

    let effective = match resolve_defaults(
        &pattern,
        ctx.backends.cluster_facts.as_ref(),
        ctx.config.default_reconcile_minutes,
    )
    .await
    {
        Ok(effective) => effective,
        Err(e) => {
            let failure =
                StepReport::failed("applying defaults", e).with_requeue(ctx.config.step_requeue());
            return report(ctx, &pattern, failure).await;
        }
    };

    let stopped = run_sequence(&PatternStep::SEQUENCE, |step| {
        execute_step(ctx, &effective, step)
    })
    .await;

    if let Some(step_report) = stopped {
        return report(ctx, &effective, step_report).await;
    }

    let minutes = effective
        .spec
        .reconcile_minutes
        .unwrap_or(ctx.config.default_reconcile_minutes);
    debug!(minutes, "Pattern converged, waiting for next periodic pass");
    observability::metrics::increment_requeues_total("timer-based");
    Outcome::requeue(Duration::from_secs(u64::from(minutes) * 60))
}

async fn execute_step(ctx: &Reconciler, pattern: &Pattern, step: PatternStep) -> Flow {
    let requeue = ctx.config.step_requeue();
    match step {
        PatternStep::PreValidation => match pre_validation(pattern) {
            Ok(()) => Flow::Continue,
            Err(e) => Flow::Stop(StepReport::failed(step.as_str(), e).with_requeue(requeue)),
        },
        PatternStep::Subscription => {
            let flow = reconcile_dependent::<SubscriptionKind>(ctx, pattern).await;
            if matches!(flow, Flow::Continue) {
                ctx.log_once.info("subscription found");
            }
            flow
        }
        PatternStep::GitOpsNamespace => {
            match ctx.backends.namespaces.namespace_exists(APPLICATION_NAMESPACE).await {
                Ok(true) => {
                    ctx.log_once.info("namespace found");
                    Flow::Continue
                }
                Ok(false) => Flow::Stop(
                    StepReport::failed(
                        step.as_str(),
                        Error::WaitingForNamespace(APPLICATION_NAMESPACE.to_string()),
                    )
                    .with_requeue(requeue),
                ),
                Err(e) => Flow::Stop(StepReport::failed(step.as_str(), e)),
            }
        }
        PatternStep::Application => reconcile_dependent::<ApplicationKind>(ctx, pattern).await,
        PatternStep::PostValidation => match post_validation(pattern) {
            Ok(()) => Flow::Continue,
            Err(e) => Flow::Stop(StepReport::failed(step.as_str(), e).with_requeue(requeue)),
        },
    }
}
