//! # Dependent Resources
//!
//! One reconcile routine shared by every resource a Pattern owns. A kind
//! describes its target shape, which fields the controller owns and how a
//! same-named resource owned by someone else is treated; the routine does
//! fetch, create, drift update and the ownership check.
//!
//! Ownership is decided only by an owner reference carrying the Pattern's UID.
//!
//! Drift is written back as a JSON merge patch holding only the owned fields
//! that differ. The typed objects are subsets of what the API server stores,
//! so the live object is never sent back whole.

use crate::controller::reconciler::client::{Backends, ObjectStore};
use crate::controller::reconciler::status::StepReport;
use crate::controller::reconciler::steps::Flow;
use crate::controller::reconciler::types::{LogOnce, Reconciler};
use crate::crd::Pattern;
use crate::error::Error;
use crate::observability;
use kube::{Resource, ResourceExt};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// How to treat a same-named resource that this Pattern does not own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignPolicy {
    /// Leave it alone and carry on
    Ignore,
    /// Fail the pass with an ownership error
    Conflict,
}

pub trait DependentKind {
    type Object: Resource<DynamicType = ()> + Clone + Send + Sync + 'static;

    const KIND: &'static str;
    /// Reported when the resource is created, or its fetch/creation fails
    const CREATE_STEP: &'static str;
    /// Reported when owned fields drifted and were written back
    const UPDATE_STEP: &'static str;
    const FOREIGN: ForeignPolicy;
    /// Increment `status.version` when a drift update fails
    const BUMP_GENERATION_ON_FAILED_UPDATE: bool;

    /// Desired object for the effective Pattern, without owner references
    fn target(pattern: &Pattern) -> Self::Object;

    /// The fields this controller owns, as they appear on the wire
    fn owned_fields(object: &Self::Object) -> Result<Value, Error>;

    fn store(backends: &Backends) -> &dyn ObjectStore<Self::Object>;
}

/// True when any owner reference on `object` points at `uid`
pub fn is_owned_by<K: Resource>(object: &K, uid: &str) -> bool {
    object.owner_references().iter().any(|owner| owner.uid == uid)
}

/// JSON merge patch (RFC 7386) that turns `live` into `target`.
///
/// Objects are compared key by key and only differing keys are carried. A
/// key `live` has and `target` lacks is nulled whole. Anything that is not an
/// object, arrays included, is replaced whole. `None` when the two are equal.
#[must_use]
pub fn merge_diff(live: &Value, target: &Value) -> Option<Value> {
    match (live, target) {
        (Value::Object(live), Value::Object(target)) => {
            let mut patch = Map::new();
            for (key, wanted) in target {
                let change = match live.get(key) {
                    Some(current) => merge_diff(current, wanted),
                    None if wanted.is_null() => None,
                    None => Some(wanted.clone()),
                };
                if let Some(change) = change {
                    patch.insert(key.clone(), change);
                }
            }
            for (key, current) in live {
                if !target.contains_key(key) && !current.is_null() {
                    patch.insert(key.clone(), Value::Null);
                }
            }
            (!patch.is_empty()).then_some(Value::Object(patch))
        }
        _ if live == target => None,
        _ => Some(target.clone()),
    }
}

/// Merge patch bringing the owned fields of `live` in line with `target`,
/// carrying `live`'s `resourceVersion`. `None` when nothing drifted.
pub fn drift_patch<D: DependentKind>(
    target: &D::Object,
    live: &D::Object,
) -> Result<Option<Value>, Error> {
    let Some(mut patch) = merge_diff(&D::owned_fields(live)?, &D::owned_fields(target)?) else {
        return Ok(None);
    };
    if let (Some(fields), Some(version)) = (patch.as_object_mut(), live.resource_version()) {
        fields.insert(
            "metadata".to_string(),
            serde_json::json!({ "resourceVersion": version }),
        );
    }
    Ok(Some(patch))
}

/// Converge one dependent of `pattern` through the kind's store
pub async fn reconcile_dependent<D: DependentKind>(ctx: &Reconciler, pattern: &Pattern) -> Flow {
    converge::<D>(D::store(&ctx.backends), &ctx.log_once, pattern).await
}

/// At most one write happens. `Continue` means the live object matches or is
/// foreign and ignorable.
pub async fn converge<D: DependentKind>(
    store: &dyn ObjectStore<D::Object>,
    log_once: &LogOnce,
    pattern: &Pattern,
) -> Flow {
    let Some(owner) = pattern.controller_owner_ref(&()) else {
        return Flow::Stop(StepReport::failed(D::CREATE_STEP, Error::MissingIdentity));
    };

    let mut target = D::target(pattern);
    target.meta_mut().owner_references = Some(vec![owner.clone()]);

    let namespace = target.namespace().unwrap_or_default();
    let name = target.name_any();

    let live = match store.fetch(&namespace, &name).await {
        Ok(live) => live,
        Err(e) => return Flow::Stop(StepReport::failed(D::CREATE_STEP, e)),
    };

    match live {
        None => {
            info!(kind = D::KIND, name = %name, namespace = %namespace, "Creating dependent resource");
            let result = store.create(&target).await;
            if result.is_ok() {
                observability::metrics::increment_dependent_operation(D::KIND, "create");
            }
            Flow::Stop(StepReport::from_result(D::CREATE_STEP, result))
        }
        Some(live) if is_owned_by(&live, &owner.uid) => {
            let patch = match drift_patch::<D>(&target, &live) {
                Ok(Some(patch)) => patch,
                Ok(None) => {
                    debug!(kind = D::KIND, name = %name, "Dependent resource up to date");
                    return Flow::Continue;
                }
                Err(e) => return Flow::Stop(StepReport::failed(D::UPDATE_STEP, e)),
            };

            info!(kind = D::KIND, name = %name, namespace = %namespace, "Updating drifted dependent resource");
            let result = store.merge_patch(&namespace, &name, &patch).await;
            let failed = result.is_err();
            if !failed {
                observability::metrics::increment_dependent_operation(D::KIND, "update");
            }
            Flow::Stop(
                StepReport::from_result(D::UPDATE_STEP, result)
                    .with_generation_bump(failed && D::BUMP_GENERATION_ON_FAILED_UPDATE),
            )
        }
        Some(_) => match D::FOREIGN {
            ForeignPolicy::Ignore => {
                log_once.info(&format!(
                    "The {} {}/{} is not owned by us, leaving untouched",
                    D::KIND,
                    namespace,
                    name
                ));
                Flow::Continue
            }
            ForeignPolicy::Conflict => Flow::Stop(StepReport::failed(
                D::CREATE_STEP,
                Error::NotOwned {
                    kind: D::KIND,
                    name,
                },
            )),
        },
    }
}
