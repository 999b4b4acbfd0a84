//! # Reconciler
//!
//! Converges a cluster onto the state a `Pattern` declares.
//!
//! Each pass performs at most one action:
//! - keep the finalizer marker in place, or release it on deletion
//! - install the OpenShift GitOps operator through an OLM `Subscription`
//! - wait for the `openshift-gitops` namespace
//! - create or update the Argo CD `Application` for the pattern
//!
//! Once nothing is left to do the Pattern is revisited every
//! `reconcileMinutes`.

pub mod application;
pub mod client;
pub mod defaults;
pub mod dependent;
pub mod finalizer;
pub mod reconcile;
pub mod status;
pub mod steps;
pub mod subscription;
pub mod types;
pub mod validation;

// Re-export public API
pub use client::{Backends, ClusterFacts, KubeStore, NamespaceLookup, ObjectStore, PatternStore};
pub use reconcile::{reconcile, reconcile_pattern};
pub use status::Outcome;
pub use types::{BackoffState, LogOnce, Reconciler, ReconcilerError};
