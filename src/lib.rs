//! # Patterns Operator
//!
//! Kubernetes operator that converges an OpenShift cluster onto a validated
//! GitOps pattern.
//!
//! A `Pattern` names a git repository and a cluster group. For each Pattern
//! the operator:
//!
//! 1. Installs the OpenShift GitOps operator through an OLM `Subscription`
//! 2. Waits for the `openshift-gitops` namespace to appear
//! 3. Creates an Argo CD `Application` rendering the pattern's cluster-group
//!    chart, with values derived from the Pattern and the cluster
//! 4. Keeps both in line with the Pattern until it is deleted
//!
//! See `controller::reconciler` for the reconcile flow.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod error;
pub mod observability;
pub mod prelude;
pub mod runtime;
