//! # Custom Resource Definitions
//!
//! CRD types for the Patterns Operator.
//!
//! ## Module Structure
//!
//! - `spec.rs` - The Pattern resource and its configuration blocks
//! - `status.rs` - Status written back after every step
//! - `subscription.rs` - OLM Subscription (dependent resource)
//! - `application.rs` - Argo CD Application (dependent resource)

mod application;
mod spec;
mod status;
mod subscription;

pub use application::{
    Application, ApplicationDestination, ApplicationSource, ApplicationSourceHelm,
    ApplicationSpec, HelmParameter, SyncPolicy, SyncPolicyAutomated,
};
pub use spec::{GitConfig, GitOpsConfig, InstallMode, Pattern, PatternParameter, PatternSpec};
pub use status::PatternStatus;
pub use subscription::{EnvVar, Subscription, SubscriptionConfig, SubscriptionSpec};
