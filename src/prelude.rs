//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use patterns_operator::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Reconciler types and the seams it is built on
pub use crate::controller::reconciler::{
    reconcile, reconcile_pattern, Backends, BackoffState, ClusterFacts, NamespaceLookup,
    ObjectStore, Outcome, PatternStore, Reconciler, ReconcilerError,
};

pub use crate::config::ControllerConfig;
pub use crate::error::Error;
