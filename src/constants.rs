//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! Names and namespaces of the objects the operator manages are fixed by the
//! OpenShift GitOps installation and are not configurable.

/// Finalizer marker placed on every active Pattern
pub const PATTERN_FINALIZER: &str = "foregroundDeletePattern";

/// Label placed on Applications so changes map back to their Pattern
pub const PATTERN_LABEL: &str = "validatedpatterns.io/pattern";

/// Companion label carrying the Pattern namespace
pub const PATTERN_NAMESPACE_LABEL: &str = "validatedpatterns.io/pattern-namespace";

/// Namespace created by the GitOps operator; Applications live here
pub const APPLICATION_NAMESPACE: &str = "openshift-gitops";

/// Namespace holding the GitOps operator Subscription
pub const SUBSCRIPTION_NAMESPACE: &str = "openshift-operators";

/// Name (and OLM package) of the GitOps operator Subscription
pub const SUBSCRIPTION_NAME: &str = "openshift-gitops-operator";

/// Catalog source namespace for the operator package
pub const CATALOG_SOURCE_NAMESPACE: &str = "openshift-marketplace";

/// Helm chart path inside the pattern repository
pub const CLUSTER_GROUP_CHART_PATH: &str = "common/clustergroup";

/// Argo CD destination cluster name for the local cluster
pub const IN_CLUSTER_DESTINATION: &str = "in-cluster";

/// Argo CD project the pattern Application is created in
pub const ARGO_PROJECT: &str = "default";

/// Reconcile interval used when the Pattern does not set one (minutes)
pub const DEFAULT_RECONCILE_MINUTES: u32 = 10;

/// Git revision used when the Pattern does not set one
pub const DEFAULT_TARGET_REVISION: &str = "main";

/// Cluster group used when the Pattern does not set one
pub const DEFAULT_CLUSTER_GROUP: &str = "default";

/// Default operator channel for the GitOps Subscription
pub const DEFAULT_OPERATOR_CHANNEL: &str = "stable";

/// Default catalog source for the GitOps Subscription
pub const DEFAULT_OPERATOR_SOURCE: &str = "redhat-operators";

/// Baseline operator version for the GitOps Subscription
pub const DEFAULT_OPERATOR_CSV: &str = "v1.4.0";

/// Public git host for which a values-directory URL can be derived
pub const GITHUB_HOSTNAME: &str = "github.com";

/// Requeue after a successful discrete step (seconds)
pub const DEFAULT_STEP_REQUEUE_SECS: u64 = 5;

/// Fibonacci backoff bounds for failed reconciliations (minutes)
pub const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;
pub const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Field manager recorded on writes
pub const DEFAULT_FIELD_MANAGER: &str = "patterns-operator";
