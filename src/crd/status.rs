//! # Pattern Status
//!
//! Status written by the controller after every discrete step.

use serde::{Deserialize, Serialize};

/// Status of the Pattern resource
///
/// Everything here is derived from the spec and live cluster facts; users
/// should never author it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatternStatus {
    /// Cluster identity from the cluster version resource
    #[serde(default, rename = "clusterID", skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    /// Apps domain from the cluster ingress configuration
    /// Example: "apps.mycluster.example.com"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_domain: Option<String>,
    /// Local staging path for this pattern
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Name of the last step the controller executed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_step: Option<String>,
    /// Error from the last step; empty when it succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// Incremented each time an Application update fails
    #[serde(default)]
    pub version: i64,
}
