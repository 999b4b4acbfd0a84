//! # Pattern Spec
//!
//! Main CRD specification types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Pattern Custom Resource Definition
///
/// A Pattern declares which GitOps repository should drive the cluster and how
/// the OpenShift GitOps operator used to deploy it should be installed.
///
/// # Example
///
/// ```yaml
/// apiVersion: gitops.hybrid-cloud-patterns.io/v1alpha1
/// kind: Pattern
/// metadata:
///   name: industrial-edge
///   namespace: patterns
/// spec:
///   clusterGroupName: datacenter
///   gitSpec:
///     targetRepo: https://github.com/hybrid-cloud-patterns/industrial-edge.git
///     targetRevision: main
/// ```
#[derive(kube::CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "Pattern",
    group = "gitops.hybrid-cloud-patterns.io",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::PatternStatus",
    shortname = "pat",
    derive = "PartialEq",
    derive = "Default",
    printcolumn = r#"{"name":"Step", "type":"string", "jsonPath":".status.lastStep"}, {"name":"Error", "type":"string", "jsonPath":".status.lastError"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PatternSpec {
    /// Cluster group (values-<name>.yaml) this cluster belongs to
    /// Default: "default"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_group_name: Option<String>,
    /// Git source of the pattern
    pub git_spec: GitConfig,
    /// How the GitOps operator is installed and how Argo CD syncs
    /// Instantiated with defaults when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_ops_spec: Option<GitOpsConfig>,
    /// Minutes between full reconciliations once the pattern has converged
    /// Default: 10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconcile_minutes: Option<u32>,
    /// Additional Helm parameters passed to the pattern Application
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_parameters: Vec<PatternParameter>,
    /// Additional Helm value files appended after the generated ones
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_value_files: Vec<String>,
}

/// Git source configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitConfig {
    /// Repository URL, e.g. https://github.com/org/pattern.git
    /// SSH-style URLs (git@host:org/repo) are rejected
    pub target_repo: String,
    /// Branch, tag or commit to deploy
    /// Default: "main"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_revision: Option<String>,
    /// Git host; derived from targetRepo when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Base URL the cluster reads values files from
    /// Derived for github.com repositories when unset
    #[serde(
        default,
        rename = "valuesDirectoryURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub values_directory_url: Option<String>,
}

/// GitOps operator and sync configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GitOpsConfig {
    /// Whether Argo CD syncs the Application automatically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_policy: Option<InstallMode>,
    /// OLM install plan approval for the GitOps operator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_plan_approval: Option<InstallMode>,
    /// OLM channel, e.g. "stable"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_channel: Option<String>,
    /// OLM catalog source, e.g. "redhat-operators"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator_source: Option<String>,
    /// Operator version the Subscription starts from, e.g. "v1.4.0"
    #[serde(
        default,
        rename = "operatorCSV",
        skip_serializing_if = "Option::is_none"
    )]
    pub operator_csv: Option<String>,
}

/// Automatic or manual behaviour, shared by sync policy and install plan approval
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub enum InstallMode {
    #[default]
    Automatic,
    Manual,
}

impl InstallMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallMode::Automatic => "Automatic",
            InstallMode::Manual => "Manual",
        }
    }
}

/// A single name/value Helm parameter
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct PatternParameter {
    pub name: String,
    pub value: String,
}
