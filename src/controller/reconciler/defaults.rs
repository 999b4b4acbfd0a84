//! # Defaults
//!
//! Builds the effective Pattern the rest of a pass works from. The persisted
//! record is never modified; defaults live only in the returned copy (and in
//! whatever status gets written from it).

use crate::constants::{
    DEFAULT_CLUSTER_GROUP, DEFAULT_OPERATOR_CHANNEL, DEFAULT_OPERATOR_CSV, DEFAULT_OPERATOR_SOURCE,
    DEFAULT_TARGET_REVISION, GITHUB_HOSTNAME,
};
use crate::controller::reconciler::client::ClusterFacts;
use crate::crd::{GitConfig, Pattern};
use crate::error::Error;
use kube::ResourceExt;
use std::path::PathBuf;

/// Cluster facts folded into the effective Pattern's status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterInfo {
    pub cluster_id: String,
    pub cluster_domain: String,
}

/// Read cluster facts and apply every default
///
/// Fails when either fact cannot be read or comes back empty.
pub async fn resolve_defaults(
    pattern: &Pattern,
    facts: &dyn ClusterFacts,
    default_reconcile_minutes: u32,
) -> Result<Pattern, Error> {
    let cluster_id = facts.cluster_id().await?;
    if cluster_id.is_empty() {
        return Err(Error::cluster_fact("ClusterVersion", "spec.clusterID is empty"));
    }

    let cluster_domain = facts.ingress_domain().await?;
    if cluster_domain.is_empty() {
        return Err(Error::cluster_fact("Ingress", "spec.domain is empty"));
    }

    let cluster = ClusterInfo {
        cluster_id,
        cluster_domain,
    };
    Ok(with_defaults(pattern, &cluster, default_reconcile_minutes))
}

/// Pure part of defaulting; applying it twice gives the same result
#[must_use]
pub fn with_defaults(
    pattern: &Pattern,
    cluster: &ClusterInfo,
    default_reconcile_minutes: u32,
) -> Pattern {
    let mut output = pattern.clone();
    let spec = &mut output.spec;

    if spec.reconcile_minutes.unwrap_or(0) == 0 {
        spec.reconcile_minutes = Some(default_reconcile_minutes.max(1));
    }

    default_git(&mut spec.git_spec);

    let gitops = spec.git_ops_spec.get_or_insert_with(Default::default);
    gitops.sync_policy.get_or_insert_with(Default::default);
    gitops.install_plan_approval.get_or_insert_with(Default::default);
    fill(&mut gitops.operator_channel, DEFAULT_OPERATOR_CHANNEL);
    fill(&mut gitops.operator_source, DEFAULT_OPERATOR_SOURCE);
    fill(&mut gitops.operator_csv, DEFAULT_OPERATOR_CSV);

    fill(&mut spec.cluster_group_name, DEFAULT_CLUSTER_GROUP);

    let staging_path = staging_dir(pattern);

    let status = output.status.get_or_insert_with(Default::default);
    status.cluster_id = Some(cluster.cluster_id.clone());
    status.cluster_domain = Some(cluster.cluster_domain.clone());
    if status.path.as_deref().unwrap_or_default().is_empty() {
        status.path = Some(staging_path.to_string_lossy().into_owned());
    }

    output
}

/// Local working directory of a Pattern: `<temp dir>/<namespace>/<name>`.
/// The only path deletion ever removes.
#[must_use]
pub fn staging_dir(pattern: &Pattern) -> PathBuf {
    std::env::temp_dir()
        .join(pattern.namespace().unwrap_or_default())
        .join(pattern.name_any())
}

fn default_git(git: &mut GitConfig) {
    fill(&mut git.target_revision, DEFAULT_TARGET_REVISION);

    if git.hostname.as_deref().unwrap_or_default().is_empty() {
        git.hostname = repo_hostname(&git.target_repo).map(str::to_string);
    }

    if git.values_directory_url.as_deref().unwrap_or_default().is_empty()
        && git.hostname.as_deref() == Some(GITHUB_HOSTNAME)
    {
        let revision = git.target_revision.as_deref().unwrap_or(DEFAULT_TARGET_REVISION);
        git.values_directory_url = Some(format!(
            "{}/raw/{}/",
            trim_repo_url(&git.target_repo),
            revision
        ));
    }
}

/// Host part of `scheme://host/...`
fn repo_hostname(target_repo: &str) -> Option<&str> {
    target_repo.split('/').nth(2).filter(|host| !host.is_empty())
}

/// Repository URL without trailing slashes or `.git` suffix
#[must_use]
pub fn trim_repo_url(target_repo: &str) -> &str {
    let trimmed = target_repo.trim_end_matches('/');
    trimmed.strip_suffix(".git").unwrap_or(trimmed)
}

fn fill(field: &mut Option<String>, default: &str) {
    if field.as_deref().unwrap_or_default().is_empty() {
        *field = Some(default.to_string());
    }
}
