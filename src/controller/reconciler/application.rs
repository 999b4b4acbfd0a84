//! # Pattern Application
//!
//! Argo CD Application that renders the pattern's cluster-group chart. It is
//! named after the Pattern and always belongs to it; finding a same-named
//! Application without our owner reference is an error.

use crate::constants::{
    APPLICATION_NAMESPACE, ARGO_PROJECT, CLUSTER_GROUP_CHART_PATH, DEFAULT_CLUSTER_GROUP,
    DEFAULT_TARGET_REVISION, IN_CLUSTER_DESTINATION, PATTERN_LABEL, PATTERN_NAMESPACE_LABEL,
};
use crate::controller::reconciler::client::{Backends, ObjectStore};
use crate::controller::reconciler::dependent::{DependentKind, ForeignPolicy};
use crate::crd::{
    Application, ApplicationDestination, ApplicationSource, ApplicationSourceHelm,
    ApplicationSpec, HelmParameter, InstallMode, Pattern, SyncPolicy, SyncPolicyAutomated,
};
use crate::error::Error;
use kube::ResourceExt;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug)]
pub struct ApplicationKind;

impl DependentKind for ApplicationKind {
    type Object = Application;

    const KIND: &'static str = "Application";
    const CREATE_STEP: &'static str = "create application";
    const UPDATE_STEP: &'static str = "updated application";
    const FOREIGN: ForeignPolicy = ForeignPolicy::Conflict;
    const BUMP_GENERATION_ON_FAILED_UPDATE: bool = true;

    fn target(pattern: &Pattern) -> Application {
        let name = pattern.name_any();
        let namespace = pattern.namespace().unwrap_or_default();
        let git = &pattern.spec.git_spec;
        let revision = git
            .target_revision
            .clone()
            .unwrap_or_else(|| DEFAULT_TARGET_REVISION.to_string());

        let sync_policy = pattern
            .spec
            .git_ops_spec
            .as_ref()
            .and_then(|gitops| gitops.sync_policy)
            .unwrap_or_default();

        let mut application = Application::new(
            &name,
            ApplicationSpec {
                source: ApplicationSource {
                    repo_url: git.target_repo.clone(),
                    target_revision: Some(revision),
                    path: Some(CLUSTER_GROUP_CHART_PATH.to_string()),
                    helm: Some(ApplicationSourceHelm {
                        value_files: value_files(pattern),
                        parameters: helm_parameters(pattern),
                    }),
                },
                destination: ApplicationDestination {
                    name: Some(IN_CLUSTER_DESTINATION.to_string()),
                    server: None,
                    namespace: Some(namespace.clone()),
                },
                project: ARGO_PROJECT.to_string(),
                // Kept present under manual sync so a switch only drops `automated`
                sync_policy: Some(SyncPolicy {
                    automated: (sync_policy == InstallMode::Automatic)
                        .then(SyncPolicyAutomated::default),
                }),
            },
        );
        application.metadata.namespace = Some(APPLICATION_NAMESPACE.to_string());
        application.metadata.labels = Some(BTreeMap::from([
            (PATTERN_LABEL.to_string(), name),
            (PATTERN_NAMESPACE_LABEL.to_string(), namespace),
        ]));
        application
    }

    fn owned_fields(object: &Application) -> Result<Value, Error> {
        Ok(serde_json::json!({ "spec": serde_json::to_value(&object.spec)? }))
    }

    fn store(backends: &Backends) -> &dyn ObjectStore<Application> {
        backends.applications.as_ref()
    }
}

fn cluster_group(pattern: &Pattern) -> &str {
    pattern
        .spec
        .cluster_group_name
        .as_deref()
        .unwrap_or(DEFAULT_CLUSTER_GROUP)
}

/// Global values first, then the cluster group's, then any extras
fn value_files(pattern: &Pattern) -> Vec<String> {
    let base = pattern
        .spec
        .git_spec
        .values_directory_url
        .as_deref()
        .unwrap_or_default()
        .trim_end_matches('/');

    let mut files = vec![
        format!("{base}/values-global.yaml"),
        format!("{base}/values-{}.yaml", cluster_group(pattern)),
    ];
    files.extend(pattern.spec.extra_value_files.iter().cloned());
    files
}

fn helm_parameters(pattern: &Pattern) -> Vec<HelmParameter> {
    let git = &pattern.spec.git_spec;
    let status = pattern.status.clone().unwrap_or_default();
    let cluster_domain = status.cluster_domain.unwrap_or_default();

    let mut parameters: Vec<HelmParameter> = [
        ("global.pattern", pattern.name_any()),
        ("global.namespace", pattern.namespace().unwrap_or_default()),
        (
            "global.valuesDirectoryURL",
            git.values_directory_url.clone().unwrap_or_default(),
        ),
        ("global.hubClusterDomain", cluster_domain.clone()),
        ("global.localClusterDomain", cluster_domain),
        ("global.repoURL", git.target_repo.clone()),
        (
            "global.targetRevision",
            git.target_revision
                .clone()
                .unwrap_or_else(|| DEFAULT_TARGET_REVISION.to_string()),
        ),
        ("clusterGroup.name", cluster_group(pattern).to_string()),
    ]
    .into_iter()
    .map(|(name, value)| HelmParameter {
        name: name.to_string(),
        value,
    })
    .collect();

    parameters.extend(pattern.spec.extra_parameters.iter().map(|p| HelmParameter {
        name: p.name.clone(),
        value: p.value.clone(),
    }));
    parameters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::reconciler::dependent::drift_patch;
    use crate::crd::{GitConfig, GitOpsConfig, PatternParameter, PatternSpec, PatternStatus};

    fn effective_pattern() -> Pattern {
        let mut pattern = Pattern::new(
            "industrial-edge",
            PatternSpec {
                cluster_group_name: Some("datacenter".to_string()),
                git_spec: GitConfig {
                    target_repo: "https://github.com/org/industrial-edge.git".to_string(),
                    target_revision: Some("main".to_string()),
                    hostname: Some("github.com".to_string()),
                    values_directory_url: Some(
                        "https://github.com/org/industrial-edge/raw/main/".to_string(),
                    ),
                },
                git_ops_spec: Some(GitOpsConfig {
                    sync_policy: Some(InstallMode::Automatic),
                    ..Default::default()
                }),
                extra_parameters: vec![PatternParameter {
                    name: "global.options.useCSV".to_string(),
                    value: "false".to_string(),
                }],
                extra_value_files: vec!["https://values.example/extra.yaml".to_string()],
                ..Default::default()
            },
        );
        pattern.metadata.namespace = Some("patterns".to_string());
        pattern.status = Some(PatternStatus {
            cluster_domain: Some("apps.hub.example.com".to_string()),
            ..Default::default()
        });
        pattern
    }

    fn parameter<'a>(app: &'a Application, name: &str) -> Option<&'a str> {
        app.spec
            .source
            .helm
            .as_ref()?
            .parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    #[test]
    fn test_target_shape() {
        let app = ApplicationKind::target(&effective_pattern());

        assert_eq!(app.name_any(), "industrial-edge");
        assert_eq!(app.namespace().as_deref(), Some("openshift-gitops"));
        assert_eq!(app.labels()[PATTERN_LABEL], "industrial-edge");
        assert_eq!(app.labels()[PATTERN_NAMESPACE_LABEL], "patterns");
        assert_eq!(app.spec.project, "default");
        assert_eq!(app.spec.source.path.as_deref(), Some("common/clustergroup"));
        assert_eq!(app.spec.destination.name.as_deref(), Some("in-cluster"));
        assert_eq!(app.spec.destination.namespace.as_deref(), Some("patterns"));
        assert!(app.spec.sync_policy.unwrap().automated.is_some());
    }

    #[test]
    fn test_value_files_order() {
        let app = ApplicationKind::target(&effective_pattern());
        let files = &app.spec.source.helm.as_ref().unwrap().value_files;
        assert_eq!(
            files,
            &vec![
                "https://github.com/org/industrial-edge/raw/main/values-global.yaml".to_string(),
                "https://github.com/org/industrial-edge/raw/main/values-datacenter.yaml"
                    .to_string(),
                "https://values.example/extra.yaml".to_string(),
            ]
        );
    }

    #[test]
    fn test_helm_parameters() {
        let app = ApplicationKind::target(&effective_pattern());
        assert_eq!(parameter(&app, "global.pattern"), Some("industrial-edge"));
        assert_eq!(parameter(&app, "global.namespace"), Some("patterns"));
        assert_eq!(
            parameter(&app, "global.hubClusterDomain"),
            Some("apps.hub.example.com")
        );
        assert_eq!(parameter(&app, "clusterGroup.name"), Some("datacenter"));
        assert_eq!(parameter(&app, "global.options.useCSV"), Some("false"));

        let names: Vec<&str> = app.spec.source.helm.as_ref().unwrap().parameters
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names.last(), Some(&"global.options.useCSV"));
    }

    #[test]
    fn test_manual_sync_has_no_automation() {
        let mut pattern = effective_pattern();
        pattern.spec.git_ops_spec = Some(GitOpsConfig {
            sync_policy: Some(InstallMode::Manual),
            ..Default::default()
        });
        let sync_policy = ApplicationKind::target(&pattern).spec.sync_policy.unwrap();
        assert!(sync_policy.automated.is_none());
    }

    #[test]
    fn test_drift_on_revision() {
        let target = ApplicationKind::target(&effective_pattern());
        let mut live = target.clone();
        live.metadata.resource_version = Some("12".to_string());
        assert_eq!(drift_patch::<ApplicationKind>(&target, &live).unwrap(), None);

        live.spec.source.target_revision = Some("v1.0".to_string());
        let patch = drift_patch::<ApplicationKind>(&target, &live)
            .unwrap()
            .unwrap();
        assert_eq!(
            patch,
            serde_json::json!({
                "metadata": { "resourceVersion": "12" },
                "spec": { "source": { "targetRevision": "main" } }
            })
        );
    }

    #[test]
    fn test_switch_to_manual_only_drops_automation() {
        let mut live = ApplicationKind::target(&effective_pattern());
        live.metadata.resource_version = Some("12".to_string());

        let mut manual = effective_pattern();
        manual.spec.git_ops_spec = Some(GitOpsConfig {
            sync_policy: Some(InstallMode::Manual),
            ..Default::default()
        });
        let target = ApplicationKind::target(&manual);

        let patch = drift_patch::<ApplicationKind>(&target, &live)
            .unwrap()
            .unwrap();
        assert_eq!(
            patch["spec"],
            serde_json::json!({ "syncPolicy": { "automated": null } })
        );
        assert!(patch.get("operation").is_none());
        assert!(patch.get("status").is_none());
    }
}
