//! # GitOps Operator Subscription
//!
//! OLM Subscription that installs the OpenShift GitOps operator. The
//! Subscription is cluster-wide in effect and may already have been created by
//! an administrator; one not owned by the Pattern is left alone.

use crate::constants::{
    APPLICATION_NAMESPACE, CATALOG_SOURCE_NAMESPACE, DEFAULT_OPERATOR_CHANNEL,
    DEFAULT_OPERATOR_CSV, DEFAULT_OPERATOR_SOURCE, PATTERN_LABEL, PATTERN_NAMESPACE_LABEL,
    SUBSCRIPTION_NAME, SUBSCRIPTION_NAMESPACE,
};
use crate::controller::reconciler::client::{Backends, ObjectStore};
use crate::controller::reconciler::dependent::{DependentKind, ForeignPolicy};
use crate::crd::{EnvVar, Pattern, Subscription, SubscriptionConfig, SubscriptionSpec};
use crate::error::Error;
use kube::ResourceExt;
use serde_json::Value;
use std::collections::BTreeMap;

/// Namespaces the GitOps operator's cluster-scoped Argo CD may manage
const CLUSTER_CONFIG_NAMESPACES_ENV: &str = "ARGOCD_CLUSTER_CONFIG_NAMESPACES";

#[derive(Debug)]
pub struct SubscriptionKind;

impl DependentKind for SubscriptionKind {
    type Object = Subscription;

    const KIND: &'static str = "Subscription";
    const CREATE_STEP: &'static str = "create gitops subscription";
    const UPDATE_STEP: &'static str = "update gitops subscription";
    const FOREIGN: ForeignPolicy = ForeignPolicy::Ignore;
    const BUMP_GENERATION_ON_FAILED_UPDATE: bool = false;

    fn target(pattern: &Pattern) -> Subscription {
        let gitops = pattern.spec.git_ops_spec.clone().unwrap_or_default();
        let csv = gitops
            .operator_csv
            .as_deref()
            .unwrap_or(DEFAULT_OPERATOR_CSV);

        let mut subscription = Subscription::new(
            SUBSCRIPTION_NAME,
            SubscriptionSpec {
                source: gitops
                    .operator_source
                    .unwrap_or_else(|| DEFAULT_OPERATOR_SOURCE.to_string()),
                source_namespace: CATALOG_SOURCE_NAMESPACE.to_string(),
                name: SUBSCRIPTION_NAME.to_string(),
                channel: Some(
                    gitops
                        .operator_channel
                        .unwrap_or_else(|| DEFAULT_OPERATOR_CHANNEL.to_string()),
                ),
                install_plan_approval: Some(
                    gitops
                        .install_plan_approval
                        .unwrap_or_default()
                        .as_str()
                        .to_string(),
                ),
                starting_csv: Some(format!("{SUBSCRIPTION_NAME}.{csv}")),
                config: Some(SubscriptionConfig {
                    env: vec![EnvVar {
                        name: CLUSTER_CONFIG_NAMESPACES_ENV.to_string(),
                        value: APPLICATION_NAMESPACE.to_string(),
                    }],
                }),
            },
        );
        subscription.metadata.namespace = Some(SUBSCRIPTION_NAMESPACE.to_string());
        subscription.metadata.labels = Some(BTreeMap::from([
            (PATTERN_LABEL.to_string(), pattern.name_any()),
            (
                PATTERN_NAMESPACE_LABEL.to_string(),
                pattern.namespace().unwrap_or_default(),
            ),
        ]));
        subscription
    }

    fn owned_fields(object: &Subscription) -> Result<Value, Error> {
        Ok(serde_json::json!({ "spec": serde_json::to_value(&object.spec)? }))
    }

    fn store(backends: &Backends) -> &dyn ObjectStore<Subscription> {
        backends.subscriptions.as_ref()
    }
}
