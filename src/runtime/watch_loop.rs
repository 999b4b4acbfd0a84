//! # Watch Loop
//!
//! Runs the kube-runtime `Controller` over Patterns.
//!
//! Subscriptions and Applications live in fixed namespaces, away from the
//! Pattern that owns them, so `owns()` cannot map them back. They carry the
//! owning Pattern's name and namespace as labels instead, and changes to them
//! are routed through `watches()`.

use crate::constants::{
    APPLICATION_NAMESPACE, PATTERN_LABEL, PATTERN_NAMESPACE_LABEL, SUBSCRIPTION_NAMESPACE,
};
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::{Application, Pattern, Subscription};
use crate::runtime::error_policy::handle_reconciliation_error;
use futures::StreamExt;
use kube::api::Api;
use kube::{Client, ResourceExt};
use kube_runtime::controller::Config as ControllerSettings;
use kube_runtime::reflector::ObjectRef;
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Pattern that labelled a dependent, if the labels are intact
pub fn owning_pattern<K: ResourceExt>(object: &K) -> Option<ObjectRef<Pattern>> {
    let labels = object.labels();
    let name = labels.get(PATTERN_LABEL)?;
    let namespace = labels.get(PATTERN_NAMESPACE_LABEL)?;
    Some(ObjectRef::new(name).within(namespace))
}

/// Run the controller until a shutdown signal arrives
pub async fn run_watch_loop(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let patterns: Api<Pattern> = Api::all(client.clone());
    let subscriptions: Api<Subscription> = Api::namespaced(client.clone(), SUBSCRIPTION_NAMESPACE);
    let applications: Api<Application> = Api::namespaced(client, APPLICATION_NAMESPACE);

    let dependents = watcher::Config::default().labels(PATTERN_LABEL);
    let settings = ControllerSettings::default()
        .concurrency(u16::try_from(reconciler.config.max_concurrent_reconciliations).unwrap_or(u16::MAX));

    let watch_span = tracing::info_span!("controller.watch", operation = "watch_loop");
    watch_span.in_scope(|| info!("Starting controller watch loop..."));

    Controller::new(patterns, watcher::Config::default().any_semantic())
        .with_config(settings)
        .watches(subscriptions, dependents.clone(), |sub| owning_pattern(&sub))
        .watches(applications, dependents, |app| owning_pattern(&app))
        .shutdown_on_signal()
        .run(reconcile, handle_reconciliation_error, reconciler)
        .for_each(|result| async move {
            match result {
                Ok((object, action)) => {
                    debug!(pattern = %object, ?action, "watch.event.success");
                }
                Err(e) => warn!("Controller stream error: {}", e),
            }
        })
        .instrument(watch_span)
        .await;

    server_state.set_ready(false);
    info!("Controller stopped gracefully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::ApplicationSpec;
    use std::collections::BTreeMap;
    use std::future::Future;

    /// Fails to compile if the loop holds a non-`Send` value, such as an
    /// entered span guard, across an await
    #[allow(dead_code, reason = "compile-time check only")]
    fn watch_loop_future_is_send(
        client: Client,
        reconciler: Arc<Reconciler>,
        server_state: Arc<ServerState>,
    ) -> impl Future<Output = Result<(), anyhow::Error>> + Send {
        run_watch_loop(client, reconciler, server_state)
    }

    #[test]
    fn test_owning_pattern_from_labels() {
        let mut app = Application::new("industrial-edge", ApplicationSpec::default());
        app.metadata.labels = Some(BTreeMap::from([
            (PATTERN_LABEL.to_string(), "industrial-edge".to_string()),
            (PATTERN_NAMESPACE_LABEL.to_string(), "patterns".to_string()),
        ]));

        let owner = owning_pattern(&app).unwrap();
        assert_eq!(owner.name, "industrial-edge");
        assert_eq!(owner.namespace.as_deref(), Some("patterns"));
    }

    #[test]
    fn test_unlabelled_dependent_maps_nowhere() {
        let app = Application::new("stray", ApplicationSpec::default());
        assert!(owning_pattern(&app).is_none());
    }
}
