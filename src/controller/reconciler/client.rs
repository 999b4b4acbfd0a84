//! # API Seams
//!
//! Traits the reconciler talks to instead of a raw `kube::Client`, plus their
//! Kubernetes-backed implementations. Tests swap in in-memory stores and
//! mocked cluster facts.

use crate::crd::{Application, Pattern, Subscription};
use crate::error::Error;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{
    Api, ApiResource, DynamicObject, GroupVersionKind, Patch, PatchParams, PostParams,
};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

/// Namespaced object access by deterministic name
#[async_trait]
pub trait ObjectStore<K>: Send + Sync {
    /// `Ok(None)` when the object does not exist
    async fn fetch(&self, namespace: &str, name: &str) -> Result<Option<K>, Error>;

    async fn create(&self, object: &K) -> Result<K, Error>;

    /// Replace the whole object; the caller's `resourceVersion` guards the write
    async fn update(&self, object: &K) -> Result<K, Error>;

    /// JSON merge patch (RFC 7386). Fields the patch leaves out are kept as
    /// they are on the server; a `metadata.resourceVersion` in the patch
    /// guards the write.
    async fn merge_patch(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<K, Error>;
}

/// Pattern access, including the status subresource
#[async_trait]
pub trait PatternStore: ObjectStore<Pattern> {
    async fn update_status(&self, pattern: &Pattern) -> Result<Pattern, Error>;
}

#[async_trait]
pub trait NamespaceLookup: Send + Sync {
    async fn namespace_exists(&self, name: &str) -> Result<bool, Error>;
}

/// Live facts about the cluster the controller runs in
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterFacts: Send + Sync {
    /// `spec.clusterID` of ClusterVersion `version`
    async fn cluster_id(&self) -> Result<String, Error>;

    /// `spec.domain` of the cluster Ingress config
    async fn ingress_domain(&self) -> Result<String, Error>;
}

/// Every backend the reconciler needs, shared across invocations
#[derive(Clone)]
pub struct Backends {
    pub patterns: Arc<dyn PatternStore>,
    pub subscriptions: Arc<dyn ObjectStore<Subscription>>,
    pub applications: Arc<dyn ObjectStore<Application>>,
    pub namespaces: Arc<dyn NamespaceLookup>,
    pub cluster_facts: Arc<dyn ClusterFacts>,
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends").finish_non_exhaustive()
    }
}

impl Backends {
    /// Wire every seam to the API server behind `client`
    #[must_use]
    pub fn kube(client: Client, field_manager: &str) -> Self {
        let store = Arc::new(KubeStore::new(client.clone(), field_manager));
        Self {
            patterns: Arc::clone(&store) as Arc<dyn PatternStore>,
            subscriptions: Arc::clone(&store) as Arc<dyn ObjectStore<Subscription>>,
            applications: Arc::clone(&store) as Arc<dyn ObjectStore<Application>>,
            namespaces: store,
            cluster_facts: Arc::new(KubeClusterFacts::new(client)),
        }
    }
}

/// Store backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
    field_manager: String,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore")
            .field("field_manager", &self.field_manager)
            .finish_non_exhaustive()
    }
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client, field_manager: &str) -> Self {
        Self {
            client,
            field_manager: field_manager.to_string(),
        }
    }

    fn post_params(&self) -> PostParams {
        PostParams {
            dry_run: false,
            field_manager: Some(self.field_manager.clone()),
        }
    }

    fn patch_params(&self) -> PatchParams {
        PatchParams {
            field_manager: Some(self.field_manager.clone()),
            ..PatchParams::default()
        }
    }
}

/// Namespace and name of an object about to be written
fn identity<K: Resource>(object: &K) -> Result<(&str, &str), Error> {
    let meta = object.meta();
    match (meta.namespace.as_deref(), meta.name.as_deref()) {
        (Some(namespace), Some(name)) => Ok((namespace, name)),
        _ => Err(Error::MissingIdentity),
    }
}

#[async_trait]
impl<K> ObjectStore<K> for KubeStore
where
    K: Resource<Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static,
    K::DynamicType: Default,
{
    async fn fetch(&self, namespace: &str, name: &str) -> Result<Option<K>, Error> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn create(&self, object: &K) -> Result<K, Error> {
        let (namespace, _) = identity(object)?;
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.create(&self.post_params(), object).await?)
    }

    async fn update(&self, object: &K) -> Result<K, Error> {
        let (namespace, name) = identity(object)?;
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.replace(name, &self.post_params(), object).await?)
    }

    async fn merge_patch(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<K, Error> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        Ok(api
            .patch(name, &self.patch_params(), &Patch::Merge(patch))
            .await?)
    }
}

#[async_trait]
impl PatternStore for KubeStore {
    async fn update_status(&self, pattern: &Pattern) -> Result<Pattern, Error> {
        let (namespace, name) = identity(pattern)?;
        let api: Api<Pattern> = Api::namespaced(self.client.clone(), namespace);

        let status_patch = serde_json::json!({
            "status": pattern.status
        });

        Ok(api
            .patch_status(name, &self.patch_params(), &Patch::Merge(&status_patch))
            .await?)
    }
}

#[async_trait]
impl NamespaceLookup for KubeStore {
    async fn namespace_exists(&self, name: &str) -> Result<bool, Error> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        Ok(api.get_opt(name).await?.is_some())
    }
}

/// Reads OpenShift `config.openshift.io/v1` singletons through the dynamic API
#[derive(Clone)]
pub struct KubeClusterFacts {
    client: Client,
}

impl std::fmt::Debug for KubeClusterFacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterFacts").finish_non_exhaustive()
    }
}

impl KubeClusterFacts {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn spec_field(
        &self,
        kind: &'static str,
        plural: &str,
        name: &str,
        field: &str,
    ) -> Result<String, Error> {
        let gvk = GroupVersionKind::gvk("config.openshift.io", "v1", kind);
        let resource = ApiResource::from_gvk_with_plural(&gvk, plural);
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);

        let object = api
            .get(name)
            .await
            .map_err(|e| Error::cluster_fact(kind, e.to_string()))?;

        object
            .data
            .get("spec")
            .and_then(|spec| spec.get(field))
            .and_then(serde_json::Value::as_str)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| Error::cluster_fact(kind, format!("spec.{field} is not set")))
    }
}

#[async_trait]
impl ClusterFacts for KubeClusterFacts {
    async fn cluster_id(&self) -> Result<String, Error> {
        self.spec_field("ClusterVersion", "clusterversions", "version", "clusterID")
            .await
    }

    async fn ingress_domain(&self) -> Result<String, Error> {
        self.spec_field("Ingress", "ingresses", "cluster", "domain")
            .await
    }
}
