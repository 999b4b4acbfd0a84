//! Common test utilities for reconcile integration tests
//!
//! In-memory stand-ins for every seam the reconciler talks to. Stores keep a
//! write log so tests can assert exactly which writes a pass performed.

#![allow(dead_code, reason = "Not every test binary uses every helper")]

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};
use patterns_operator::config::ControllerConfig;
use patterns_operator::constants::PATTERN_FINALIZER;
use patterns_operator::controller::reconciler::{
    Backends, ClusterFacts, NamespaceLookup, ObjectStore, PatternStore, Reconciler,
};
use patterns_operator::crd::{Application, GitConfig, Pattern, PatternSpec, Subscription};
use patterns_operator::error::Error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const PATTERN_NAME: &str = "industrial-edge";
pub const PATTERN_NAMESPACE: &str = "patterns";
pub const PATTERN_UID: &str = "5c1d7a4e-pattern";

pub fn api_error(code: u16, message: &str) -> Error {
    Error::Kube(kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_string(),
        message: message.to_string(),
        reason: "Test".to_string(),
        code,
    }))
}

/// One recorded write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Create(String),
    Update(String),
    Patch(String),
    Status(String),
}

/// RFC 7386 merge of `patch` into `target`
pub fn apply_merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Value::Object(fields) = target else {
        unreachable!()
    };
    for (key, value) in patch {
        if value.is_null() {
            fields.remove(key);
        } else {
            apply_merge_patch(fields.entry(key.clone()).or_insert(Value::Null), value);
        }
    }
}

/// Namespaced object store held in memory.
///
/// Objects are kept as raw JSON, the way the API server keeps them, so fields
/// the typed structs do not model survive unless a write removes them.
pub struct MemoryStore<K> {
    objects: Mutex<BTreeMap<(String, String), Value>>,
    writes: Mutex<Vec<Write>>,
    revision: Mutex<u64>,
    pub fail_fetch: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_status: AtomicBool,
    kind: PhantomData<fn() -> K>,
}

impl<K> Default for MemoryStore<K> {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            writes: Mutex::new(Vec::new()),
            revision: Mutex::new(0),
            fail_fetch: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_status: AtomicBool::new(false),
            kind: PhantomData,
        }
    }
}

fn key(namespace: &str, name: &str) -> (String, String) {
    (namespace.to_string(), name.to_string())
}

impl<K: Resource + Serialize + DeserializeOwned> MemoryStore<K> {
    fn key_of(object: &K) -> (String, String) {
        (object.namespace().unwrap_or_default(), object.name_any())
    }

    fn next_revision(&self) -> String {
        let mut revision = self.revision.lock().unwrap();
        *revision += 1;
        revision.to_string()
    }

    fn stamp(&self, raw: &mut Value) -> String {
        let revision = self.next_revision();
        apply_merge_patch(raw, &json!({ "metadata": { "resourceVersion": revision } }));
        revision
    }

    fn decode(raw: &Value) -> K {
        serde_json::from_value(raw.clone()).unwrap()
    }

    /// Put an object in place without recording a write
    pub fn seed(&self, object: K) {
        let mut raw = serde_json::to_value(&object).unwrap();
        self.stamp(&mut raw);
        self.objects
            .lock()
            .unwrap()
            .insert(Self::key_of(&object), raw);
    }

    pub fn get(&self, namespace: &str, name: &str) -> Option<K> {
        self.raw(namespace, name).as_ref().map(Self::decode)
    }

    /// The stored JSON, including fields `K` does not model
    pub fn raw(&self, namespace: &str, name: &str) -> Option<Value> {
        self.objects
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned()
    }

    /// Change a stored object as another writer would, bumping its version
    pub fn edit_raw(&self, namespace: &str, name: &str, edit: impl FnOnce(&mut Value)) {
        let mut objects = self.objects.lock().unwrap();
        let raw = objects.get_mut(&key(namespace, name)).unwrap();
        edit(raw);
        self.stamp(raw);
    }

    pub fn only(&self) -> K {
        let objects = self.objects.lock().unwrap();
        assert_eq!(objects.len(), 1, "expected exactly one object");
        Self::decode(objects.values().next().unwrap())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn writes(&self) -> Vec<Write> {
        self.writes.lock().unwrap().clone()
    }

    pub fn clear_writes(&self) {
        self.writes.lock().unwrap().clear();
    }

    fn record(&self, write: Write) {
        self.writes.lock().unwrap().push(write);
    }
}

fn resource_version(raw: &Value) -> Option<&str> {
    raw.pointer("/metadata/resourceVersion")
        .and_then(Value::as_str)
}

#[async_trait]
impl<K> ObjectStore<K> for MemoryStore<K>
where
    K: Resource + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch(&self, namespace: &str, name: &str) -> Result<Option<K>, Error> {
        if self.fail_fetch.load(Ordering::Relaxed) {
            return Err(api_error(500, "fetch refused"));
        }
        Ok(self.get(namespace, name))
    }

    async fn create(&self, object: &K) -> Result<K, Error> {
        if self.fail_create.load(Ordering::Relaxed) {
            return Err(api_error(403, "create forbidden"));
        }
        let key = Self::key_of(object);
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&key) {
            return Err(api_error(409, "already exists"));
        }
        let mut raw = serde_json::to_value(object).unwrap();
        self.stamp(&mut raw);
        self.record(Write::Create(key.1.clone()));
        let created = Self::decode(&raw);
        objects.insert(key, raw);
        Ok(created)
    }

    /// Whole-object replace; `status` is a subresource and is kept
    async fn update(&self, object: &K) -> Result<K, Error> {
        if self.fail_update.load(Ordering::Relaxed) {
            return Err(api_error(409, "the object has been modified"));
        }
        let key = Self::key_of(object);
        let mut objects = self.objects.lock().unwrap();
        let current = objects
            .get(&key)
            .ok_or_else(|| api_error(404, "not found"))?;
        if resource_version(current) != object.meta().resource_version.as_deref() {
            return Err(api_error(409, "the object has been modified"));
        }
        let mut raw = serde_json::to_value(object).unwrap();
        if let (Some(fields), Some(status)) = (raw.as_object_mut(), current.get("status")) {
            fields.insert("status".to_string(), status.clone());
        }
        self.stamp(&mut raw);
        self.record(Write::Update(key.1.clone()));
        let updated = Self::decode(&raw);
        objects.insert(key, raw);
        Ok(updated)
    }

    async fn merge_patch(&self, namespace: &str, name: &str, patch: &Value) -> Result<K, Error> {
        if self.fail_update.load(Ordering::Relaxed) {
            return Err(api_error(409, "the object has been modified"));
        }
        let mut objects = self.objects.lock().unwrap();
        let raw = objects
            .get_mut(&key(namespace, name))
            .ok_or_else(|| api_error(404, "not found"))?;
        if let Some(expected) = resource_version(patch) {
            if resource_version(raw) != Some(expected) {
                return Err(api_error(409, "the object has been modified"));
            }
        }
        apply_merge_patch(raw, patch);
        self.stamp(raw);
        self.record(Write::Patch(name.to_string()));
        Ok(Self::decode(raw))
    }
}

#[async_trait]
impl PatternStore for MemoryStore<Pattern> {
    async fn update_status(&self, pattern: &Pattern) -> Result<Pattern, Error> {
        if self.fail_status.load(Ordering::Relaxed) {
            return Err(api_error(500, "status refused"));
        }
        let key = Self::key_of(pattern);
        let mut objects = self.objects.lock().unwrap();
        let raw = objects
            .get_mut(&key)
            .ok_or_else(|| api_error(404, "not found"))?;
        apply_merge_patch(raw, &json!({ "status": pattern.status }));
        self.stamp(raw);
        self.record(Write::Status(key.1.clone()));
        Ok(Self::decode(raw))
    }
}

/// Namespace lookup answering from a fixed set
#[derive(Default)]
pub struct FakeNamespaces {
    present: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl FakeNamespaces {
    pub fn add(&self, name: &str) {
        self.present.lock().unwrap().push(name.to_string());
    }
}

#[async_trait]
impl NamespaceLookup for FakeNamespaces {
    async fn namespace_exists(&self, name: &str) -> Result<bool, Error> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(api_error(500, "namespace lookup refused"));
        }
        Ok(self.present.lock().unwrap().iter().any(|n| n == name))
    }
}

/// Cluster facts with switchable answers
pub struct FakeClusterFacts {
    pub cluster_id: Mutex<Result<String, String>>,
    pub ingress_domain: Mutex<Result<String, String>>,
}

impl Default for FakeClusterFacts {
    fn default() -> Self {
        Self {
            cluster_id: Mutex::new(Ok("c0ffee-1234".to_string())),
            ingress_domain: Mutex::new(Ok("apps.hub.example.com".to_string())),
        }
    }
}

#[async_trait]
impl ClusterFacts for FakeClusterFacts {
    async fn cluster_id(&self) -> Result<String, Error> {
        self.cluster_id
            .lock()
            .unwrap()
            .clone()
            .map_err(|reason| Error::ClusterFact {
                resource: "ClusterVersion",
                reason,
            })
    }

    async fn ingress_domain(&self) -> Result<String, Error> {
        self.ingress_domain
            .lock()
            .unwrap()
            .clone()
            .map_err(|reason| Error::ClusterFact {
                resource: "Ingress",
                reason,
            })
    }
}

/// A reconciler wired to in-memory backends, with handles on each
pub struct Harness {
    pub patterns: Arc<MemoryStore<Pattern>>,
    pub subscriptions: Arc<MemoryStore<Subscription>>,
    pub applications: Arc<MemoryStore<Application>>,
    pub namespaces: Arc<FakeNamespaces>,
    pub facts: Arc<FakeClusterFacts>,
    pub reconciler: Reconciler,
}

impl Harness {
    pub fn new() -> Self {
        let patterns = Arc::new(MemoryStore::<Pattern>::default());
        let subscriptions = Arc::new(MemoryStore::<Subscription>::default());
        let applications = Arc::new(MemoryStore::<Application>::default());
        let namespaces = Arc::new(FakeNamespaces::default());
        let facts = Arc::new(FakeClusterFacts::default());

        let backends = Backends {
            patterns: Arc::clone(&patterns) as Arc<dyn PatternStore>,
            subscriptions: Arc::clone(&subscriptions) as Arc<dyn ObjectStore<Subscription>>,
            applications: Arc::clone(&applications) as Arc<dyn ObjectStore<Application>>,
            namespaces: Arc::clone(&namespaces) as Arc<dyn NamespaceLookup>,
            cluster_facts: Arc::clone(&facts) as Arc<dyn ClusterFacts>,
        };
        let reconciler = Reconciler::new(backends, ControllerConfig::default());

        Self {
            patterns,
            subscriptions,
            applications,
            namespaces,
            facts,
            reconciler,
        }
    }

    pub fn pattern(&self) -> Pattern {
        self.patterns.get(PATTERN_NAMESPACE, PATTERN_NAME).unwrap()
    }

    pub fn clear_writes(&self) {
        self.patterns.clear_writes();
        self.subscriptions.clear_writes();
        self.applications.clear_writes();
    }
}

/// A fresh Pattern as a user would apply it
pub fn user_pattern(target_repo: &str) -> Pattern {
    let mut pattern = Pattern::new(
        PATTERN_NAME,
        PatternSpec {
            git_spec: GitConfig {
                target_repo: target_repo.to_string(),
                ..Default::default()
            },
            ..Default::default()
        },
    );
    pattern.metadata.namespace = Some(PATTERN_NAMESPACE.to_string());
    pattern.metadata.uid = Some(PATTERN_UID.to_string());
    pattern
}

/// A Pattern that already carries the finalizer marker
pub fn marked_pattern(target_repo: &str) -> Pattern {
    let mut pattern = user_pattern(target_repo);
    pattern.metadata.finalizers = Some(vec![PATTERN_FINALIZER.to_string()]);
    pattern
}

/// Mark `pattern` as being deleted
pub fn deleting(mut pattern: Pattern) -> Pattern {
    pattern.metadata.deletion_timestamp =
        Some(serde_json::from_value(serde_json::json!("2026-10-16T08:00:00Z")).unwrap());
    pattern
}

/// Owner reference pointing at some other controller
pub fn foreign_owner() -> OwnerReference {
    OwnerReference {
        api_version: "example.com/v1".to_string(),
        kind: "Other".to_string(),
        name: "someone-else".to_string(),
        uid: "not-our-uid".to_string(),
        controller: Some(true),
        block_owner_deletion: None,
    }
}
