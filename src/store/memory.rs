//! In-memory object store used by the migration tests.
//!
//! Stores objects as JSON values keyed by (kind, namespace, name), bumps a
//! resource version on every write and rejects stale replaces, and keeps an
//! operation log so tests can assert exactly which remote calls a pipeline
//! pass performed.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::ResourceExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::apps::{DeploymentConfig, ImageStream};
use crate::crd::System;
use crate::error::SmoError;
use crate::store::ObjectStore;

type Key = (&'static str, String, String);

struct Stored {
    version: u64,
    value: Value,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<Key, Stored>,
    ops: Vec<String>,
    next_version: u64,
}

/// Instrumented in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object without recording an operation.
    pub fn seed<T: Serialize>(&self, kind: &'static str, namespace: &str, name: &str, obj: &T) {
        let mut inner = self.inner.lock().unwrap();
        inner.next_version += 1;
        let version = inner.next_version;
        inner.objects.insert(
            (kind, namespace.to_string(), name.to_string()),
            Stored {
                version,
                value: serde_json::to_value(obj).unwrap(),
            },
        );
    }

    pub fn seed_system(&self, system: &System) {
        self.seed(
            "System",
            &system.namespace().unwrap_or_default(),
            &system.name_any(),
            system,
        );
    }

    pub fn seed_config_map(&self, config_map: &ConfigMap) {
        self.seed(
            "ConfigMap",
            &config_map.namespace().unwrap_or_default(),
            &config_map.name_any(),
            config_map,
        );
    }

    pub fn seed_secret(&self, secret: &Secret) {
        self.seed(
            "Secret",
            &secret.namespace().unwrap_or_default(),
            &secret.name_any(),
            secret,
        );
    }

    pub fn seed_workload(&self, workload: &DeploymentConfig) {
        self.seed(
            "DeploymentConfig",
            &workload.namespace().unwrap_or_default(),
            &workload.name_any(),
            workload,
        );
    }

    pub fn seed_image_stream(&self, stream: &ImageStream) {
        self.seed(
            "ImageStream",
            &stream.namespace().unwrap_or_default(),
            &stream.name_any(),
            stream,
        );
    }

    /// Fetch an object for inspection without recording an operation.
    pub fn peek<T: DeserializeOwned>(
        &self,
        kind: &'static str,
        namespace: &str,
        name: &str,
    ) -> Option<T> {
        let inner = self.inner.lock().unwrap();
        inner
            .objects
            .get(&(kind, namespace.to_string(), name.to_string()))
            .map(|stored| serde_json::from_value(stored.value.clone()).unwrap())
    }

    /// The full operation log, e.g. `["get ConfigMap/smtp", "create Secret/system-smtp"]`.
    pub fn ops(&self) -> Vec<String> {
        self.inner.lock().unwrap().ops.clone()
    }

    /// Number of write operations (creates and updates) recorded so far.
    pub fn writes(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .ops
            .iter()
            .filter(|op| op.starts_with("create ") || op.starts_with("update "))
            .count()
    }

    /// Clear the operation log, keeping the stored objects.
    pub fn reset_ops(&self) {
        self.inner.lock().unwrap().ops.clear();
    }

    fn get_value(
        &self,
        kind: &'static str,
        namespace: &str,
        name: &str,
    ) -> Result<Value, SmoError> {
        let mut inner = self.inner.lock().unwrap();
        inner.ops.push(format!("get {kind}/{name}"));
        let stored = inner
            .objects
            .get(&(kind, namespace.to_string(), name.to_string()))
            .ok_or_else(|| SmoError::NotFound {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;
        let mut value = stored.value.clone();
        set_resource_version(&mut value, stored.version);
        Ok(value)
    }

    fn create_value(
        &self,
        kind: &'static str,
        namespace: &str,
        name: &str,
        value: Value,
    ) -> Result<(), SmoError> {
        let value = normalize(kind, value)?;
        let mut inner = self.inner.lock().unwrap();
        inner.ops.push(format!("create {kind}/{name}"));
        let key = (kind, namespace.to_string(), name.to_string());
        if inner.objects.contains_key(&key) {
            return Err(SmoError::AlreadyExists {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }
        inner.next_version += 1;
        let version = inner.next_version;
        inner.objects.insert(key, Stored { version, value });
        Ok(())
    }

    fn update_value(
        &self,
        kind: &'static str,
        namespace: &str,
        name: &str,
        value: Value,
    ) -> Result<(), SmoError> {
        let value = normalize(kind, value)?;
        let mut inner = self.inner.lock().unwrap();
        inner.ops.push(format!("update {kind}/{name}"));
        let key = (kind, namespace.to_string(), name.to_string());
        let current = inner.objects.get(&key).ok_or_else(|| SmoError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        })?;

        // Optimistic concurrency: a provided resource version must match.
        if let Some(provided) = resource_version(&value)
            && provided != current.version.to_string()
        {
            return Err(SmoError::Conflict {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            });
        }

        inner.next_version += 1;
        let version = inner.next_version;
        inner.objects.insert(key, Stored { version, value });
        Ok(())
    }

    fn get_obj<T: DeserializeOwned>(
        &self,
        kind: &'static str,
        namespace: &str,
        name: &str,
    ) -> Result<T, SmoError> {
        let value = self.get_value(kind, namespace, name)?;
        serde_json::from_value(value).map_err(|e| SmoError::Api(e.to_string()))
    }

    fn to_value<T: Serialize>(obj: &T) -> Result<Value, SmoError> {
        serde_json::to_value(obj).map_err(|e| SmoError::Api(e.to_string()))
    }
}

/// Emulate the API server's secret admission: `stringData` entries are
/// merged over `data` on every write and the field itself is dropped.
fn normalize(kind: &'static str, value: Value) -> Result<Value, SmoError> {
    if kind != "Secret" {
        return Ok(value);
    }
    let mut secret: Secret =
        serde_json::from_value(value).map_err(|e| SmoError::Api(e.to_string()))?;
    if let Some(string_data) = secret.string_data.take() {
        let data = secret.data.get_or_insert_with(Default::default);
        for (key, plaintext) in string_data {
            data.insert(key, k8s_openapi::ByteString(plaintext.into_bytes()));
        }
    }
    serde_json::to_value(secret).map_err(|e| SmoError::Api(e.to_string()))
}

fn resource_version(value: &Value) -> Option<String> {
    value
        .get("metadata")
        .and_then(|m| m.get("resourceVersion"))
        .and_then(Value::as_str)
        .map(String::from)
}

fn set_resource_version(value: &mut Value, version: u64) {
    if let Some(meta) = value.get_mut("metadata").and_then(Value::as_object_mut) {
        meta.insert(
            "resourceVersion".to_string(),
            Value::String(version.to_string()),
        );
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn update_system(&self, system: &System) -> Result<(), SmoError> {
        self.update_value(
            "System",
            &system.namespace().unwrap_or_default(),
            &system.name_any(),
            Self::to_value(system)?,
        )
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap, SmoError> {
        self.get_obj("ConfigMap", namespace, name)
    }

    async fn update_config_map(&self, config_map: &ConfigMap) -> Result<(), SmoError> {
        self.update_value(
            "ConfigMap",
            &config_map.namespace().unwrap_or_default(),
            &config_map.name_any(),
            Self::to_value(config_map)?,
        )
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, SmoError> {
        self.get_obj("Secret", namespace, name)
    }

    async fn create_secret(&self, secret: &Secret) -> Result<(), SmoError> {
        self.create_value(
            "Secret",
            &secret.namespace().unwrap_or_default(),
            &secret.name_any(),
            Self::to_value(secret)?,
        )
    }

    async fn update_secret(&self, secret: &Secret) -> Result<(), SmoError> {
        self.update_value(
            "Secret",
            &secret.namespace().unwrap_or_default(),
            &secret.name_any(),
            Self::to_value(secret)?,
        )
    }

    async fn get_workload(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<DeploymentConfig, SmoError> {
        self.get_obj("DeploymentConfig", namespace, name)
    }

    async fn update_workload(&self, workload: &DeploymentConfig) -> Result<(), SmoError> {
        self.update_value(
            "DeploymentConfig",
            &workload.namespace().unwrap_or_default(),
            &workload.name_any(),
            Self::to_value(workload)?,
        )
    }

    async fn get_image_stream(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ImageStream, SmoError> {
        self.get_obj("ImageStream", namespace, name)
    }

    async fn create_image_stream(&self, stream: &ImageStream) -> Result<(), SmoError> {
        self.create_value(
            "ImageStream",
            &stream.namespace().unwrap_or_default(),
            &stream.name_any(),
            Self::to_value(stream)?,
        )
    }

    async fn update_image_stream(&self, stream: &ImageStream) -> Result<(), SmoError> {
        self.update_value(
            "ImageStream",
            &stream.namespace().unwrap_or_default(),
            &stream.name_any(),
            Self::to_value(stream)?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn config_map(namespace: &str, name: &str) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get_config_map("prod", "smtp").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.ops(), vec!["get ConfigMap/smtp"]);
    }

    #[tokio::test]
    async fn test_seed_then_get() {
        let store = MemoryStore::new();
        store.seed_config_map(&config_map("prod", "smtp"));
        let cm = store.get_config_map("prod", "smtp").await.unwrap();
        assert_eq!(cm.metadata.name.as_deref(), Some("smtp"));
        assert!(cm.metadata.resource_version.is_some());
    }

    #[tokio::test]
    async fn test_create_twice_is_already_exists() {
        let store = MemoryStore::new();
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("system-smtp".to_string()),
                namespace: Some("prod".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        store.create_secret(&secret).await.unwrap();
        let err = store.create_secret(&secret).await.unwrap_err();
        assert!(matches!(err, SmoError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let store = MemoryStore::new();
        store.seed_config_map(&config_map("prod", "smtp"));

        // Two readers fetch the same version.
        let first = store.get_config_map("prod", "smtp").await.unwrap();
        let second = store.get_config_map("prod", "smtp").await.unwrap();

        store.update_config_map(&first).await.unwrap();
        let err = store.update_config_map(&second).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .update_config_map(&config_map("prod", "smtp"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_secret_string_data_merges_into_data_on_write() {
        let store = MemoryStore::new();
        let mut secret = Secret {
            metadata: ObjectMeta {
                name: Some("aws-auth".to_string()),
                namespace: Some("prod".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut string_data = std::collections::BTreeMap::new();
        string_data.insert("AWS_BUCKET".to_string(), "uploads".to_string());
        secret.string_data = Some(string_data);

        store.create_secret(&secret).await.unwrap();
        let stored = store.get_secret("prod", "aws-auth").await.unwrap();
        assert!(stored.string_data.is_none());
        assert_eq!(
            stored.data.unwrap().get("AWS_BUCKET").unwrap().0,
            b"uploads"
        );
    }

    #[tokio::test]
    async fn test_write_counting() {
        let store = MemoryStore::new();
        store.seed_config_map(&config_map("prod", "smtp"));
        let cm = store.get_config_map("prod", "smtp").await.unwrap();
        store.update_config_map(&cm).await.unwrap();
        assert_eq!(store.writes(), 1);
        store.reset_ops();
        assert_eq!(store.writes(), 0);
        assert!(store.ops().is_empty());
    }
}
