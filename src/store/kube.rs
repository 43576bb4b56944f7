//! Kubernetes-backed object store.

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use kube::api::PostParams;
use kube::{Api, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::apps::{DeploymentConfig, ImageStream};
use crate::crd::System;
use crate::error::SmoError;
use crate::store::ObjectStore;

/// Object store backed by the cluster API server.
#[derive(Clone)]
pub struct KubeStore {
    client: kube::Client,
}

impl KubeStore {
    pub const fn new(client: kube::Client) -> Self {
        Self { client }
    }

    async fn get_resource<K>(
        &self,
        kind: &'static str,
        namespace: &str,
        name: &str,
    ) -> Result<K, SmoError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + std::fmt::Debug,
    {
        debug!("Get {} {}/{}", kind, namespace, name);
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        api.get(name)
            .await
            .map_err(|e| SmoError::from_kube(kind, namespace, name, &e))
    }

    async fn create_resource<K>(&self, kind: &'static str, obj: &K) -> Result<(), SmoError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Serialize
            + DeserializeOwned
            + std::fmt::Debug,
    {
        let namespace = obj.namespace().unwrap_or_default();
        let name = obj.name_any();
        debug!("Create {} {}/{}", kind, namespace, name);
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);
        api.create(&PostParams::default(), obj)
            .await
            .map(|_| ())
            .map_err(|e| SmoError::from_kube(kind, &namespace, &name, &e))
    }

    async fn replace_resource<K>(&self, kind: &'static str, obj: &K) -> Result<(), SmoError>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + Serialize
            + DeserializeOwned
            + std::fmt::Debug,
    {
        let namespace = obj.namespace().unwrap_or_default();
        let name = obj.name_any();
        debug!("Update {} {}/{}", kind, namespace, name);
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);
        api.replace(&name, &PostParams::default(), obj)
            .await
            .map(|_| ())
            .map_err(|e| SmoError::from_kube(kind, &namespace, &name, &e))
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn update_system(&self, system: &System) -> Result<(), SmoError> {
        self.replace_resource("System", system).await
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap, SmoError> {
        self.get_resource("ConfigMap", namespace, name).await
    }

    async fn update_config_map(&self, config_map: &ConfigMap) -> Result<(), SmoError> {
        self.replace_resource("ConfigMap", config_map).await
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, SmoError> {
        self.get_resource("Secret", namespace, name).await
    }

    async fn create_secret(&self, secret: &Secret) -> Result<(), SmoError> {
        self.create_resource("Secret", secret).await
    }

    async fn update_secret(&self, secret: &Secret) -> Result<(), SmoError> {
        self.replace_resource("Secret", secret).await
    }

    async fn get_workload(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<DeploymentConfig, SmoError> {
        self.get_resource("DeploymentConfig", namespace, name).await
    }

    async fn update_workload(&self, workload: &DeploymentConfig) -> Result<(), SmoError> {
        self.replace_resource("DeploymentConfig", workload).await
    }

    async fn get_image_stream(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ImageStream, SmoError> {
        self.get_resource("ImageStream", namespace, name).await
    }

    async fn create_image_stream(&self, stream: &ImageStream) -> Result<(), SmoError> {
        self.create_resource("ImageStream", stream).await
    }

    async fn update_image_stream(&self, stream: &ImageStream) -> Result<(), SmoError> {
        self.replace_resource("ImageStream", stream).await
    }
}
