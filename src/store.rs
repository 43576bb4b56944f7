//! Remote object store consumed by the migration pipeline.
//!
//! The pipeline only ever performs point lookups, full-object creates and
//! full-object replaces. It never lists, watches or deletes. Writes go
//! through the store's optimistic concurrency: a replace with a stale
//! resource version fails with a conflict error that the pipeline
//! propagates unchanged.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};

use crate::apps::{DeploymentConfig, ImageStream};
use crate::crd::System;
use crate::error::SmoError;

pub mod kube;
#[cfg(test)]
pub mod memory;

/// The subset of remote-store verbs the migration pipeline consumes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn update_system(&self, system: &System) -> Result<(), SmoError>;

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<ConfigMap, SmoError>;
    async fn update_config_map(&self, config_map: &ConfigMap) -> Result<(), SmoError>;

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Secret, SmoError>;
    async fn create_secret(&self, secret: &Secret) -> Result<(), SmoError>;
    async fn update_secret(&self, secret: &Secret) -> Result<(), SmoError>;

    async fn get_workload(&self, namespace: &str, name: &str)
    -> Result<DeploymentConfig, SmoError>;
    async fn update_workload(&self, workload: &DeploymentConfig) -> Result<(), SmoError>;

    async fn get_image_stream(&self, namespace: &str, name: &str)
    -> Result<ImageStream, SmoError>;
    async fn create_image_stream(&self, stream: &ImageStream) -> Result<(), SmoError>;
    async fn update_image_stream(&self, stream: &ImageStream) -> Result<(), SmoError>;
}
