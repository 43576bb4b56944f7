//! Sequential idempotent migration pipeline.
//!
//! One `Migrator::upgrade` pass runs a fixed, ordered list of migration
//! steps. Every step is safely re-runnable and reports whether it performed
//! a remote write. The pass short-circuits after the first write (or error):
//! a successful mutation never leads to another mutation attempt in the same
//! pass, because downstream steps could be invalidated by the change. The
//! controller re-invokes the pipeline until a full pass runs clean.

pub mod codec;
pub mod defaults;
pub mod envs;
pub mod fields;
pub mod images;
pub mod mail;
pub mod object_storage;
pub mod prehook;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::Resource;
use tracing::{debug, info};

use crate::crd::System;
use crate::desired::DesiredState;
use crate::error::SmoError;
use crate::store::ObjectStore;

/// Result of one full pipeline pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineResult {
    /// True when a remote write happened and the pipeline should be invoked
    /// again promptly. False means the system is fully migrated.
    pub requeue: bool,
}

/// The migration steps, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    StripStorageDefaults,
    StripDatabaseDefaults,
    AppPreHookPod,
    AppImageStream,
    BackendImageStream,
    CacheImageStream,
    DatabaseImageStream,
    MailData,
    MailWorkerEnv,
    MailAppEnv,
    ObjectStorageConfigScrub,
    ObjectStorageCredentials,
    ObjectStorageWorkerEnv,
    ObjectStorageAppEnv,
    ObjectStorageSpecScrub,
}

impl Step {
    /// Fixed execution order of the pipeline.
    pub const ORDERED: &'static [Self] = &[
        Self::StripStorageDefaults,
        Self::StripDatabaseDefaults,
        Self::AppPreHookPod,
        Self::AppImageStream,
        Self::BackendImageStream,
        Self::CacheImageStream,
        Self::DatabaseImageStream,
        Self::MailData,
        Self::MailWorkerEnv,
        Self::MailAppEnv,
        Self::ObjectStorageConfigScrub,
        Self::ObjectStorageCredentials,
        Self::ObjectStorageWorkerEnv,
        Self::ObjectStorageAppEnv,
        Self::ObjectStorageSpecScrub,
    ];

    /// Conditional gates: database-tier steps only run for internally
    /// managed databases, object-storage steps only when an S3 block is
    /// configured.
    pub fn enabled(self, system: &System) -> bool {
        match self {
            Self::StripDatabaseDefaults | Self::CacheImageStream | Self::DatabaseImageStream => {
                !system.spec.is_external_database_enabled()
            }
            Self::ObjectStorageConfigScrub
            | Self::ObjectStorageCredentials
            | Self::ObjectStorageWorkerEnv
            | Self::ObjectStorageAppEnv
            | Self::ObjectStorageSpecScrub => system.spec.has_object_storage(),
            _ => true,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::StripStorageDefaults => "strip-storage-defaults",
            Self::StripDatabaseDefaults => "strip-database-defaults",
            Self::AppPreHookPod => "app-pre-hook-pod",
            Self::AppImageStream => "app-image-stream",
            Self::BackendImageStream => "backend-image-stream",
            Self::CacheImageStream => "cache-image-stream",
            Self::DatabaseImageStream => "database-image-stream",
            Self::MailData => "mail-data",
            Self::MailWorkerEnv => "mail-worker-env",
            Self::MailAppEnv => "mail-app-env",
            Self::ObjectStorageConfigScrub => "object-storage-config-scrub",
            Self::ObjectStorageCredentials => "object-storage-credentials",
            Self::ObjectStorageWorkerEnv => "object-storage-worker-env",
            Self::ObjectStorageAppEnv => "object-storage-app-env",
            Self::ObjectStorageSpecScrub => "object-storage-spec-scrub",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Runs the migration pipeline against a remote object store.
pub struct Migrator<S> {
    store: S,
    catalog: Box<dyn DesiredState>,
    system: System,
}

impl<S: ObjectStore> Migrator<S> {
    pub fn new(store: S, catalog: Box<dyn DesiredState>, system: System) -> Self {
        Self {
            store,
            catalog,
            system,
        }
    }

    /// The System resource as seen by the pipeline, including any spec
    /// blocks stripped during this pass.
    pub const fn system(&self) -> &System {
        &self.system
    }

    /// Run one pipeline pass: execute the enabled steps in order, stopping
    /// at the first step that wrote remote state or failed.
    pub async fn upgrade(&mut self) -> Result<PipelineResult, SmoError> {
        for &step in Step::ORDERED {
            if !step.enabled(&self.system) {
                debug!("Skipping migration step {step}");
                continue;
            }
            if self.run_step(step).await? {
                info!("Migration step {step} wrote remote state, requeueing");
                return Ok(PipelineResult { requeue: true });
            }
        }
        debug!("All migration steps ran clean");
        Ok(PipelineResult { requeue: false })
    }

    /// Execute a single step and report whether it wrote remote state.
    pub async fn run_step(&mut self, step: Step) -> Result<bool, SmoError> {
        let catalog = self.catalog.as_ref();
        match step {
            Step::StripStorageDefaults => {
                defaults::strip_storage_defaults(&self.store, &mut self.system).await
            }
            Step::StripDatabaseDefaults => {
                defaults::strip_database_defaults(&self.store, &mut self.system).await
            }
            Step::AppPreHookPod => {
                prehook::migrate_pre_hook(&self.store, catalog, &self.system).await
            }
            Step::AppImageStream => {
                let desired = catalog.app_image_stream(&self.system);
                images::migrate_image_stream(&self.store, &self.system, desired).await
            }
            Step::BackendImageStream => {
                let desired = catalog.backend_image_stream(&self.system);
                images::migrate_image_stream(&self.store, &self.system, desired).await
            }
            Step::CacheImageStream => {
                let desired = catalog.cache_image_stream(&self.system);
                images::migrate_image_stream(&self.store, &self.system, desired).await
            }
            Step::DatabaseImageStream => {
                let desired = catalog.database_image_stream(&self.system);
                images::migrate_image_stream(&self.store, &self.system, desired).await
            }
            Step::MailData => mail::migrate_mail_data(&self.store, catalog, &self.system).await,
            Step::MailWorkerEnv | Step::ObjectStorageWorkerEnv => {
                envs::propagate_worker_env(&self.store, catalog, &self.system).await
            }
            Step::MailAppEnv | Step::ObjectStorageAppEnv => {
                envs::propagate_app_env(&self.store, catalog, &self.system).await
            }
            Step::ObjectStorageConfigScrub => {
                object_storage::scrub_environment_config(&self.store, &self.system).await
            }
            Step::ObjectStorageCredentials => {
                object_storage::migrate_credentials(&self.store, &self.system).await
            }
            Step::ObjectStorageSpecScrub => {
                object_storage::scrub_spec_attributes(&self.store, &mut self.system).await
            }
        }
    }
}

/// Controller owner reference pointing at the System resource.
pub(crate) fn owner_ref(system: &System) -> Result<OwnerReference, SmoError> {
    system
        .controller_owner_ref(&())
        .ok_or_else(|| SmoError::Api("System resource has no name or uid".to_string()))
}
