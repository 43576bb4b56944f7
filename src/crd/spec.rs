//! `System` spec types.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::status::SystemStatus;

/// `System` spec defines the desired state of a managed System deployment.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "smo.dev",
    version = "v1alpha1",
    kind = "System",
    namespaced,
    status = "SystemStatus",
    printcolumn = r#"{"name":"MIGRATED","type":"string","jsonPath":".status.conditions[?(@.type==\"Migrated\")].status"}"#,
    printcolumn = r#"{"name":"MESSAGE","type":"string","jsonPath":".status.message"}"#,
    printcolumn = r#"{"name":"AGE","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SystemSpec {
    /// File storage backing the application (PVC or S3, mutually exclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_storage: Option<FileStorageSpec>,

    /// Internally managed database configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseSpec>,

    /// Outbound mail configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<MailSpec>,

    /// High availability mode; when enabled the databases are externally managed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_availability: Option<HighAvailabilitySpec>,

    /// Image tag override for the primary image set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
}

impl SystemSpec {
    /// Databases live outside the cluster when high availability is enabled.
    pub fn is_external_database_enabled(&self) -> bool {
        self.high_availability.as_ref().is_some_and(|ha| ha.enabled)
    }

    /// The object-storage migration only applies when an S3 block is configured.
    pub fn has_object_storage(&self) -> bool {
        self.object_storage().is_some()
    }

    /// The S3 sub-block of the file storage spec, if configured.
    pub fn object_storage(&self) -> Option<&S3Spec> {
        self.file_storage.as_ref().and_then(|fs| fs.s3.as_ref())
    }

    /// Mutable access to the S3 sub-block, for attribute scrubbing.
    pub fn object_storage_mut(&mut self) -> Option<&mut S3Spec> {
        self.file_storage.as_mut().and_then(|fs| fs.s3.as_mut())
    }
}

/// File storage spec: exactly one of `pvc` or `s3` is expected.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileStorageSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pvc: Option<PvcSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3: Option<S3Spec>,
}

/// PVC-backed file storage.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PvcSpec {
    /// Storage class to provision from. Unset means the cluster default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,
}

/// S3-backed file storage (external object-storage provider).
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct S3Spec {
    /// Legacy bucket attribute; migrated into the credentials secret and
    /// cleared by the migration pipeline.
    #[serde(default)]
    pub bucket: String,

    /// Legacy region attribute; migrated alongside `bucket`.
    #[serde(default)]
    pub region: String,

    /// Pre-provisioned credentials secret. Never created by the operator.
    pub credentials_secret_ref: SecretRef,
}

/// Reference to a secret by name in the System's namespace.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    pub name: String,
}

/// Internally managed database flavors.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mysql: Option<MysqlSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgresql: Option<PostgresqlSpec>,
}

/// MySQL database configuration.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MysqlSpec {
    /// Image override. Unset means the built-in default image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// PostgreSQL database configuration.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostgresqlSpec {
    /// Image override. Unset means the built-in default image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Outbound mail settings, projected into the `system-smtp` secret defaults.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MailSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// High availability mode.
#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HighAvailabilitySpec {
    #[serde(default)]
    pub enabled: bool,
}
