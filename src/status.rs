//! Status patch helpers, condition builders, and event recording.

use anyhow::Result;
use chrono::Utc;
use k8s_openapi::api::core::v1::ObjectReference;
use kube::Api;
use kube::Resource;
use kube::api::{Patch, PatchParams};
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use tracing::debug;

use crate::crd::{System, SystemCondition, SystemStatus};

/// Condition type reported by the migration controller.
pub const MIGRATED_CONDITION: &str = "Migrated";

/// Patch the status subresource of a `System`.
pub async fn patch_status(
    api: &Api<System>,
    name: &str,
    status: &SystemStatus,
) -> Result<System> {
    debug!("Patching status for {}", name);

    let patch = serde_json::json!({ "status": status });
    let result = api
        .patch_status(name, &PatchParams::apply("smo"), &Patch::Merge(&patch))
        .await?;
    Ok(result)
}

/// Mark the migration as in progress after a remote write.
pub fn set_migration_in_progress(status: &mut SystemStatus) {
    status.message = None;
    set_condition(
        status,
        MIGRATED_CONDITION,
        "False",
        "MigrationInProgress",
        None,
    );
}

/// Mark the system as fully migrated.
pub fn set_migrated(status: &mut SystemStatus) {
    status.message = None;
    set_condition(
        status,
        MIGRATED_CONDITION,
        "True",
        "MigrationCompleted",
        None,
    );
}

/// Mark the last migration pass as failed with a message.
pub fn set_migration_failed(status: &mut SystemStatus, message: impl Into<String>) {
    let message = message.into();
    status.message = Some(message.clone());
    set_condition(
        status,
        MIGRATED_CONDITION,
        "False",
        "MigrationFailed",
        Some(message),
    );
}

/// Set a condition on the status, replacing any existing one of the same type.
pub fn set_condition(
    status: &mut SystemStatus,
    condition_type: &str,
    condition_status: &str,
    reason: &str,
    message: Option<String>,
) {
    let now = Utc::now();

    status.conditions.retain(|c| c.r#type != condition_type);

    status.conditions.push(SystemCondition {
        r#type: condition_type.to_string(),
        status: condition_status.to_string(),
        reason: reason.to_string(),
        message,
        last_transition_time: now,
    });
}

/// True when the status already reports a completed migration.
pub fn is_migrated(status: &SystemStatus) -> bool {
    status
        .conditions
        .iter()
        .any(|c| c.r#type == MIGRATED_CONDITION && c.status == "True")
}

/// Event recorder bundled with its target `ObjectReference`.
pub struct EventRecorder {
    recorder: Recorder,
    obj_ref: ObjectReference,
}

impl EventRecorder {
    /// Create an event recorder for the given `System` resource.
    pub fn new(client: kube::Client, obj: &System) -> Self {
        let reporter = Reporter {
            controller: "smo".into(),
            instance: None,
        };
        Self {
            recorder: Recorder::new(client, reporter),
            obj_ref: obj.object_ref(&()),
        }
    }

    /// Publish a Normal event.
    pub async fn publish(&self, reason: &str, message: &str) {
        self.recorder
            .publish(
                &Event {
                    type_: EventType::Normal,
                    reason: reason.into(),
                    note: Some(message.into()),
                    action: reason.into(),
                    secondary: None,
                },
                &self.obj_ref,
            )
            .await
            .unwrap_or_else(|e| tracing::warn!("Failed to publish event: {}", e));
    }

    /// Publish a Warning event.
    pub async fn publish_warning(&self, reason: &str, message: &str) {
        self.recorder
            .publish(
                &Event {
                    type_: EventType::Warning,
                    reason: reason.into(),
                    note: Some(message.into()),
                    action: reason.into(),
                    secondary: None,
                },
                &self.obj_ref,
            )
            .await
            .unwrap_or_else(|e| tracing::warn!("Failed to publish warning event: {}", e));
    }
}
