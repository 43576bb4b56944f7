//! Pre-hook pod migration for the primary application workload.
//!
//! Older deployments carry a pre-hook pod with the legacy command and env
//! convention. This step converges both onto the desired shape in a single
//! write.

use kube::ResourceExt;
use tracing::info;

use crate::crd::System;
use crate::desired::{APP_WORKLOAD, DesiredState};
use crate::error::SmoError;
use crate::migrate::fields;
use crate::store::ObjectStore;

/// Converge the pre-hook pod command and env of the `system-app` workload.
pub async fn migrate_pre_hook<S: ObjectStore>(
    store: &S,
    catalog: &dyn DesiredState,
    system: &System,
) -> Result<bool, SmoError> {
    let namespace = system.namespace().unwrap_or_default();
    let mut existing = store.get_workload(&namespace, APP_WORKLOAD).await?;
    let desired = catalog.app_workload(system);

    let env_changed = fields::reconcile_pre_hook_env(&desired, &mut existing)?;
    let command_changed = fields::reconcile_pre_hook_command(&desired, &mut existing)?;
    if env_changed || command_changed {
        info!(
            "Updating pre-hook pod of DeploymentConfig {}/{}",
            namespace, APP_WORKLOAD
        );
        store.update_workload(&existing).await?;
        return Ok(true);
    }

    Ok(false)
}
