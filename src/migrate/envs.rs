//! Environment-variable propagation to the dependent workloads.
//!
//! Both the mail and the object-storage migration converge the same env
//! lists: the desired lists resolve configuration through secrets instead of
//! inline plaintext values, so once a data migration lands, the env lists of
//! the worker and app workloads are rewritten to the secret-backed form.

use kube::ResourceExt;
use tracing::info;

use crate::crd::System;
use crate::desired::DesiredState;
use crate::error::SmoError;
use crate::migrate::fields;
use crate::store::ObjectStore;

/// Converge the container env lists of the worker workload.
pub async fn propagate_worker_env<S: ObjectStore>(
    store: &S,
    catalog: &dyn DesiredState,
    system: &System,
) -> Result<bool, SmoError> {
    let namespace = system.namespace().unwrap_or_default();
    let desired = catalog.worker_workload(system);
    let name = desired.name_any();
    let mut existing = store.get_workload(&namespace, &name).await?;

    let changed = fields::reconcile_container_env(&desired, &mut existing)?;
    if changed {
        info!("Updating env of DeploymentConfig {}/{}", namespace, name);
        store.update_workload(&existing).await?;
        return Ok(true);
    }

    Ok(false)
}

/// Converge the container env lists and the pre-hook env of the app
/// workload in a single write.
pub async fn propagate_app_env<S: ObjectStore>(
    store: &S,
    catalog: &dyn DesiredState,
    system: &System,
) -> Result<bool, SmoError> {
    let namespace = system.namespace().unwrap_or_default();
    let desired = catalog.app_workload(system);
    let name = desired.name_any();
    let mut existing = store.get_workload(&namespace, &name).await?;

    let container_changed = fields::reconcile_container_env(&desired, &mut existing)?;
    let hook_changed = fields::reconcile_pre_hook_env(&desired, &mut existing)?;
    if container_changed || hook_changed {
        info!("Updating env of DeploymentConfig {}/{}", namespace, name);
        store.update_workload(&existing).await?;
        return Ok(true);
    }

    Ok(false)
}
