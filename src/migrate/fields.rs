//! Named field-path reconcilers.
//!
//! Each function compares exactly one named field path between a desired and
//! an existing object, overwrites the existing value in place when they
//! differ, and reports whether it changed anything. Nothing outside the
//! named path is read or written, which keeps every live value this
//! migration does not own intact.

use kube::ResourceExt;

use crate::apps::{DeploymentConfig, ImageStream};
use crate::error::SmoError;

/// Compare and overwrite the env list of every pod template container,
/// matched by index. A container-count mismatch makes index-wise comparison
/// meaningless and fails hard instead of guessing an alignment.
pub fn reconcile_container_env(
    desired: &DeploymentConfig,
    existing: &mut DeploymentConfig,
) -> Result<bool, SmoError> {
    let desired_containers = desired.containers();
    let existing_len = existing.containers().len();
    if existing_len != desired_containers.len() {
        return Err(SmoError::shape_mismatch(
            format!("DeploymentConfig {}", desired.name_any()),
            format!(
                "desired has {} containers, existing has {}",
                desired_containers.len(),
                existing_len
            ),
        ));
    }

    let mut changed = false;
    if let Some(existing_containers) = existing.containers_mut() {
        for (idx, existing_container) in existing_containers.iter_mut().enumerate() {
            let desired_env = &desired_containers[idx].env;
            if existing_container.env != *desired_env {
                existing_container.env = desired_env.clone();
                changed = true;
            }
        }
    }

    Ok(changed)
}

/// Compare and overwrite the pre-hook pod env list.
pub fn reconcile_pre_hook_env(
    desired: &DeploymentConfig,
    existing: &mut DeploymentConfig,
) -> Result<bool, SmoError> {
    let desired_env = pre_hook_of(desired)?.env.clone();
    let existing_hook = pre_hook_mut_of(existing)?;
    if existing_hook.env != desired_env {
        existing_hook.env = desired_env;
        return Ok(true);
    }
    Ok(false)
}

/// Compare and overwrite the pre-hook pod command.
pub fn reconcile_pre_hook_command(
    desired: &DeploymentConfig,
    existing: &mut DeploymentConfig,
) -> Result<bool, SmoError> {
    let desired_command = pre_hook_of(desired)?.command.clone();
    let existing_hook = pre_hook_mut_of(existing)?;
    if existing_hook.command != desired_command {
        existing_hook.command = desired_command;
        return Ok(true);
    }
    Ok(false)
}

/// Compare and overwrite the image stream tag references.
pub fn reconcile_image_stream_tags(desired: &ImageStream, existing: &mut ImageStream) -> bool {
    if existing.spec.tags != desired.spec.tags {
        existing.spec.tags = desired.spec.tags.clone();
        return true;
    }
    false
}

fn pre_hook_of(workload: &DeploymentConfig) -> Result<&crate::apps::ExecNewPodHook, SmoError> {
    workload.pre_hook().ok_or_else(|| {
        SmoError::shape_mismatch(
            format!("DeploymentConfig {}", workload.name_any()),
            "pre-hook pod is not configured",
        )
    })
}

fn pre_hook_mut_of(
    workload: &mut DeploymentConfig,
) -> Result<&mut crate::apps::ExecNewPodHook, SmoError> {
    let name = workload.name_any();
    workload.pre_hook_mut().ok_or_else(|| {
        SmoError::shape_mismatch(
            format!("DeploymentConfig {name}"),
            "pre-hook pod is not configured",
        )
    })
}
