//! Root-resource default stripping.
//!
//! Early releases wrote explicit defaults into the `System` spec. A block
//! that still matches the legacy explicit-default shape is removed entirely
//! so the desired-state builders reintroduce the current default on the next
//! computation. The checks are sentinel-field checks, not whole-block
//! equality: a block with any user customization set must survive.

use kube::ResourceExt;
use tracing::info;

use crate::crd::System;
use crate::error::SmoError;
use crate::store::ObjectStore;

/// Strip a `fileStorage` block that matches the legacy PVC default
/// (a PVC block present with no storage class name).
pub async fn strip_storage_defaults<S: ObjectStore>(
    store: &S,
    system: &mut System,
) -> Result<bool, SmoError> {
    let legacy_default = system
        .spec
        .file_storage
        .as_ref()
        .and_then(|fs| fs.pvc.as_ref())
        .is_some_and(|pvc| pvc.storage_class_name.is_none());
    if !legacy_default {
        return Ok(false);
    }

    system.spec.file_storage = None;
    info!(
        "Stripping legacy storage defaults from System {}",
        system.name_any()
    );
    store.update_system(system).await?;
    Ok(true)
}

/// Strip a `database` block that matches the legacy MySQL default
/// (a MySQL block present with no image override).
pub async fn strip_database_defaults<S: ObjectStore>(
    store: &S,
    system: &mut System,
) -> Result<bool, SmoError> {
    let legacy_default = system
        .spec
        .database
        .as_ref()
        .and_then(|db| db.mysql.as_ref())
        .is_some_and(|mysql| mysql.image.is_none());
    if !legacy_default {
        return Ok(false);
    }

    system.spec.database = None;
    info!(
        "Stripping legacy database defaults from System {}",
        system.name_any()
    );
    store.update_system(system).await?;
    Ok(true)
}
