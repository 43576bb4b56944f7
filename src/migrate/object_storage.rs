//! Object-storage migration.
//!
//! Three ordered concerns: scrub the legacy plaintext keys from the shared
//! environment config map, relocate the bucket and region attributes into
//! the pre-provisioned credentials secret, and finally scrub the attributes
//! from the `System` spec. The secret-side step and the spec-side scrub are
//! deliberately separate steps so the source of truth survives a failed
//! secret write.

use kube::ResourceExt;
use tracing::info;

use crate::crd::System;
use crate::desired::{AWS_BUCKET_KEY, AWS_REGION_KEY, ENVIRONMENT_CONFIG_MAP};
use crate::error::SmoError;
use crate::migrate::codec;
use crate::store::ObjectStore;

/// Remove the legacy plaintext bucket and region keys from the shared
/// environment config map.
pub async fn scrub_environment_config<S: ObjectStore>(
    store: &S,
    system: &System,
) -> Result<bool, SmoError> {
    let namespace = system.namespace().unwrap_or_default();
    let mut config_map = store
        .get_config_map(&namespace, ENVIRONMENT_CONFIG_MAP)
        .await?;

    let mut changed = false;
    if let Some(data) = config_map.data.as_mut() {
        changed |= data.remove(AWS_BUCKET_KEY).is_some();
        changed |= data.remove(AWS_REGION_KEY).is_some();
    }

    if changed {
        info!(
            "Removing legacy object-storage keys from ConfigMap {}/{}",
            namespace, ENVIRONMENT_CONFIG_MAP
        );
        store.update_config_map(&config_map).await?;
        return Ok(true);
    }

    Ok(false)
}

/// Relocate the bucket and region attributes into the credentials secret.
///
/// The secret must already exist; it is provisioned out of band and never
/// created here, so not-found propagates as a hard error. Each key is
/// staged only when absent from the decoded secret data: a present key,
/// even with a different value, counts as already migrated and is never
/// overwritten.
pub async fn migrate_credentials<S: ObjectStore>(
    store: &S,
    system: &System,
) -> Result<bool, SmoError> {
    let Some(s3) = system.spec.object_storage() else {
        return Ok(false);
    };
    let namespace = system.namespace().unwrap_or_default();
    let name = s3.credentials_secret_ref.name.clone();
    let mut secret = store.get_secret(&namespace, &name).await?;

    let existing_data = codec::decode(&secret.data.clone().unwrap_or_default());
    let string_data = secret.string_data.get_or_insert_with(Default::default);

    let mut changed = false;
    if !existing_data.contains_key(AWS_BUCKET_KEY) {
        string_data.insert(AWS_BUCKET_KEY.to_string(), s3.bucket.clone());
        changed = true;
    }
    if !existing_data.contains_key(AWS_REGION_KEY) {
        string_data.insert(AWS_REGION_KEY.to_string(), s3.region.clone());
        changed = true;
    }

    if changed {
        info!("Updating Secret {}/{}", namespace, name);
        store.update_secret(&secret).await?;
        return Ok(true);
    }

    Ok(false)
}

/// Clear the migrated bucket and region attributes from the `System` spec.
/// Ordered after the secret-side migration has converged.
pub async fn scrub_spec_attributes<S: ObjectStore>(
    store: &S,
    system: &mut System,
) -> Result<bool, SmoError> {
    let mut changed = false;
    if let Some(s3) = system.spec.object_storage_mut() {
        if !s3.bucket.is_empty() {
            s3.bucket.clear();
            changed = true;
        }
        if !s3.region.is_empty() {
            s3.region.clear();
            changed = true;
        }
    }

    if changed {
        info!(
            "Clearing migrated object-storage attributes from System {}",
            system.name_any()
        );
        store.update_system(system).await?;
        return Ok(true);
    }

    Ok(false)
}
