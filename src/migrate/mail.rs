//! Mail configuration data relocation.
//!
//! Moves the plaintext entries of the legacy `smtp` config map into the
//! byte data of the `system-smtp` secret. The legacy config map is never
//! deleted here; cleanup is a separate concern.

use kube::ResourceExt;
use tracing::info;

use crate::crd::System;
use crate::desired::{DesiredState, MAIL_CONFIG_MAP, MAIL_SECRET};
use crate::error::SmoError;
use crate::migrate::{codec, owner_ref};
use crate::store::ObjectStore;

/// Relocate the legacy mail config data into the mail secret.
///
/// A missing source config map is an error; a missing destination secret is
/// the construct-and-create path.
pub async fn migrate_mail_data<S: ObjectStore>(
    store: &S,
    catalog: &dyn DesiredState,
    system: &System,
) -> Result<bool, SmoError> {
    let namespace = system.namespace().unwrap_or_default();
    let config_map = store.get_config_map(&namespace, MAIL_CONFIG_MAP).await?;
    let config_data = config_map.data.clone().unwrap_or_default();

    let mut secret = match store.get_secret(&namespace, MAIL_SECRET).await {
        Ok(secret) => secret,
        Err(err) if err.is_not_found() => {
            // The desired secret is fully shaped without the secret existing,
            // so take the default shape and overwrite its data with the
            // legacy config map entries.
            let mut secret = catalog.mail_secret(system);
            secret.metadata.namespace = Some(namespace.clone());
            secret.metadata.owner_references = Some(vec![owner_ref(system)?]);
            // string_data takes precedence over data on create; it must be
            // cleared so the relocated data is authoritative.
            secret.string_data = None;
            secret.data = Some(codec::encode(&config_data));
            info!("Creating Secret {}/{}", namespace, MAIL_SECRET);
            store.create_secret(&secret).await?;
            return Ok(true);
        }
        Err(err) => return Err(err),
    };

    let secret_data = codec::decode(&secret.data.clone().unwrap_or_default());
    if secret_data != config_data {
        secret.data = Some(codec::encode(&config_data));
        info!("Updating Secret {}/{}", namespace, MAIL_SECRET);
        store.update_secret(&secret).await?;
        return Ok(true);
    }

    Ok(false)
}
