//! Image reference migration.
//!
//! Converges one image stream per step: a missing stream is created from the
//! desired shape, an existing one has only its tag references patched.

use kube::ResourceExt;
use tracing::info;

use crate::apps::ImageStream;
use crate::crd::System;
use crate::error::SmoError;
use crate::migrate::{fields, owner_ref};
use crate::store::ObjectStore;

/// Converge a single image stream onto its desired shape.
pub async fn migrate_image_stream<S: ObjectStore>(
    store: &S,
    system: &System,
    desired: ImageStream,
) -> Result<bool, SmoError> {
    let namespace = system.namespace().unwrap_or_default();
    let name = desired.name_any();

    let mut existing = match store.get_image_stream(&namespace, &name).await {
        Ok(stream) => stream,
        Err(err) if err.is_not_found() => {
            let mut stream = desired;
            stream.metadata.namespace = Some(namespace.clone());
            stream.metadata.owner_references = Some(vec![owner_ref(system)?]);
            info!("Creating ImageStream {}/{}", namespace, name);
            store.create_image_stream(&stream).await?;
            return Ok(true);
        }
        Err(err) => return Err(err),
    };

    if fields::reconcile_image_stream_tags(&desired, &mut existing) {
        info!("Updating ImageStream {}/{}", namespace, name);
        store.update_image_stream(&existing).await?;
        return Ok(true);
    }

    Ok(false)
}
