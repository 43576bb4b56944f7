//! `ImageStream` type (`image.openshift.io/v1`).

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// `ImageStream` spec; only the tag references are modeled.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default)]
#[kube(
    group = "image.openshift.io",
    version = "v1",
    kind = "ImageStream",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct ImageStreamSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagReference>,
}

/// A named tag pointing at an external image reference.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TagReference {
    pub name: String,
    pub from: TagReferenceFrom,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TagReferenceFrom {
    pub kind: String,
    pub name: String,
}

impl TagReference {
    /// A tag tracking an external container image.
    pub fn docker_image(tag: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name: tag.into(),
            from: TagReferenceFrom {
                kind: "DockerImage".to_string(),
                name: image.into(),
            },
        }
    }
}
