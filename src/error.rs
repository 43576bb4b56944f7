//! Custom error types for smo.

use thiserror::Error;

/// Errors that can occur during System migration operations.
#[derive(Error, Debug)]
pub enum SmoError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("write conflict on {kind} {namespace}/{name}")]
    Conflict {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("shape mismatch in {object}: {detail}")]
    ShapeMismatch { object: String, detail: String },

    #[error("Kubernetes API error: {0}")]
    Api(String),
}

impl SmoError {
    /// Map a kube client error for (kind, namespace, name) to a typed variant.
    pub fn from_kube(kind: &'static str, namespace: &str, name: &str, err: &kube::Error) -> Self {
        if let kube::Error::Api(response) = err {
            match response.code {
                404 => {
                    return Self::NotFound {
                        kind,
                        namespace: namespace.to_string(),
                        name: name.to_string(),
                    };
                }
                409 if response.reason == "AlreadyExists" => {
                    return Self::AlreadyExists {
                        kind,
                        namespace: namespace.to_string(),
                        name: name.to_string(),
                    };
                }
                409 => {
                    return Self::Conflict {
                        kind,
                        namespace: namespace.to_string(),
                        name: name.to_string(),
                    };
                }
                _ => {}
            }
        }
        Self::Api(err.to_string())
    }

    /// Shape mismatch between a desired and an existing object.
    pub fn shape_mismatch(object: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            object: object.into(),
            detail: detail.into(),
        }
    }

    /// Returns true if this error is a missing-object error.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this error is a stale-write conflict.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
