//! Managed application object types.
//!
//! Workload and image stream shapes the migration pipeline inspects and
//! patches. Only the fields the pipeline owns are modeled; everything else
//! on the live objects is preserved by the narrow field-patch contract.

pub mod image;
pub mod workload;

pub use image::{ImageStream, ImageStreamSpec, TagReference, TagReferenceFrom};
pub use workload::{
    DeploymentConfig, DeploymentConfigSpec, DeploymentStrategy, ExecNewPodHook, LifecycleHook,
    RollingParams,
};
