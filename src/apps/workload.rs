//! `DeploymentConfig` workload type (`apps.openshift.io/v1`).

use k8s_openapi::api::core::v1::{Container, EnvVar, PodTemplateSpec};
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// `DeploymentConfig` spec. Schema generation is disabled: this is an
/// existing cluster API, not a CRD this operator installs.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default)]
#[kube(
    group = "apps.openshift.io",
    version = "v1",
    kind = "DeploymentConfig",
    namespaced,
    schema = "disabled"
)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfigSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,

    #[serde(default)]
    pub strategy: DeploymentStrategy,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PodTemplateSpec>,
}

/// Deployment strategy; only the rolling pre-hook is modeled.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStrategy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_params: Option<RollingParams>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RollingParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre: Option<LifecycleHook>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleHook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_new_pod: Option<ExecNewPodHook>,
}

/// Pre-deployment hook pod run before each rollout.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExecNewPodHook {
    pub container_name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

impl DeploymentConfig {
    /// The pod template containers, empty when the template is absent.
    pub fn containers(&self) -> &[Container] {
        self.spec
            .template
            .as_ref()
            .and_then(|t| t.spec.as_ref())
            .map_or(&[], |s| &s.containers)
    }

    /// Mutable pod template containers.
    pub fn containers_mut(&mut self) -> Option<&mut Vec<Container>> {
        self.spec
            .template
            .as_mut()
            .and_then(|t| t.spec.as_mut())
            .map(|s| &mut s.containers)
    }

    /// The rolling pre-hook pod, if configured.
    pub fn pre_hook(&self) -> Option<&ExecNewPodHook> {
        self.spec
            .strategy
            .rolling_params
            .as_ref()
            .and_then(|rp| rp.pre.as_ref())
            .and_then(|pre| pre.exec_new_pod.as_ref())
    }

    /// Mutable rolling pre-hook pod.
    pub fn pre_hook_mut(&mut self) -> Option<&mut ExecNewPodHook> {
        self.spec
            .strategy
            .rolling_params
            .as_mut()
            .and_then(|rp| rp.pre.as_mut())
            .and_then(|pre| pre.exec_new_pod.as_mut())
    }
}
