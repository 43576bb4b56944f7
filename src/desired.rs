//! Desired-state builders for the managed objects.
//!
//! Each builder is a pure function of the `System` resource: it computes the
//! fully-specified target shape for one managed object kind and never reads
//! remote state. The migration pipeline compares these shapes against live
//! objects and patches narrow field subsets.

use k8s_openapi::api::core::v1::{
    Container, EnvVar, EnvVarSource, PodSpec, PodTemplateSpec, Secret, SecretKeySelector,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;

use crate::apps::{
    DeploymentConfig, DeploymentConfigSpec, ExecNewPodHook, ImageStream, ImageStreamSpec,
    LifecycleHook, RollingParams, TagReference,
};
use crate::crd::System;

// Stable on-cluster contract names. The rest of the running system refers to
// these objects and keys by name; renaming any of them is a breaking change.
pub const APP_WORKLOAD: &str = "system-app";
pub const WORKER_WORKLOAD: &str = "system-worker";
pub const MAIL_CONFIG_MAP: &str = "smtp";
pub const MAIL_SECRET: &str = "system-smtp";
pub const ENVIRONMENT_CONFIG_MAP: &str = "system-environment";
pub const AWS_BUCKET_KEY: &str = "AWS_BUCKET";
pub const AWS_REGION_KEY: &str = "AWS_REGION";

pub const APP_IMAGE_STREAM: &str = "system-app";
pub const BACKEND_IMAGE_STREAM: &str = "system-backend";
pub const CACHE_IMAGE_STREAM: &str = "system-cache";
pub const DATABASE_IMAGE_STREAM: &str = "system-database";

const DEFAULT_APP_VERSION: &str = "1.4";
const APP_IMAGE: &str = "quay.io/smo/system-app";
const BACKEND_IMAGE: &str = "quay.io/smo/system-backend";
const CACHE_IMAGE: &str = "centos/redis-5-centos7:5";
const MYSQL_IMAGE: &str = "centos/mysql-57-centos7:5.7";
const POSTGRESQL_IMAGE: &str = "centos/postgresql-10-centos7:10";

/// One desired-state computation per managed object kind.
pub trait DesiredState: Send + Sync {
    fn app_workload(&self, system: &System) -> DeploymentConfig;
    fn worker_workload(&self, system: &System) -> DeploymentConfig;
    fn mail_secret(&self, system: &System) -> Secret;
    fn app_image_stream(&self, system: &System) -> ImageStream;
    fn backend_image_stream(&self, system: &System) -> ImageStream;
    fn cache_image_stream(&self, system: &System) -> ImageStream;
    fn database_image_stream(&self, system: &System) -> ImageStream;
}

/// Built-in desired-state catalog for the managed System components.
pub struct Catalog;

impl DesiredState for Catalog {
    fn app_workload(&self, system: &System) -> DeploymentConfig {
        let env = app_env(system);
        let mut workload = workload(APP_WORKLOAD, &app_image(system), env.clone());
        workload.spec.strategy.rolling_params = Some(RollingParams {
            pre: Some(LifecycleHook {
                exec_new_pod: Some(ExecNewPodHook {
                    container_name: APP_WORKLOAD.to_string(),
                    command: deploy_command(),
                    env,
                }),
            }),
        });
        workload
    }

    fn worker_workload(&self, system: &System) -> DeploymentConfig {
        workload(WORKER_WORKLOAD, &app_image(system), app_env(system))
    }

    fn mail_secret(&self, system: &System) -> Secret {
        let mail = system.spec.mail.clone().unwrap_or_default();
        let entry = |value: Option<String>| value.unwrap_or_default();
        let mut string_data = BTreeMap::new();
        string_data.insert("address".to_string(), entry(mail.address));
        string_data.insert("port".to_string(), entry(mail.port));
        string_data.insert("domain".to_string(), entry(mail.domain));
        string_data.insert("authentication".to_string(), entry(mail.authentication));
        string_data.insert("username".to_string(), entry(mail.username));
        string_data.insert("password".to_string(), String::new());

        Secret {
            metadata: ObjectMeta {
                name: Some(MAIL_SECRET.to_string()),
                labels: Some(system_labels()),
                ..Default::default()
            },
            string_data: Some(string_data),
            ..Default::default()
        }
    }

    fn app_image_stream(&self, system: &System) -> ImageStream {
        image_stream(APP_IMAGE_STREAM, &app_version(system), &app_image(system))
    }

    fn backend_image_stream(&self, system: &System) -> ImageStream {
        let tag = app_version(system);
        let image = format!("{BACKEND_IMAGE}:{tag}");
        image_stream(BACKEND_IMAGE_STREAM, &tag, &image)
    }

    fn cache_image_stream(&self, _system: &System) -> ImageStream {
        image_stream(CACHE_IMAGE_STREAM, "5", CACHE_IMAGE)
    }

    fn database_image_stream(&self, system: &System) -> ImageStream {
        let database = system.spec.database.as_ref();
        if let Some(postgresql) = database.and_then(|db| db.postgresql.as_ref()) {
            let image = postgresql.image.as_deref().unwrap_or(POSTGRESQL_IMAGE);
            return image_stream(DATABASE_IMAGE_STREAM, "10", image);
        }
        // default flavor is MySQL
        let image = database
            .and_then(|db| db.mysql.as_ref())
            .and_then(|mysql| mysql.image.as_deref())
            .unwrap_or(MYSQL_IMAGE);
        image_stream(DATABASE_IMAGE_STREAM, "5.7", image)
    }
}

fn app_version(system: &System) -> String {
    system
        .spec
        .app_version
        .clone()
        .unwrap_or_else(|| DEFAULT_APP_VERSION.to_string())
}

fn app_image(system: &System) -> String {
    format!("{APP_IMAGE}:{}", app_version(system))
}

fn deploy_command() -> Vec<String> {
    ["bundle", "exec", "rake", "boot", "deploy"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Container env shared by the app and worker tiers: base settings, mail
/// settings resolved through the mail secret, and object-storage settings
/// resolved through the pre-provisioned credentials secret when configured.
fn app_env(system: &System) -> Vec<EnvVar> {
    let mut env = vec![env_var("RAILS_ENV", "production")];

    env.push(env_var_from_secret("SMTP_ADDRESS", MAIL_SECRET, "address"));
    env.push(env_var_from_secret("SMTP_PORT", MAIL_SECRET, "port"));
    env.push(env_var_from_secret("SMTP_DOMAIN", MAIL_SECRET, "domain"));
    env.push(env_var_from_secret(
        "SMTP_AUTHENTICATION",
        MAIL_SECRET,
        "authentication",
    ));
    env.push(env_var_from_secret("SMTP_USER_NAME", MAIL_SECRET, "username"));
    env.push(env_var_from_secret("SMTP_PASSWORD", MAIL_SECRET, "password"));

    if let Some(s3) = system.spec.object_storage() {
        let credentials = &s3.credentials_secret_ref.name;
        env.push(env_var("FILE_UPLOAD_STORAGE", "s3"));
        env.push(env_var_from_secret(AWS_BUCKET_KEY, credentials, AWS_BUCKET_KEY));
        env.push(env_var_from_secret(AWS_REGION_KEY, credentials, AWS_REGION_KEY));
    }

    env
}

fn workload(name: &str, image: &str, env: Vec<EnvVar>) -> DeploymentConfig {
    let mut dc = DeploymentConfig::new(
        name,
        DeploymentConfigSpec {
            replicas: Some(1),
            strategy: Default::default(),
            template: Some(PodTemplateSpec {
                metadata: None,
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: name.to_string(),
                        image: Some(image.to_string()),
                        env: Some(env),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            }),
        },
    );
    dc.metadata.labels = Some(system_labels());
    dc
}

fn image_stream(name: &str, tag: &str, image: &str) -> ImageStream {
    let mut stream = ImageStream::new(
        name,
        ImageStreamSpec {
            tags: vec![TagReference::docker_image(tag, image)],
        },
    );
    stream.metadata.labels = Some(system_labels());
    stream
}

fn system_labels() -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), "system".to_string());
    labels
}

fn env_var(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        value_from: None,
    }
}

fn env_var_from_secret(name: &str, secret: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: None,
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: secret.to_string(),
                key: key.to_string(),
                optional: None,
            }),
            ..Default::default()
        }),
    }
}
