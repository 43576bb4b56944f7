//! System controller - reconcile dispatch and error policy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kube::runtime::controller::Action;
use kube::{Api, ResourceExt};
use tracing::{error, info, warn};

use crate::crd::System;
use crate::desired::Catalog;
use crate::migrate::{Migrator, PipelineResult};
use crate::status;
use crate::store::kube::KubeStore;
use crate::telemetry::metrics::Metrics;

/// Requeue delay after a migration write: the next pass should run promptly.
pub const REQUEUE_AFTER_WRITE: Duration = Duration::from_secs(1);

/// Requeue delay after a failed pass. The pipeline has no retry loop of its
/// own; re-invocation is the sole recovery path.
pub const REQUEUE_AFTER_ERROR: Duration = Duration::from_secs(30);

/// Shared context for the controller.
pub struct Context {
    pub kube_client: kube::Client,
    pub metrics: Arc<Metrics>,
}

/// Reconcile a `System` resource.
///
/// Runs one migration pipeline pass and maps its result onto the requeue
/// schedule: a write means "invoke again promptly", a clean pass means the
/// system is fully migrated, and an error is surfaced on the status and
/// retried on the error schedule.
pub async fn reconcile(obj: Arc<System>, ctx: Arc<Context>) -> Result<Action, kube::Error> {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();
    let generation = obj.metadata.generation.unwrap_or(0);

    let api: Api<System> = Api::namespaced(ctx.kube_client.clone(), &namespace);
    let recorder = status::EventRecorder::new(ctx.kube_client.clone(), &obj);

    let store = KubeStore::new(ctx.kube_client.clone());
    let mut migrator = Migrator::new(store, Box::new(Catalog), (*obj).clone());

    let start = Instant::now();
    let result = migrator.upgrade().await;
    ctx.metrics
        .observe_reconcile_duration(&name, &namespace, start.elapsed().as_secs_f64());

    let mut new_status = obj.status.clone().unwrap_or_default();
    new_status.observed_generation = generation;

    match result {
        Ok(PipelineResult { requeue: true }) => {
            info!("Migration pass for {}/{} wrote state, requeueing", namespace, name);
            ctx.metrics.record_reconcile(&name, &namespace, "requeue");

            status::set_migration_in_progress(&mut new_status);
            if let Err(e) = status::patch_status(&api, &name, &new_status).await {
                warn!("Failed to patch status for {}: {}", name, e);
            }
            Ok(Action::requeue(REQUEUE_AFTER_WRITE))
        }
        Ok(PipelineResult { requeue: false }) => {
            ctx.metrics.record_reconcile(&name, &namespace, "success");

            let already_migrated =
                obj.status.as_ref().is_some_and(status::is_migrated);
            status::set_migrated(&mut new_status);
            if let Err(e) = status::patch_status(&api, &name, &new_status).await {
                warn!("Failed to patch status for {}: {}", name, e);
                return Ok(Action::requeue(Duration::from_secs(5)));
            }
            if !already_migrated {
                info!("System {}/{} is fully migrated", namespace, name);
                recorder
                    .publish("MigrationCompleted", "System is fully migrated")
                    .await;
                ctx.metrics
                    .migration_completed_total
                    .get_or_create(&crate::telemetry::metrics::SystemLabels {
                        name: name.clone(),
                        namespace: namespace.clone(),
                    })
                    .inc();
            }
            Ok(Action::await_change())
        }
        Err(e) => {
            error!("Migration pass for {}/{} failed: {}", namespace, name, e);
            ctx.metrics.record_reconcile(&name, &namespace, "error");
            ctx.metrics
                .migration_failed_total
                .get_or_create(&crate::telemetry::metrics::SystemLabels {
                    name: name.clone(),
                    namespace: namespace.clone(),
                })
                .inc();

            status::set_migration_failed(&mut new_status, e.to_string());
            let _ = status::patch_status(&api, &name, &new_status).await;
            recorder.publish_warning("MigrationFailed", &e.to_string()).await;
            Ok(Action::requeue(REQUEUE_AFTER_ERROR))
        }
    }
}

/// Error policy for the controller.
pub fn error_policy(obj: Arc<System>, err: &kube::Error, _ctx: Arc<Context>) -> Action {
    let name = obj.name_any();
    error!("Controller error for {}: {}", name, err);
    Action::requeue(Duration::from_secs(30))
}
