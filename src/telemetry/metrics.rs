//! Prometheus metrics for the smo operator.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;

/// Labels for reconcile metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ReconcileLabels {
    pub name: String,
    pub namespace: String,
    pub result: String,
}

/// Labels for per-System metrics.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct SystemLabels {
    pub name: String,
    pub namespace: String,
}

/// All Prometheus metrics for the operator.
pub struct Metrics {
    pub reconcile_total: Family<ReconcileLabels, Counter>,
    pub reconcile_duration_seconds: Family<SystemLabels, Histogram>,
    pub migration_completed_total: Family<SystemLabels, Counter>,
    pub migration_failed_total: Family<SystemLabels, Counter>,
}

const RECONCILE_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

impl Metrics {
    /// Create and register all metrics with the given registry.
    pub fn new(registry: &mut Registry) -> Self {
        let reconcile_total = Family::<ReconcileLabels, Counter>::default();
        registry.register(
            "smo_reconcile",
            "Total number of reconcile calls",
            reconcile_total.clone(),
        );

        let reconcile_duration_seconds =
            Family::<SystemLabels, Histogram>::new_with_constructor(|| {
                Histogram::new(RECONCILE_BUCKETS.iter().copied())
            });
        registry.register(
            "smo_reconcile_duration_seconds",
            "Duration of reconcile calls in seconds",
            reconcile_duration_seconds.clone(),
        );

        let migration_completed_total = Family::<SystemLabels, Counter>::default();
        registry.register(
            "smo_migration_completed",
            "Total number of Systems that reached the fully migrated state",
            migration_completed_total.clone(),
        );

        let migration_failed_total = Family::<SystemLabels, Counter>::default();
        registry.register(
            "smo_migration_failed",
            "Total number of failed migration passes",
            migration_failed_total.clone(),
        );

        Self {
            reconcile_total,
            reconcile_duration_seconds,
            migration_completed_total,
            migration_failed_total,
        }
    }

    /// Record a reconcile outcome ("requeue", "success" or "error").
    pub fn record_reconcile(&self, name: &str, namespace: &str, result: &str) {
        self.reconcile_total
            .get_or_create(&ReconcileLabels {
                name: name.to_string(),
                namespace: namespace.to_string(),
                result: result.to_string(),
            })
            .inc();
    }

    /// Observe the duration of a reconcile call.
    pub fn observe_reconcile_duration(&self, name: &str, namespace: &str, seconds: f64) {
        self.reconcile_duration_seconds
            .get_or_create(&SystemLabels {
                name: name.to_string(),
                namespace: namespace.to_string(),
            })
            .observe(seconds);
    }
}

/// Axum handler that encodes the registry as OpenMetrics text.
async fn metrics_handler(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    let mut buf = String::new();
    if encode(&mut buf, &registry).is_err() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to encode metrics".to_string(),
        );
    }
    (StatusCode::OK, buf)
}

/// Start the metrics server on the given port.
pub async fn serve(port: u16, registry: Arc<Registry>) -> anyhow::Result<()> {
    use axum::Router;
    use axum::routing::get;
    use tokio::net::TcpListener;
    use tracing::info;

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Metrics server listening on port {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}
