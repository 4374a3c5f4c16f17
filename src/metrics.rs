use axum::{routing::get, Router};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Millisecond buckets for feed fetch and parse timings.
const TIMING_BUCKETS_MS: &[f64] = &[5.0, 25.0, 100.0, 250.0, 1_000.0, 5_000.0, 30_000.0];

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder. Ingest timings are
    /// exported as histograms, everything else with the exporter defaults.
    pub fn init() -> Result<Self, BuildError> {
        let handle = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Suffix("_ms".to_string()), TIMING_BUCKETS_MS)?
            .install_recorder()?;
        Ok(Self { handle })
    }

    /// `/metrics` in the Prometheus text format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
