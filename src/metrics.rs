use anyhow::Result;
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. Safe to call more than once per process
    /// (tests build several apps); later calls reuse the first handle.
    pub fn init() -> Result<Self> {
        let handle = HANDLE.get_or_try_init(|| PrometheusBuilder::new().install_recorder())?;
        ensure_described();
        Ok(Self {
            handle: handle.clone(),
        })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
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

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "proximity_queries_total",
            "Proximity rankings served, labelled by location tier."
        );
        describe_counter!(
            "proximity_geolocation_failures_total",
            "Rankings where live geolocation was unavailable."
        );
        describe_counter!(
            "content_strategy_attempts_total",
            "Blog fetch strategy attempts."
        );
        describe_counter!(
            "content_strategy_failures_total",
            "Blog fetch strategies that errored or returned nothing usable."
        );
        describe_histogram!("content_fetch_ms", "Blog page retrieval time in milliseconds.");
        describe_counter!(
            "content_feed_posts_total",
            "Posts parsed from standalone feeds."
        );
        describe_histogram!("content_feed_parse_ms", "Feed parse time in milliseconds.");
    });
}
