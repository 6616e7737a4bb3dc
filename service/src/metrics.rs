//! # Prometheus Metrics
//!
//! Operational metrics for the loan-log service, scraped at the
//! `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so
//! they do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the service.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it
/// can be shared across request handlers and background tasks.
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of loan-log assets minted by this service.
    pub log_assets_created_total: IntCounter,
    /// Total number of log entries appended.
    pub log_appends_total: IntCounter,
    /// Total number of credit-profile writes that confirmed.
    pub profile_writes_total: IntCounter,
    /// Total number of credit-profile writes the contract rejected.
    pub profile_write_rejections_total: IntCounter,
    /// Latest ledger round observed by the liveness probe.
    pub ledger_round: IntGauge,
    /// Histogram of ledger submit-to-confirm latency in seconds.
    pub confirmation_latency_seconds: Histogram,
}

impl ServiceMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("arbor".into()), None)
            .expect("failed to create prometheus registry");

        let log_assets_created_total = IntCounter::new(
            "log_assets_created_total",
            "Total number of loan-log assets minted",
        )
        .expect("metric creation");
        registry
            .register(Box::new(log_assets_created_total.clone()))
            .expect("metric registration");

        let log_appends_total =
            IntCounter::new("log_appends_total", "Total number of log entries appended")
                .expect("metric creation");
        registry
            .register(Box::new(log_appends_total.clone()))
            .expect("metric registration");

        let profile_writes_total = IntCounter::new(
            "profile_writes_total",
            "Total number of confirmed credit-profile writes",
        )
        .expect("metric creation");
        registry
            .register(Box::new(profile_writes_total.clone()))
            .expect("metric registration");

        let profile_write_rejections_total = IntCounter::new(
            "profile_write_rejections_total",
            "Total number of credit-profile writes rejected by the contract",
        )
        .expect("metric creation");
        registry
            .register(Box::new(profile_write_rejections_total.clone()))
            .expect("metric registration");

        let ledger_round = IntGauge::new("ledger_round", "Latest ledger round observed")
            .expect("metric creation");
        registry
            .register(Box::new(ledger_round.clone()))
            .expect("metric registration");

        let confirmation_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "confirmation_latency_seconds",
                "Ledger submit-to-confirm latency in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(confirmation_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            log_assets_created_total,
            log_appends_total,
            profile_writes_total,
            profile_write_rejections_total,
            ledger_round,
            confirmation_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers via state.
pub type SharedMetrics = Arc<ServiceMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_and_encode() {
        let metrics = ServiceMetrics::new();
        metrics.log_appends_total.inc();
        metrics.ledger_round.set(42);

        let text = metrics.encode().unwrap();
        assert!(text.contains("arbor_log_appends_total 1"));
        assert!(text.contains("arbor_ledger_round 42"));
    }
}
