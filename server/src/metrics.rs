//! # Prometheus Metrics
//!
//! Operational metrics for the sign-in service, scraped at the `/metrics`
//! endpoint on the configured metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] so they do not
//! collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the service.
///
/// Clone-friendly (prometheus handles are internally ref-counted) so it can
/// be shared across request handlers.
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Registry that owns all metrics below.
    registry: Registry,
    /// Total nonce issuance requests that reached the core.
    pub nonce_requests_total: IntCounter,
    /// Total verification requests that reached the core.
    pub verify_requests_total: IntCounter,
    /// Verifications that ended in `True`.
    pub verify_valid_total: IntCounter,
    /// Verifications that ended in `False`.
    pub verify_invalid_total: IntCounter,
    /// Verifications rejected because the name has no directory record.
    pub unknown_name_total: IntCounter,
    /// Requests that died on the store or the directory being unreachable.
    /// This counter moving is an outage, not user error.
    pub infra_failures_total: IntCounter,
    /// End-to-end verification latency in seconds, directory query included.
    pub verify_latency_seconds: Histogram,
}

impl ServiceMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("wraplogin".into()), None)
            .expect("failed to create prometheus registry");

        let nonce_requests_total = IntCounter::new(
            "nonce_requests_total",
            "Total nonce issuance requests handled",
        )
        .expect("metric creation");
        registry
            .register(Box::new(nonce_requests_total.clone()))
            .expect("metric registration");

        let verify_requests_total = IntCounter::new(
            "verify_requests_total",
            "Total verification requests handled",
        )
        .expect("metric creation");
        registry
            .register(Box::new(verify_requests_total.clone()))
            .expect("metric registration");

        let verify_valid_total = IntCounter::new(
            "verify_valid_total",
            "Verification requests that returned True",
        )
        .expect("metric creation");
        registry
            .register(Box::new(verify_valid_total.clone()))
            .expect("metric registration");

        let verify_invalid_total = IntCounter::new(
            "verify_invalid_total",
            "Verification requests that returned False",
        )
        .expect("metric creation");
        registry
            .register(Box::new(verify_invalid_total.clone()))
            .expect("metric registration");

        let unknown_name_total = IntCounter::new(
            "unknown_name_total",
            "Verification requests for names with no directory record",
        )
        .expect("metric creation");
        registry
            .register(Box::new(unknown_name_total.clone()))
            .expect("metric registration");

        let infra_failures_total = IntCounter::new(
            "infra_failures_total",
            "Requests failed by an unreachable store or directory",
        )
        .expect("metric creation");
        registry
            .register(Box::new(infra_failures_total.clone()))
            .expect("metric registration");

        let verify_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "verify_latency_seconds",
                "End-to-end verification latency in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(verify_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            nonce_requests_total,
            verify_requests_total,
            verify_valid_total,
            verify_invalid_total,
            unknown_name_total,
            infra_failures_total,
            verify_latency_seconds,
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

/// Shared metrics state passed to axum handlers.
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
    fn encode_includes_registered_counters() {
        let metrics = ServiceMetrics::new();
        metrics.verify_valid_total.inc();
        let body = metrics.encode().unwrap();
        assert!(body.contains("wraplogin_verify_valid_total 1"));
        assert!(body.contains("wraplogin_nonce_requests_total 0"));
    }
}
