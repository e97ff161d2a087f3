//! # Prometheus Metrics
//!
//! Exposes operational metrics for the vault node. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so
//! they do not collide with any default global registry consumers.
//! Counters move inside the request handlers; the gauges are refreshed
//! by the pulse loop in `main`.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder,
};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it can
/// be shared across request handlers and background tasks.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of vault operations that committed.
    pub operations_total: IntCounter,
    /// Total number of vault operations the engine refused.
    pub refusals_total: IntCounter,
    /// Outstanding share supply.
    pub total_shares: Gauge,
    /// Managed total with accrual applied at the last pulse.
    pub total_value: Gauge,
    /// Investment requests on the book. The book is append-only, so this
    /// only ever rises.
    pub investment_requests: IntGauge,
    /// Withdrawal requests on the book. Append-only as well.
    pub withdrawal_requests: IntGauge,
    /// Currently connected WebSocket subscribers.
    pub ws_clients: IntGauge,
    /// Histogram of time spent inside engine calls, in seconds.
    pub op_duration_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("meridian".into()), None)
            .expect("failed to create prometheus registry");

        let operations_total = IntCounter::new(
            "vault_operations_total",
            "Total number of committed vault operations",
        )
        .expect("metric creation");
        registry
            .register(Box::new(operations_total.clone()))
            .expect("metric registration");

        let refusals_total = IntCounter::new(
            "vault_refusals_total",
            "Total number of vault operations the engine refused",
        )
        .expect("metric creation");
        registry
            .register(Box::new(refusals_total.clone()))
            .expect("metric registration");

        let total_shares = Gauge::new("total_shares", "Outstanding share supply")
            .expect("metric creation");
        registry
            .register(Box::new(total_shares.clone()))
            .expect("metric registration");

        let total_value = Gauge::new(
            "total_value",
            "Managed total with accrual applied at the last pulse",
        )
        .expect("metric creation");
        registry
            .register(Box::new(total_value.clone()))
            .expect("metric registration");

        let investment_requests = IntGauge::new(
            "investment_requests",
            "Investment requests recorded on the append-only book",
        )
        .expect("metric creation");
        registry
            .register(Box::new(investment_requests.clone()))
            .expect("metric registration");

        let withdrawal_requests = IntGauge::new(
            "withdrawal_requests",
            "Withdrawal requests recorded on the append-only book",
        )
        .expect("metric creation");
        registry
            .register(Box::new(withdrawal_requests.clone()))
            .expect("metric registration");

        let ws_clients =
            IntGauge::new("ws_clients", "Currently connected WebSocket subscribers")
                .expect("metric creation");
        registry
            .register(Box::new(ws_clients.clone()))
            .expect("metric registration");

        let op_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "op_duration_seconds",
                "Time spent inside vault engine calls, in seconds",
            )
            .buckets(vec![
                0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(op_duration_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            operations_total,
            refusals_total,
            total_shares,
            total_value,
            investment_requests,
            withdrawal_requests,
            ws_clients,
            op_duration_seconds,
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

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers via state.
pub type SharedMetrics = Arc<NodeMetrics>;

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
    fn registry_carries_the_meridian_prefix() {
        let metrics = NodeMetrics::new();
        metrics.operations_total.inc();
        metrics.total_shares.set(1_000.0);

        let body = metrics.encode().unwrap();
        assert!(body.contains("meridian_vault_operations_total 1"));
        assert!(body.contains("meridian_total_shares 1000"));
    }

    #[test]
    fn histogram_accepts_observations() {
        let metrics = NodeMetrics::new();
        metrics.op_duration_seconds.observe(0.000_2);
        metrics.op_duration_seconds.observe(0.02);

        let body = metrics.encode().unwrap();
        assert!(body.contains("meridian_op_duration_seconds_count 2"));
    }
}
