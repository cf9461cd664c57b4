//! Prometheus metrics for the tournament server.
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter, so the
//! helpers are safe to call from tests.
//!
//! ```rust,no_run
//! use ft_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", "/api/v1/tournaments", 201);
//! metrics::tournament_writes_total("create", true);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter; metrics are served at `http://<addr>/metrics`
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record a completed HTTP request
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// A live view connection opened
pub fn websocket_connected() {
    metrics::counter!("websocket_connections_total").increment(1);
    metrics::gauge!("websocket_connections_active").increment(1.0);
}

/// A live view connection closed
pub fn websocket_disconnected() {
    metrics::gauge!("websocket_connections_active").decrement(1.0);
}

/// Increment WebSocket messages sent counter
pub fn websocket_messages_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

/// Increment WebSocket messages received counter
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

// ============================================================================
// Tournament Metrics
// ============================================================================

/// Record an admin write against a tournament
pub fn tournament_writes_total(operation: &str, success: bool) {
    metrics::counter!("tournament_writes_total",
        "operation" => operation.to_string(),
        "success" => success.to_string()
    )
    .increment(1);
}

/// Record a rejected admin secret
pub fn admin_auth_failures_total() {
    metrics::counter!("admin_auth_failures_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter() {
        http_requests_total("GET", "/health", 200);
        http_request_duration_ms("GET", "/health", 1.5);
        websocket_connected();
        websocket_messages_sent();
        websocket_messages_received();
        websocket_disconnected();
        tournament_writes_total("advance", false);
        admin_auth_failures_total();
    }
}
