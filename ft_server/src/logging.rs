//! Structured logging setup.
//!
//! The library crate logs through `log`; the subscriber's `tracing-log`
//! bridge picks those records up alongside the server's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging.
///
/// Log levels come from `RUST_LOG`, defaulting to `info` with noisy
/// dependencies turned down.
///
/// # Example
///
/// ```no_run
/// use ft_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a rejected or suspicious admin action
///
/// # Example
///
/// ```
/// use ft_server::logging::log_security_event;
///
/// log_security_event(
///     "admin_secret_rejected",
///     Some("tournament_1700000000000_ab12cd"),
///     "Wrong admin secret for start_match",
/// );
/// ```
pub fn log_security_event(event_type: &str, tournament_id: Option<&str>, message: &str) {
    tracing::warn!(
        event_type = event_type,
        tournament_id = tournament_id,
        "SECURITY: {}",
        message
    );
}

/// Log a completed API request; slow requests are raised to `warn`
pub fn log_api_request(method: &str, path: &str, status_code: u16, duration_ms: u64) {
    if duration_ms > 1000 {
        tracing::warn!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "Slow API request"
        );
    } else {
        tracing::info!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_security_event() {
        log_security_event("admin_secret_rejected", Some("tournament_1"), "Test message");
        log_security_event("admin_secret_missing", None, "No header");
    }

    #[test]
    fn test_log_api_request() {
        log_api_request("GET", "/api/v1/tournaments", 200, 45);
        log_api_request("POST", "/api/v1/tournaments", 201, 1500);
    }
}
