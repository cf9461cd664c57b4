//! Admin secret middleware for tournament writes.
//!
//! The secret travels in the `x-admin-secret` header and is verified by the
//! tournament manager against the stored hash; this layer only extracts it.
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use ft_server::api::admin::AdminSecret;
//!
//! async fn handler(Extension(AdminSecret(secret)): Extension<AdminSecret>) -> String {
//!     format!("{} characters", secret.len())
//! }
//! # let _ = handler;
//! ```

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

use super::ErrorResponse;
use crate::{logging, metrics};

/// Header carrying the admin secret
pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

/// Admin secret as presented by the client, not yet verified
#[derive(Clone)]
pub struct AdminSecret(pub String);

impl std::fmt::Debug for AdminSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminSecret(<redacted>)")
    }
}

/// Reject requests without an admin secret; inject it for handlers otherwise
pub async fn require_admin_secret(mut request: Request, next: Next) -> Response {
    let secret = request
        .headers()
        .get(ADMIN_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    match secret {
        Some(secret) => {
            request.extensions_mut().insert(AdminSecret(secret));
            next.run(request).await
        }
        None => {
            metrics::admin_auth_failures_total();
            logging::log_security_event(
                "admin_secret_missing",
                None,
                &format!("No admin secret on {}", request.uri().path()),
            );
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Admin secret required".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Extension, Router, body::Body, http::Request as HttpRequest, routing::post,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/",
                post(|Extension(AdminSecret(secret)): Extension<AdminSecret>| async move {
                    secret
                }),
            )
            .route_layer(axum::middleware::from_fn(require_admin_secret))
    }

    #[tokio::test]
    async fn test_missing_header_rejected() {
        let response = app()
            .oneshot(HttpRequest::post("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_blank_header_rejected() {
        let response = app()
            .oneshot(
                HttpRequest::post("/")
                    .header(ADMIN_SECRET_HEADER, "   ")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_secret_injected() {
        let response = app()
            .oneshot(
                HttpRequest::post("/")
                    .header(ADMIN_SECRET_HEADER, "4321")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_secret_redacted_in_debug() {
        assert!(!format!("{:?}", AdminSecret("4321".into())).contains("4321"));
    }
}
