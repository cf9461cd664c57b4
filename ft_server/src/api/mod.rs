//! HTTP/WebSocket API for the tournament server.
//!
//! # Endpoints Overview
//!
//! ## Public
//! - `POST /api/v1/tournaments` - Create a tournament (admin secret in the body)
//! - `GET  /api/v1/tournaments` - List tournament IDs
//! - `GET  /api/v1/tournaments/{id}` - Full tournament view
//! - `GET  /api/v1/tournaments/{id}/standings` - Group table
//! - `GET  /api/v1/tournaments/{id}/leaderboard` - Awards
//! - `GET  /api/v1/players` - Lifetime player records
//! - `GET  /view?tournament=<id>` - Target of share links
//!
//! ## Admin (`x-admin-secret` header required)
//! - `POST /api/v1/tournaments/{id}/verify`
//! - `POST /api/v1/tournaments/{id}/group-stage`
//! - `POST /api/v1/tournaments/{id}/advance`
//! - `POST /api/v1/tournaments/{id}/matches/{match_id}/start`
//! - `POST /api/v1/tournaments/{id}/matches/{match_id}/events`
//! - `POST /api/v1/tournaments/{id}/matches/{match_id}/complete`
//! - `POST /api/v1/tournaments/{id}/stats`
//! - `DELETE /api/v1/tournaments/{id}`
//!
//! ## WebSocket
//! - `GET /ws/{id}` - Live tournament views
//!
//! ## Health Check
//! - `GET /health`
//!
//! # CORS
//!
//! CORS is configured permissively; scoreboard pages are usually served from
//! another origin.

pub mod admin;
pub mod request_id;
pub mod tournaments;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
};
use football_tournament::{
    TournamentError, TournamentManager, db::Database, sync::SyncError,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::{logging, metrics};

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TournamentManager>,
    /// Present with the postgres backend; used by the health check
    pub database: Option<Database>,
    /// Page share links point at
    pub share_base_url: String,
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Map a tournament error to its HTTP status
pub fn status_for(err: &TournamentError) -> StatusCode {
    match err {
        TournamentError::NotFound(_) | TournamentError::MatchNotFound(_) => StatusCode::NOT_FOUND,
        TournamentError::Unauthorized => StatusCode::UNAUTHORIZED,
        TournamentError::InvalidPhase { .. }
        | TournamentError::RoundNotActive { .. }
        | TournamentError::InvalidTransition { .. }
        | TournamentError::SlotsUnfilled(_)
        | TournamentError::Precondition(_) => StatusCode::CONFLICT,
        TournamentError::Sync(SyncError::PermissionDenied) => StatusCode::FORBIDDEN,
        TournamentError::Sync(SyncError::NotFound(_)) => StatusCode::NOT_FOUND,
        TournamentError::Sync(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
        TournamentError::Sync(_) | TournamentError::Stats(_) | TournamentError::HashingFailed => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Convert a failed manager call into a response, logging what the client does not see
pub fn api_error(operation: &str, tournament_id: Option<&str>, err: TournamentError) -> ApiError {
    let status = status_for(&err);
    match &err {
        TournamentError::Unauthorized => {
            metrics::admin_auth_failures_total();
            logging::log_security_event(
                "admin_secret_rejected",
                tournament_id,
                &format!("Wrong admin secret for {}", operation),
            );
        }
        _ if status.is_server_error() => {
            log::error!("{} failed for {:?}: {}", operation, tournament_id, err);
        }
        _ => log::debug!("{} rejected for {:?}: {}", operation, tournament_id, err),
    }

    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// Create the complete API router with all endpoints and middleware.
///
/// ```rust,no_run
/// # use ft_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let root_routes = Router::new()
        .route("/health", get(health_check))
        .route("/view", get(tournaments::view_shared))
        .route("/ws/{tournament_id}", get(websocket::websocket_handler));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    let public_routes = Router::new()
        .route(
            "/tournaments",
            get(tournaments::list_tournaments).post(tournaments::create_tournament),
        )
        .route("/tournaments/{tournament_id}", get(tournaments::get_tournament))
        .route(
            "/tournaments/{tournament_id}/standings",
            get(tournaments::get_standings),
        )
        .route(
            "/tournaments/{tournament_id}/leaderboard",
            get(tournaments::get_leaderboard),
        )
        .route("/players", get(tournaments::list_players));

    let admin_routes = Router::new()
        .route(
            "/tournaments/{tournament_id}",
            delete(tournaments::delete_tournament),
        )
        .route("/tournaments/{tournament_id}/verify", post(tournaments::verify_admin))
        .route(
            "/tournaments/{tournament_id}/group-stage",
            post(tournaments::begin_group_stage),
        )
        .route("/tournaments/{tournament_id}/advance", post(tournaments::advance))
        .route(
            "/tournaments/{tournament_id}/matches/{match_id}/start",
            post(tournaments::start_match),
        )
        .route(
            "/tournaments/{tournament_id}/matches/{match_id}/events",
            post(tournaments::record_event),
        )
        .route(
            "/tournaments/{tournament_id}/matches/{match_id}/complete",
            post(tournaments::complete_match),
        )
        .route(
            "/tournaments/{tournament_id}/stats",
            post(tournaments::record_lifetime_stats),
        )
        .route_layer(axum::middleware::from_fn(admin::require_admin_secret));

    Router::new().merge(public_routes).merge(admin_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the storage backend answers, `503` otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (storage, storage_healthy) = match &state.database {
        Some(db) => ("postgres", db.health_check().await.is_ok()),
        None => ("memory", true),
    };

    let status_code = if storage_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if storage_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "storage": {
            "backend": storage,
            "healthy": storage_healthy,
        },
        "subscriptions": state.manager.sync().active_subscriptions(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
