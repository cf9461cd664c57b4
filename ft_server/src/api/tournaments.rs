//! Tournament API handlers.
//!
//! Reads are public. Writes carry the admin secret in the `x-admin-secret`
//! header (see [`super::admin`]) except creation, where the secret is chosen
//! and sent in the body. Every write responds with the fresh tournament view.
//!
//! # Examples
//!
//! Create a tournament:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/tournaments \
//!   -H "Content-Type: application/json" \
//!   -d '{"adminSecret":"4321","teams":[
//!         {"key":"red","displayName":"Red","colorToken":"#e53935","players":["Ali","Reza"]},
//!         {"key":"black","displayName":"Black","colorToken":"#212121","players":["Kim"]}]}'
//! ```
//!
//! Record a goal:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/tournaments/$ID/matches/1/events \
//!   -H "x-admin-secret: 4321" -H "Content-Type: application/json" \
//!   -d '{"type":"goal","teamKey":"red","playerId":"player_ali","minute":12}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
};
use football_tournament::{
    standings::{Leaderboard, StandingsRow},
    stats::PlayerRecord,
    tournament::{
        MatchEvent, MatchId, Progress, TeamSetup, Tournament, TournamentId, TournamentResult,
        TournamentView,
    },
};
use serde::{Deserialize, Serialize};

use super::admin::AdminSecret;
use super::{ApiResult, AppState, ErrorResponse, api_error};
use crate::metrics;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournamentRequest {
    pub admin_secret: String,
    pub teams: Vec<TeamSetup>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournamentResponse {
    pub tournament: TournamentView,
    pub share_link: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMatchRequest {
    #[serde(default)]
    pub keeper1: Option<String>,
    #[serde(default)]
    pub keeper2: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub advanced: bool,
    /// Why nothing changed, when `advanced` is false
    pub reason: Option<String>,
    pub tournament: TournamentView,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Player records updated by this call
    pub applied: usize,
}

#[derive(Debug, Deserialize)]
pub struct ShareQuery {
    pub tournament: Option<String>,
}

/// Count the write and translate its error
fn write_result<T>(operation: &str, id: &str, result: TournamentResult<T>) -> ApiResult<T> {
    metrics::tournament_writes_total(operation, result.is_ok());
    result.map_err(|e| api_error(operation, Some(id), e))
}

fn view_of(tournament: &Tournament) -> Json<TournamentView> {
    Json(TournamentView::from_tournament(tournament))
}

/// Create a tournament in the setup phase.
///
/// # Response
///
/// `201 Created` with the view and a share link.
///
/// # Errors
///
/// - `400 Bad Request`: fewer than two teams, duplicate team keys or players, weak secret
/// - `503 Service Unavailable`: remote store unreachable
pub async fn create_tournament(
    State(state): State<AppState>,
    Json(request): Json<CreateTournamentRequest>,
) -> ApiResult<(StatusCode, Json<CreateTournamentResponse>)> {
    let result = state
        .manager
        .create_tournament(&request.admin_secret, request.teams)
        .await;
    metrics::tournament_writes_total("create", result.is_ok());
    let tournament = result.map_err(|e| api_error("create", None, e))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateTournamentResponse {
            share_link: state.manager.share_link(&state.share_base_url, &tournament.id),
            tournament: TournamentView::from_tournament(&tournament),
        }),
    ))
}

pub async fn list_tournaments(State(state): State<AppState>) -> ApiResult<Json<Vec<TournamentId>>> {
    state
        .manager
        .list()
        .await
        .map(Json)
        .map_err(|e| api_error("list", None, e))
}

/// Full read model: teams, fixtures, bracket, standings, leaderboard
pub async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<String>,
) -> ApiResult<Json<TournamentView>> {
    state
        .manager
        .view(&tournament_id)
        .await
        .map(Json)
        .map_err(|e| api_error("view", Some(&tournament_id), e))
}

/// Landing endpoint for share links (`/view?tournament=<id>`)
pub async fn view_shared(
    State(state): State<AppState>,
    Query(query): Query<ShareQuery>,
) -> ApiResult<Json<TournamentView>> {
    let tournament_id = query
        .tournament
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Missing tournament parameter".to_string(),
                }),
            )
        })?;
    get_tournament(State(state), Path(tournament_id)).await
}

pub async fn get_standings(
    State(state): State<AppState>,
    Path(tournament_id): Path<String>,
) -> ApiResult<Json<Vec<StandingsRow>>> {
    state
        .manager
        .standings(&tournament_id)
        .await
        .map(Json)
        .map_err(|e| api_error("standings", Some(&tournament_id), e))
}

pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(tournament_id): Path<String>,
) -> ApiResult<Json<Leaderboard>> {
    state
        .manager
        .leaderboard(&tournament_id)
        .await
        .map(Json)
        .map_err(|e| api_error("leaderboard", Some(&tournament_id), e))
}

/// Lifetime records across all tournaments
pub async fn list_players(State(state): State<AppState>) -> ApiResult<Json<Vec<PlayerRecord>>> {
    state
        .manager
        .players()
        .await
        .map(Json)
        .map_err(|e| api_error("players", None, e))
}

/// Check an admin secret; `204 No Content` when it matches
pub async fn verify_admin(
    State(state): State<AppState>,
    Extension(AdminSecret(secret)): Extension<AdminSecret>,
    Path(tournament_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .manager
        .verify_admin(&tournament_id, &secret)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(|e| api_error("verify", Some(&tournament_id), e))
}

/// Delete a tournament; `204 No Content` on success.
///
/// Lifetime player records keep what the tournament contributed.
pub async fn delete_tournament(
    State(state): State<AppState>,
    Extension(AdminSecret(secret)): Extension<AdminSecret>,
    Path(tournament_id): Path<String>,
) -> ApiResult<StatusCode> {
    let result = state
        .manager
        .delete_tournament(&tournament_id, &secret)
        .await;
    write_result("delete", &tournament_id, result).map(|_| StatusCode::NO_CONTENT)
}

/// Generate round-robin fixtures and enter the group stage.
///
/// # Errors
///
/// - `401 Unauthorized`: wrong admin secret
/// - `409 Conflict`: not in setup
pub async fn begin_group_stage(
    State(state): State<AppState>,
    Extension(AdminSecret(secret)): Extension<AdminSecret>,
    Path(tournament_id): Path<String>,
) -> ApiResult<Json<TournamentView>> {
    let result = state
        .manager
        .begin_group_stage(&tournament_id, &secret)
        .await;
    write_result("group_stage", &tournament_id, result).map(|t| view_of(&t))
}

/// Try the next progression step.
///
/// An unmet precondition still answers `200 OK` with `advanced: false`.
pub async fn advance(
    State(state): State<AppState>,
    Extension(AdminSecret(secret)): Extension<AdminSecret>,
    Path(tournament_id): Path<String>,
) -> ApiResult<Json<AdvanceResponse>> {
    let result = state.manager.advance(&tournament_id, &secret).await;
    let response = match write_result("advance", &tournament_id, result)? {
        Progress::Advanced(tournament) => AdvanceResponse {
            advanced: true,
            reason: None,
            tournament: TournamentView::from_tournament(&tournament),
        },
        Progress::Unchanged { tournament, reason } => AdvanceResponse {
            advanced: false,
            reason: Some(reason.to_string()),
            tournament: TournamentView::from_tournament(&tournament),
        },
    };
    Ok(Json(response))
}

/// Kick off a match; the body may name goalkeepers (`{}` keeps the defaults)
pub async fn start_match(
    State(state): State<AppState>,
    Extension(AdminSecret(secret)): Extension<AdminSecret>,
    Path((tournament_id, match_id)): Path<(String, MatchId)>,
    Json(request): Json<StartMatchRequest>,
) -> ApiResult<Json<TournamentView>> {
    let result = state
        .manager
        .start_match(
            &tournament_id,
            &secret,
            match_id,
            request.keeper1.as_deref(),
            request.keeper2.as_deref(),
        )
        .await;
    write_result("start_match", &tournament_id, result).map(|t| view_of(&t))
}

/// Append a live event to an in-progress match
pub async fn record_event(
    State(state): State<AppState>,
    Extension(AdminSecret(secret)): Extension<AdminSecret>,
    Path((tournament_id, match_id)): Path<(String, MatchId)>,
    Json(event): Json<MatchEvent>,
) -> ApiResult<Json<TournamentView>> {
    let result = state
        .manager
        .record_event(&tournament_id, &secret, match_id, event)
        .await;
    write_result("record_event", &tournament_id, result).map(|t| view_of(&t))
}

/// Final whistle; knockout progression follows automatically when enabled
pub async fn complete_match(
    State(state): State<AppState>,
    Extension(AdminSecret(secret)): Extension<AdminSecret>,
    Path((tournament_id, match_id)): Path<(String, MatchId)>,
) -> ApiResult<Json<TournamentView>> {
    let result = state
        .manager
        .complete_match(&tournament_id, &secret, match_id)
        .await;
    write_result("complete_match", &tournament_id, result).map(|t| view_of(&t))
}

/// Re-run the lifetime stats fold of a completed tournament
pub async fn record_lifetime_stats(
    State(state): State<AppState>,
    Extension(AdminSecret(secret)): Extension<AdminSecret>,
    Path(tournament_id): Path<String>,
) -> ApiResult<Json<StatsResponse>> {
    let result = state
        .manager
        .record_lifetime_stats(&tournament_id, &secret)
        .await;
    write_result("lifetime_stats", &tournament_id, result)
        .map(|applied| Json(StatsResponse { applied }))
}
