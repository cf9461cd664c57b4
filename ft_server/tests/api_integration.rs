//! Integration tests for the HTTP API on the in-memory backend.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use football_tournament::stats::MemoryPlayerRepository;
use football_tournament::sync::{LocalCache, MemoryRemoteStore, SyncConfig, SyncCoordinator};
use football_tournament::tournament::{AdminSecretHasher, TournamentConfig, TournamentManager};
use ft_server::api::{AppState, admin::ADMIN_SECRET_HEADER, create_router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

const SECRET: &str = "4321";

/// Helper to create a test server on fresh in-memory stores
fn create_test_server() -> axum::Router {
    let sync = SyncCoordinator::new(
        Arc::new(MemoryRemoteStore::new()),
        Arc::new(LocalCache::in_memory()),
        SyncConfig::default(),
    );
    let manager = TournamentManager::new(
        Arc::new(sync),
        Arc::new(MemoryPlayerRepository::new()),
        AdminSecretHasher::new("test_pepper_for_testing_only".to_string()),
        TournamentConfig::default(),
    );

    create_router(AppState {
        manager: Arc::new(manager),
        database: None,
        share_base_url: "http://cup.test/view".to_string(),
    })
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn admin_post(uri: &str, secret: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(ADMIN_SECRET_HEADER, secret)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Create a two-team tournament; returns its ID
async fn create_tournament(app: &axum::Router) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/tournaments")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "adminSecret": SECRET,
                "teams": [
                    {"key": "red", "displayName": "Red", "colorToken": "#e53935", "players": ["Ali", "Reza"]},
                    {"key": "black", "displayName": "Black", "colorToken": "#212121", "players": ["Kim"]}
                ]
            })
            .to_string(),
        ))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    body["tournament"]["id"].as_str().unwrap().to_string()
}

/// Start, score once for `team` with its first player, complete
async fn play(app: &axum::Router, id: &str, match_id: u32, team: &str) -> Value {
    let base = format!("/api/v1/tournaments/{}/matches/{}", id, match_id);

    let (status, view) = send(app, admin_post(&format!("{}/start", base), SECRET, json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let scorer = view["teams"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["key"] == team)
        .unwrap()["roster"][0]
        .clone();
    let event = json!({"type": "goal", "teamKey": team, "playerId": scorer, "minute": 10});
    let (status, _) = send(app, admin_post(&format!("{}/events", base), SECRET, event)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, view) = send(app, admin_post(&format!("{}/complete", base), SECRET, json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    view
}

// ============================================================================
// Health and Reads
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = create_test_server();
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"]["backend"], "memory");
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let app = create_test_server();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_create_and_read_tournament() {
    let app = create_test_server();
    let id = create_tournament(&app).await;

    let (status, list) = send(&app, get("/api/v1/tournaments")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([id.clone()]));

    let (status, view) = send(&app, get(&format!("/api/v1/tournaments/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["phase"], "setup");
    assert!(view.get("adminSecretHash").is_none());

    let (status, shared) = send(&app, get(&format!("/view?tournament={}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shared, view);

    let (status, players) = send(&app, get("/api/v1/players")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(players.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_create_returns_share_link() {
    let app = create_test_server();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/tournaments")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "adminSecret": SECRET,
                "teams": [
                    {"key": "a", "displayName": "A", "colorToken": "#111"},
                    {"key": "b", "displayName": "B", "colorToken": "#222"}
                ]
            })
            .to_string(),
        ))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["tournament"]["id"].as_str().unwrap();
    assert_eq!(
        body["shareLink"],
        format!("http://cup.test/view?tournament={}", id)
    );
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = create_test_server();
    let one_team = Request::builder()
        .method("POST")
        .uri("/api/v1/tournaments")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "adminSecret": SECRET,
                "teams": [{"key": "a", "displayName": "A", "colorToken": "#111"}]
            })
            .to_string(),
        ))
        .unwrap();

    let (status, body) = send(&app, one_team).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Not enough teams"));
}

#[tokio::test]
async fn test_unknown_tournament_is_404() {
    let app = create_test_server();
    let (status, _) = send(&app, get("/api/v1/tournaments/tournament_0_nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/view?tournament=tournament_0_nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/view")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Admin Writes
// ============================================================================

#[tokio::test]
async fn test_admin_secret_required() {
    let app = create_test_server();
    let id = create_tournament(&app).await;
    let uri = format!("/api/v1/tournaments/{}/group-stage", id);

    let no_header = Request::builder()
        .method("POST")
        .uri(&uri)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, no_header).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, admin_post(&uri, "0000", json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, view) = send(&app, get(&format!("/api/v1/tournaments/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["phase"], "setup");

    let verify = format!("/api/v1/tournaments/{}/verify", id);
    let (status, _) = send(&app, admin_post(&verify, SECRET, json!({}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_delete_tournament() {
    let app = create_test_server();
    let id = create_tournament(&app).await;
    let uri = format!("/api/v1/tournaments/{}", id);
    let delete = |secret: Option<&str>| {
        let mut builder = Request::builder().method("DELETE").uri(&uri);
        if let Some(secret) = secret {
            builder = builder.header(ADMIN_SECRET_HEADER, secret);
        }
        builder.body(Body::empty()).unwrap()
    };

    let (status, _) = send(&app, delete(None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, delete(Some("0000"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, delete(Some(SECRET))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, delete(Some(SECRET))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, ids) = send(&app, get("/api/v1/tournaments")).await;
    assert_eq!(ids, json!([]));
    let (_, players) = send(&app, get("/api/v1/players")).await;
    assert_eq!(players.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_full_tournament_over_http() {
    let app = create_test_server();
    let id = create_tournament(&app).await;

    let (status, view) = send(
        &app,
        admin_post(&format!("/api/v1/tournaments/{}/group-stage", id), SECRET, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["phase"], "groupStage");
    assert_eq!(view["groupMatches"].as_array().unwrap().len(), 1);

    let view = play(&app, &id, 1, "red").await;
    assert_eq!(view["groupMatches"][0]["status"], "completed");

    let (status, standings) =
        send(&app, get(&format!("/api/v1/tournaments/{}/standings", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(standings[0]["teamKey"], "red");
    assert_eq!(standings[0]["points"], 3);
    assert_eq!(standings[1]["teamKey"], "black");

    let (status, progress) = send(
        &app,
        admin_post(&format!("/api/v1/tournaments/{}/advance", id), SECRET, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["advanced"], true);
    assert_eq!(progress["tournament"]["phase"], "knockout");

    let view = play(&app, &id, 2, "red").await;
    assert_eq!(view["phase"], "completed");
    assert_eq!(view["champion"], "red");

    let (status, leaderboard) =
        send(&app, get(&format!("/api/v1/tournaments/{}/leaderboard", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(leaderboard["topScorers"]["count"], 2);

    let (status, players) = send(&app, get("/api/v1/players")).await;
    assert_eq!(status, StatusCode::OK);
    let ali = players
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == "Ali")
        .unwrap();
    assert_eq!(ali["goals"], 2);

    let (status, stats) = send(
        &app,
        admin_post(&format!("/api/v1/tournaments/{}/stats", id), SECRET, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["applied"], 0);
}

#[tokio::test]
async fn test_advance_blocked_is_not_an_error() {
    let app = create_test_server();
    let id = create_tournament(&app).await;
    send(
        &app,
        admin_post(&format!("/api/v1/tournaments/{}/group-stage", id), SECRET, json!({})),
    )
    .await;

    let (status, progress) = send(
        &app,
        admin_post(&format!("/api/v1/tournaments/{}/advance", id), SECRET, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["advanced"], false);
    assert!(progress["reason"].as_str().is_some());
    assert_eq!(progress["tournament"]["phase"], "groupStage");
}

#[tokio::test]
async fn test_invalid_writes_rejected() {
    let app = create_test_server();
    let id = create_tournament(&app).await;
    send(
        &app,
        admin_post(&format!("/api/v1/tournaments/{}/group-stage", id), SECRET, json!({})),
    )
    .await;

    let start = format!("/api/v1/tournaments/{}/matches/1/start", id);
    let (status, _) = send(&app, admin_post(&start, SECRET, json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    // Starting twice is an illegal transition
    let (status, _) = send(&app, admin_post(&start, SECRET, json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Player from another team
    let event = json!({"type": "goal", "teamKey": "red", "playerId": "nobody", "minute": 3});
    let (status, body) = send(
        &app,
        admin_post(&format!("/api/v1/tournaments/{}/matches/1/events", id), SECRET, event),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        admin_post(&format!("/api/v1/tournaments/{}/matches/99/complete", id), SECRET, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Lifetime stats only exist for completed tournaments
    let (status, _) = send(
        &app,
        admin_post(&format!("/api/v1/tournaments/{}/stats", id), SECRET, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
