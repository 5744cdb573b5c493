//! HTTP route tests for the channel ranking service.

#![cfg(feature = "service")]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use channel_ranking::service::{access_log_middleware, create_router, ServiceState, REQUEST_ID_HEADER};
use channel_ranking::{Channel, ChannelRegistry, GrowthPolicy, InMemoryStore};
use tower::ServiceExt;

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

async fn setup() -> (Router, Arc<ChannelRegistry>) {
    let registry = Arc::new(
        ChannelRegistry::open(Arc::new(InMemoryStore::new()), GrowthPolicy::default()).await,
    );
    let app = create_router(ServiceState::new(Arc::clone(&registry)));
    (app, registry)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get_json<T: serde::de::DeserializeOwned>(app: &Router, uri: &str) -> (StatusCode, T) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_str(&body).unwrap())
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat commands
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_register_command() {
    let (app, registry) = setup().await;

    let (status, body) = get(&app, "/add?user_id=u1&user_name=Alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Alice has been added to the ranking!");
    assert_eq!(registry.len().await, 1);

    let (status, body) = get(&app, "/add?user_id=u1&user_name=Alice").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, "Alice is already registered.");

    let (status, body) = get(&app, "/add?user_id=u2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "user_id and user_name are required");
}

#[tokio::test]
async fn test_growth_commands_stay_in_range() {
    let (app, registry) = setup().await;
    get(&app, "/add?user_id=u1&user_name=Alice").await;

    let cases = [
        ("/video", "Video posted!", 10, 150),
        ("/short", "Posted Short Video", 20, 200),
        ("/viral", "Posted Viral Video", 50, 300),
        ("/trend", "Posted Trend Video", 100, 500),
    ];

    for (route, reply, min, max) in cases {
        let before = registry.get(&"u1".into()).await.unwrap().growth;

        let (status, body) = get(&app, &format!("{route}?user_id=u1")).await;
        assert_eq!(status, StatusCode::OK, "{route}");
        assert_eq!(body, reply);

        let added = registry.get(&"u1".into()).await.unwrap().growth - before;
        assert!((min..=max).contains(&added), "{route} added {added}");
    }
}

#[tokio::test]
async fn test_growth_command_errors() {
    let (app, _) = setup().await;

    let (status, body) = get(&app, "/video?user_id=ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Use !wall to add it to your system");

    let (status, body) = get(&app, "/trend").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "user_id is required");
}

#[tokio::test]
async fn test_growth_check_formats_thousands() {
    let (app, registry) = setup().await;
    get(&app, "/add?user_id=u1&user_name=Alice").await;
    registry.add_growth(&"u1".into(), 12_345).await.unwrap();

    let (status, body) = get(&app, "/growth-check?user_id=u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Alice's current Growth is 12,345.");

    let (status, _) = get(&app, "/growth-check?user_id=ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_command() {
    let (app, _) = setup().await;
    get(&app, "/add?user_id=u1&user_name=Alice").await;

    let (status, body) = get(&app, "/clear").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "All channels have been cleared.");

    let (_, all): (_, Vec<Channel>) = get_json(&app, "/channels/all").await;
    assert!(all.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rankings() {
    let (app, registry) = setup().await;
    for (id, name) in [("a", "Alpha"), ("b", "Bravo"), ("c", "Charlie")] {
        registry.register(id.into(), name).await.unwrap();
    }
    registry.add_growth(&"b".into(), 7200).await.unwrap();
    registry.add_growth(&"c".into(), 800).await.unwrap();
    registry.convert_tick().await;

    let (status, top): (_, Vec<Channel>) = get_json(&app, "/channels").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = top.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "c", "a"]);
    assert_eq!(top[0].subscribers, 10);

    let (_, faster): (_, Vec<Channel>) = get_json(&app, "/growth/faster").await;
    assert_eq!(faster[0].id.as_str(), "b");
    assert_eq!(faster[0].growth, 7190);
}

#[tokio::test]
async fn test_ranking_is_capped() {
    let (app, registry) = setup().await;
    for i in 0..120 {
        registry.register(format!("u{i}").into(), format!("User {i}")).await.unwrap();
    }

    let (_, top): (_, Vec<Channel>) = get_json(&app, "/channels").await;
    assert_eq!(top.len(), 105);

    let (_, all): (_, Vec<Channel>) = get_json(&app, "/channels/all").await;
    assert_eq!(all.len(), 120);
}

#[tokio::test]
async fn test_channel_lookup() {
    let (app, registry) = setup().await;
    registry.register("u1".into(), "Alice").await.unwrap();

    let (status, channel): (_, Channel) = get_json(&app, "/channel/u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(channel.name, "Alice");

    let (status, body): (_, serde_json::Value) = get_json(&app, "/channel/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Channel not found.");
}

#[tokio::test]
async fn test_search() {
    let (app, registry) = setup().await;
    registry.register("1".into(), "GamerAlice").await.unwrap();
    registry.register("2".into(), "Bob").await.unwrap();

    let (status, found): (_, Vec<Channel>) = get_json(&app, "/search?query=ALICE").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "GamerAlice");

    let (status, body): (_, serde_json::Value) = get_json(&app, "/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Query parameter is required.");
    assert_eq!(body["code"], "MISSING_INPUT");
}

#[tokio::test]
async fn test_battle_pair() {
    let (app, registry) = setup().await;
    registry.register("a".into(), "Alpha").await.unwrap();

    let (status, body): (_, serde_json::Value) = get_json(&app, "/battle/auto").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INSUFFICIENT_DATA");

    registry.register("b".into(), "Bravo").await.unwrap();
    let (status, pair): (_, Vec<Channel>) = get_json(&app, "/battle/auto").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pair.len(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let (app, registry) = setup().await;
    registry.register("u1".into(), "Alice").await.unwrap();
    registry.convert_tick().await;

    let (status, body): (_, serde_json::Value) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["channel_count"], 1);
    assert_eq!(body["ticks_completed"], 1);
    assert_eq!(body["tick_interval_ms"], 5000);
    assert_eq!(body["registry_fingerprint"], registry.fingerprint().await.unwrap());

    let (status, body): (_, serde_json::Value) = get_json(&app, "/health/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");
}

#[tokio::test]
async fn test_access_log_echoes_request_id() {
    let (app, _) = setup().await;
    let app = app.layer(axum::middleware::from_fn(access_log_middleware));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health/live")
                .header(REQUEST_ID_HEADER, "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-42");

    let response = app
        .oneshot(Request::builder().uri("/channel/ghost").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!response.headers()[REQUEST_ID_HEADER].is_empty());
}

#[tokio::test]
async fn test_static_fallback_serves_index() {
    let (app, _) = setup().await;
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>ranking</h1>").unwrap();
    let app = app.fallback_service(tower_http::services::ServeDir::new(dir.path()));

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<h1>ranking</h1>");

    let (status, _) = get(&app, "/missing.css").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
