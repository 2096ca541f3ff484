use insalubre_ranking::handlers;
use insalubre_ranking::models::ranking::RunSummary;
use insalubre_ranking::services::{ranked_index::RankedIndex, ranking};
use insalubre_ranking::storage::RankingStore;
use ntex::http::StatusCode;
use ntex::web::{test, App};
use std::sync::Arc;

fn seeded_store(dir: &tempfile::TempDir) -> Arc<RankingStore> {
    let store = RankingStore::new(dir.path().join("ranking.json"));
    let mut index = RankedIndex::new();
    for (player, score, died) in [("B", 200, false), ("A", 50, true), ("C", 100, false)] {
        ranking::record_run(
            &mut index,
            RunSummary {
                player: player.into(),
                score,
                events_survived: 3,
                bosses_defeated: 1,
                died,
            },
        )
        .unwrap();
    }
    store.save(&index).unwrap();
    Arc::new(store)
}

async fn get_json(store: Arc<RankingStore>, uri: &str) -> (StatusCode, serde_json::Value) {
    let app = test::init_service(
        App::new()
            .state(store)
            .configure(handlers::configure),
    )
    .await;
    let req = test::TestRequest::get().uri(uri).to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[ntex::test]
async fn test_health() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = get_json(seeded_store(&dir), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[ntex::test]
async fn test_ranking_endpoint_sorts_by_score() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = get_json(seeded_store(&dir), "/api/ranking").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["players"][0]["name"], "B");
    assert_eq!(body["players"][1]["name"], "C");
    assert_eq!(body["stats"]["totalPlayers"], 3);
}

#[ntex::test]
async fn test_ranking_rejects_negative_limit() {
    let dir = tempfile::tempdir().unwrap();
    let (status, _) = get_json(seeded_store(&dir), "/api/ranking?limit=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[ntex::test]
async fn test_top_rejects_negative_n() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = get_json(seeded_store(&dir), "/api/top?n=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[ntex::test]
async fn test_top_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = get_json(seeded_store(&dir), "/api/top?n=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "C");
    assert_eq!(body[1]["name"], "B");
}

#[ntex::test]
async fn test_player_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir);
    let (status, body) = get_json(store.clone(), "/api/player/A").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bestScore"], 50);
    assert_eq!(body["deathCount"], 1);
    assert_eq!(body["recentHistory"], serde_json::json!([50]));

    let (status, body) = get_json(store, "/api/player/Nobody").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[ntex::test]
async fn test_stats_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let (status, body) = get_json(seeded_store(&dir), "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalPlayers"], 3);
    assert_eq!(body["totalDeaths"], 1);
}

#[ntex::test]
async fn test_corrupt_ranking_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = seeded_store(&dir);
    std::fs::write(store.path(), "{").unwrap();
    let (status, _) = get_json(store, "/api/ranking").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

