use castolo_client::adapters::{ApiClient, FileStorage};
use castolo_client::core::announcements::{AnnouncementBoard, DISMISSED_KEY};
use castolo_client::domain::model::MatchWinner;
use castolo_client::domain::ports::KeyValueStore;
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_dismissed_announcement_hidden_after_restart() {
    let server = MockServer::start_async().await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/announcements");
            then.status(200).json_body(json!([
                {"id": "a1", "title": "Torneo", "message": "Sábado 18hs", "type": "info",
                 "createdAt": "2024-05-01T10:00:00Z", "active": true},
                {"id": "a2", "title": "Corte", "message": "Mantenimiento", "type": "urgent",
                 "createdAt": "2024-05-02T10:00:00Z"},
                {"id": "a3", "title": "Viejo", "message": "-", "type": "warning",
                 "createdAt": "2024-01-01T10:00:00Z", "active": false}
            ]));
        })
        .await;

    let api = ApiClient::new(&server.base_url()).unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");

    {
        let storage = Arc::new(FileStorage::open(&path).unwrap());
        let mut board = AnnouncementBoard::load(storage).unwrap();
        assert_eq!(board.refresh(&api).await.len(), 3);
        assert_eq!(board.visible().len(), 2);

        board.dismiss("a1").unwrap();
        let ids: Vec<&str> = board.visible().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a2"]);
    }

    let storage = Arc::new(FileStorage::open(&path).unwrap());
    assert_eq!(
        storage.get_item(DISMISSED_KEY).unwrap().as_deref(),
        Some(r#"["a1"]"#)
    );
    let mut board = AnnouncementBoard::load(storage).unwrap();
    board.refresh(&api).await;
    let ids: Vec<&str> = board.visible().iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a2"]);
    assert_eq!(list.hits_async().await, 2);
}

#[tokio::test]
async fn test_announcement_fetch_failure_yields_empty_board() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/announcements");
            then.status(500);
        })
        .await;

    let api = ApiClient::new(&server.base_url()).unwrap();
    let dir = TempDir::new().unwrap();
    let storage = Arc::new(FileStorage::open(dir.path().join("s.json")).unwrap());
    let mut board = AnnouncementBoard::load(storage).unwrap();

    assert!(board.refresh(&api).await.is_empty());
    assert!(board.visible().is_empty());
}

#[tokio::test]
async fn test_match_history() {
    let server = MockServer::start_async().await;
    let history = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/matches/history")
                .query_param("limit", "5")
                .header("Accept", "application/json");
            then.status(200).json_body(json!({
                "matches": [
                    {"id": 1, "homePlayer": "juan", "awayPlayer": "pedro",
                     "scoreHome": 3, "scoreAway": 1, "playedOn": "2024-05-01T21:30:00"},
                    {"id": 2, "homePlayer": "ana", "awayPlayer": "luis",
                     "scoreHome": 0, "scoreAway": 0}
                ],
                "total": 2
            }));
        })
        .await;

    let api = ApiClient::new(&server.base_url()).unwrap();
    let result = api.match_history(5).await.unwrap();

    history.assert_async().await;
    assert_eq!(result.total, 2);
    assert_eq!(result.matches[0].winner(), MatchWinner::Home);
    assert_eq!(
        result.matches[0].played_on_display().as_deref(),
        Some("01/05/2024 21:30")
    );
    assert_eq!(result.matches[1].winner(), MatchWinner::Draw);
    assert!(result.matches[1].played_on_display().is_none());
}
