use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use newsflix::models::{ClickEvent, RecommendationRequest};
use newsflix::services::{HttpRecommendationClient, RecommendationApi};
use newsflix::AppError;

fn request() -> RecommendationRequest {
    RecommendationRequest {
        page_size: Some(36),
        surface: Some("for_you".to_string()),
        locale: Some("en-US".to_string()),
        ..RecommendationRequest::new("anon_1a2b3c", "5f0c2d1e-sess")
    }
}

#[tokio::test]
async fn test_fetch_recommendations_posts_request_and_parses_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recommendations"))
        .and(body_json(json!({
            "anonymous_id": "anon_1a2b3c",
            "session_id": "5f0c2d1e-sess",
            "page_size": 36,
            "surface": "for_you",
            "locale": "en-US"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "impression_id": "imp-1",
            "items": [
                {"item_id": "N101", "title": "Central bank holds rates", "position": 1, "final_score": 0.91},
                {"item_id": "N202", "title": "", "position": 2}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRecommendationClient::new(&server.uri()).unwrap();
    let batch = client.fetch_recommendations(&request()).await.unwrap();

    assert_eq!(batch.impression_id.as_deref(), Some("imp-1"));
    assert_eq!(batch.items.len(), 2);
    assert_eq!(batch.items[0].final_score, Some(0.91));
    assert_eq!(batch.items[1].position, 2);
}

#[tokio::test]
async fn test_non_success_status_is_request_failed_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recommendations"))
        .respond_with(ResponseTemplate::new(503).set_body_string("ranker warming up"))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRecommendationClient::new(&server.uri()).unwrap();
    let err = client.fetch_recommendations(&request()).await.unwrap_err();

    match err {
        AppError::RequestFailed { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "ranker warming up");
        }
        other => panic!("expected RequestFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_undecodable_success_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recommendations"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = HttpRecommendationClient::new(&server.uri()).unwrap();
    let err = client.fetch_recommendations(&request()).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidResponse(_)), "{:?}", err);
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_failed() {
    // Grab a free port, then release it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = HttpRecommendationClient::new(&format!("http://127.0.0.1:{}", port)).unwrap();
    let err = client.fetch_recommendations(&request()).await.unwrap_err();
    assert!(matches!(err, AppError::TransportFailed(_)), "{:?}", err);
}

#[tokio::test]
async fn test_log_click_sends_event_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/click"))
        .and(body_json(json!({
            "impression_id": "imp-1",
            "item_id": "b",
            "position": 2,
            "dwell_ms": 1500,
            "open_type": "modal_read"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRecommendationClient::new(&server.uri()).unwrap();
    let ack = client
        .log_click(&ClickEvent {
            impression_id: "imp-1".to_string(),
            item_id: "b".to_string(),
            position: 2,
            dwell_ms: 1500,
            open_type: "modal_read".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(ack.status, "ok");
}

#[tokio::test]
async fn test_log_click_failure_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/click"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRecommendationClient::new(&server.uri()).unwrap();
    let result = client
        .log_click(&ClickEvent {
            impression_id: "imp-1".to_string(),
            item_id: "a".to_string(),
            position: 1,
            dwell_ms: 0,
            open_type: "modal_read".to_string(),
        })
        .await;

    assert!(matches!(result, Err(AppError::RequestFailed { status: 500, .. })));
}

#[tokio::test]
async fn test_recent_clicks_default_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/anon_1a2b3c/recent_clicks"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "anonymous_id": "anon_1a2b3c",
            "recent_clicks": ["N9", "N3"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRecommendationClient::new(&server.uri()).unwrap();
    let recent = client.fetch_recent_clicks("anon_1a2b3c", None).await.unwrap();
    assert_eq!(recent, vec!["N9".to_string(), "N3".to_string()]);
}

#[tokio::test]
async fn test_recent_clicks_explicit_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/anon_1a2b3c/recent_clicks"))
        .and(query_param("limit", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "anonymous_id": "anon_1a2b3c",
            "recent_clicks": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRecommendationClient::new(&server.uri()).unwrap();
    let recent = client
        .fetch_recent_clicks("anon_1a2b3c", Some(3))
        .await
        .unwrap();
    assert!(recent.is_empty());
}

#[tokio::test]
async fn test_surface_passes_through_unmodified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recommendations"))
        .and(body_partial_json(json!({ "surface": "Weird Surface/β" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "impression_id": "imp-x",
            "items": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRecommendationClient::new(&server.uri()).unwrap();
    let mut req = request();
    req.surface = Some("Weird Surface/β".to_string());
    let batch = client.fetch_recommendations(&req).await.unwrap();
    assert!(batch.items.is_empty());
}

#[tokio::test]
async fn test_untitled_item_does_not_fail_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/recommendations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "impression_id": "imp-2",
            "items": [
                {"item_id": "N1", "title": "Harbour reopens", "position": 1},
                {"item_id": "N2", "title": null, "position": 2}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpRecommendationClient::new(&server.uri()).unwrap();
    let batch = client.fetch_recommendations(&request()).await.unwrap();

    assert_eq!(batch.items.len(), 2);
    assert_eq!(batch.items[1].title, "");
}
