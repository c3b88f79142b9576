//! Integration tests for the YouTube client.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zonglist_resolver::{MetadataResolver, ResolverError, YouTubeClient};

fn search_item(video_id: &str, title: &str, channel: &str) -> serde_json::Value {
    json!({
        "kind": "youtube#searchResult",
        "id": { "kind": "youtube#video", "videoId": video_id },
        "snippet": {
            "title": title,
            "channelTitle": channel,
            "publishedAt": "2009-10-25T06:57:33Z",
            "thumbnails": {
                "default": { "url": format!("https://i.ytimg.com/vi/{video_id}/default.jpg") },
                "medium": { "url": format!("https://i.ytimg.com/vi/{video_id}/mqdefault.jpg") }
            }
        }
    })
}

fn details_item(video_id: &str, duration: &str) -> serde_json::Value {
    json!({
        "kind": "youtube#video",
        "id": video_id,
        "contentDetails": { "duration": duration }
    })
}

async fn client(server: &MockServer) -> YouTubeClient {
    YouTubeClient::builder()
        .api_key("test-key")
        .api_base(server.uri())
        .max_results(5)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_search_joins_details_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "queen"))
        .and(query_param("part", "snippet"))
        .and(query_param("type", "video"))
        .and(query_param("videoCategoryId", "10"))
        .and(query_param("maxResults", "5"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                search_item("fJ9rUzIMcZQ", "Queen – Bohemian Rhapsody", "Queen Official"),
                search_item("a01QQZyl-_I", "Queen - Under Pressure", "Queen Official")
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Details come back in a different order than the search hits
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("part", "contentDetails"))
        .and(query_param("id", "fJ9rUzIMcZQ,a01QQZyl-_I"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                details_item("a01QQZyl-_I", "PT4M8S"),
                details_item("fJ9rUzIMcZQ", "PT5M55S")
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let results = client(&server).await.search("queen").await.unwrap();
    assert_eq!(results.len(), 2);

    assert_eq!(results[0].video_id, "fJ9rUzIMcZQ");
    assert_eq!(results[0].title, "Queen – Bohemian Rhapsody");
    assert_eq!(results[0].artist, "Queen Official");
    assert_eq!(
        results[0].thumbnail,
        "https://i.ytimg.com/vi/fJ9rUzIMcZQ/mqdefault.jpg"
    );
    assert_eq!(results[0].duration, "5:55");
    assert_eq!(results[1].duration, "4:08");
}

#[tokio::test]
async fn test_search_without_hits_skips_details() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let results = client(&server).await.search("nothing here").await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_blank_query_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    assert!(client(&server).await.search("  ").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_api_error_surfaces_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "The request cannot be completed because you have exceeded your quota." }
        })))
        .mount(&server)
        .await;

    let err = client(&server).await.search("queen").await.unwrap_err();
    match err {
        ResolverError::Api { status, message } => {
            assert_eq!(status, 403);
            assert!(message.contains("quota"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_lookup_single_video() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("part", "snippet,contentDetails"))
        .and(query_param("id", "fJ9rUzIMcZQ"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "fJ9rUzIMcZQ",
                "snippet": {
                    "title": "Bohemian Rhapsody",
                    "channelTitle": "Queen Official",
                    "description": "Remastered",
                    "thumbnails": { "medium": { "url": "https://img/m.jpg" } }
                },
                "contentDetails": { "duration": "PT1H2M3S" }
            }]
        })))
        .mount(&server)
        .await;

    let track = client(&server).await.lookup("fJ9rUzIMcZQ").await.unwrap().unwrap();
    assert_eq!(track.title, "Bohemian Rhapsody");
    assert_eq!(track.duration, "1:2:03");
    assert_eq!(track.thumbnail, "https://img/m.jpg");
}

#[tokio::test]
async fn test_lookup_unknown_video() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    assert!(client(&server).await.lookup("missing").await.unwrap().is_none());
}
