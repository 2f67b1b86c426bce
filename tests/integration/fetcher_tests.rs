//! Integration tests for the HTTP fetcher

use blocked_domains::config::CrawlerConfig;
use blocked_domains::crawler::{FetchError, HttpFetcher, PageFetcher};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher() -> HttpFetcher {
    let config = CrawlerConfig {
        user_agent: "TestBot/1.0".to_string(),
        request_timeout_secs: 5,
        ..CrawlerConfig::default()
    };
    HttpFetcher::from_config(&config).expect("Failed to build client")
}

#[tokio::test]
async fn test_fetch_returns_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/blocked"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/search/blocked", mock_server.uri());
    let body = fetcher().fetch(&url, "https://example.com/").await.unwrap();

    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn test_fetch_sends_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(header("referer", "https://example.com/search/blocked"))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("matched"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = fetcher()
        .fetch(&mock_server.uri(), "https://example.com/search/blocked")
        .await
        .unwrap();

    assert_eq!(body, "matched");
}

#[tokio::test]
async fn test_fetch_decodes_utf8() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("被封锁的域名")
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    let body = fetcher().fetch(&mock_server.uri(), "").await.unwrap();
    assert_eq!(body, "被封锁的域名");
}

#[tokio::test]
async fn test_fetch_bad_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let url = format!("{}/search/blocked?page=3", mock_server.uri());
    let err = fetcher().fetch(&url, "").await.unwrap_err();

    match err {
        FetchError::BadStatus { url: failed, status } => {
            assert_eq!(failed, url);
            assert_eq!(status, 503);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_fetch_transport_error() {
    // Nothing listens on port 1.
    let uri = "http://127.0.0.1:1/";

    let err = fetcher().fetch(uri, "").await.unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }));
}
