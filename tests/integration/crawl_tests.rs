//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small paginated listing and run the
//! full pipeline end-to-end into a temporary output directory.

use blocked_domains::config::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, PagerConfig, RowConfig, SiteConfig,
    TargetEntry,
};
use blocked_domains::crawler::Coordinator;
use blocked_domains::BlockedError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOMAIN_REGEX: &str =
    r"^/(https?/)?([a-zA-Z0-9][-_a-zA-Z0-9]{0,62}(\.[a-zA-Z0-9][-_a-zA-Z0-9]{0,62})+)$";
const IP_REGEX: &str = r"(([0-9]{1,3}\.){3}[0-9]{1,3})";

/// Creates a test configuration for one target served by `base_url`
fn create_test_config(base_url: &str, out: &Path, from: u32, to: Option<u32>) -> Config {
    Config {
        crawler: CrawlerConfig {
            concurrency: Some(2),
            max_retries: 2,
            retry_delay_ms: 0,
            channel_capacity: 8,
            request_timeout_secs: 5,
            user_agent: "TestBot/1.0".to_string(),
        },
        site: SiteConfig {
            base_url: format!("{}/search/", base_url),
            probe_suffix: "?page=0".to_string(),
            page_suffix: "?page=".to_string(),
        },
        pager: PagerConfig {
            container: "ul.pager".to_string(),
            link: "li.pager-last a".to_string(),
            attr: "href".to_string(),
            splitter: "?page=".to_string(),
        },
        rows: RowConfig {
            container: "table.gf-header tbody tr".to_string(),
            link: "td.first a".to_string(),
            attr: "href".to_string(),
            blocked: "td.blocked".to_string(),
            restricted: "td.restricted".to_string(),
        },
        filter: FilterConfig {
            percent: 50,
            domain_regex: DOMAIN_REGEX.to_string(),
            domain_group: None,
            ip_regex: IP_REGEX.to_string(),
        },
        output: OutputConfig {
            dir: out.to_string_lossy().into_owned(),
            ..OutputConfig::default()
        },
        targets: vec![TargetEntry {
            name: "blocked".to_string(),
            path: "blocked".to_string(),
            referer: format!("{}/search/blocked", base_url),
            enabled: true,
            from,
            to,
        }],
    }
}

/// Renders a listing page with an optional paging control
fn listing(last_page: Option<u32>, rows: &[(&str, &str, &str)]) -> String {
    let pager = last_page
        .map(|last| {
            format!(
                r#"<ul class="pager"><li class="pager-first"><a href="/search/blocked?page=0">first</a></li><li class="pager-last"><a href="/search/blocked?page={}">last</a></li></ul>"#,
                last
            )
        })
        .unwrap_or_default();

    let rows: String = rows
        .iter()
        .map(|(href, blocked, restricted)| {
            format!(
                r#"<tr><td class="first"><a href="{}">{}</a></td><td class="blocked">{}</td><td class="restricted">{}</td></tr>"#,
                href, href, blocked, restricted
            )
        })
        .collect();

    format!(
        r#"<html><body><table class="gf-header"><thead><tr><th>Domain</th></tr></thead><tbody>{}</tbody></table>{}</body></html>"#,
        rows, pager
    )
}

async fn mount_page(server: &MockServer, page: u32, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/search/blocked"))
        .and(query_param("page", page.to_string()))
        .respond_with(response)
        .mount(server)
        .await;
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

#[tokio::test]
async fn test_full_crawl_end_to_end() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        0,
        html(listing(
            Some(3),
            &[
                ("/google.com", "100%", ""),
                ("/https/www.google.com", "100%", ""),
                ("/Facebook.COM", "95%", ""),
                ("/example.org", "10%", ""),
            ],
        )),
    )
    .await;
    mount_page(
        &mock_server,
        1,
        html(listing(
            Some(3),
            &[
                ("/8.8.8.8", "100%", ""),
                ("/mail.google.com", "80%", ""),
                // Restricted wins over blocked when both are filled in.
                ("/both.net", "90%", "20%"),
                ("/restricted.io", "", "70%"),
            ],
        )),
    )
    .await;
    mount_page(&mock_server, 2, ResponseTemplate::new(500)).await;
    mount_page(
        &mock_server,
        3,
        html(listing(Some(3), &[("/twitter.com", "60%", "")])),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("publish");
    let config = create_test_config(&base_url, &out, 0, None);

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let summary = coordinator.run().await.expect("Run failed");

    assert_eq!(
        read_lines(&out.join("domains.txt")),
        vec!["facebook.com", "google.com", "restricted.io", "twitter.com"]
    );
    assert_eq!(read_lines(&out.join("ip.txt")), vec!["8.8.8.8"]);

    let raw = read_lines(&out.join("raw.txt"));
    assert_eq!(raw.len(), 9);
    assert!(raw.contains(&"/facebook.com | 95".to_string()));
    assert!(raw.contains(&"/both.net | 20".to_string()));
    assert!(raw.contains(&"/example.org | 10".to_string()));

    assert_eq!(summary.jobs_total, 4);
    assert_eq!(summary.jobs_succeeded, 3);
    assert_eq!(summary.jobs_failed, 1);
    assert_eq!(summary.redundant, 2);
    assert_eq!(summary.targets[0].max_page, 3);

    // Probe + page 0 share a URL; page 2 is attempted twice.
    let requests = mock_server.received_requests().await.unwrap();
    let page_two = requests
        .iter()
        .filter(|r| r.url.query() == Some("page=2"))
        .count();
    assert_eq!(page_two, 2);
}

#[tokio::test]
async fn test_requests_carry_referer() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let referer = format!("{}/search/blocked", base_url);

    Mock::given(method("GET"))
        .and(path("/search/blocked"))
        .and(header("referer", referer.as_str()))
        .respond_with(html(listing(Some(0), &[("/a.com", "100%", "")])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("publish");
    let config = create_test_config(&base_url, &out, 0, None);

    Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(read_lines(&out.join("domains.txt")), vec!["a.com"]);
}

#[tokio::test]
async fn test_flaky_page_is_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, 0, html(listing(Some(1), &[]))).await;

    // First request to page 1 fails, the retry succeeds.
    Mock::given(method("GET"))
        .and(path("/search/blocked"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        1,
        html(listing(Some(1), &[("/late.com", "100%", "")])),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("publish");
    let config = create_test_config(&base_url, &out, 0, None);

    let summary = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(summary.jobs_failed, 0);
    assert_eq!(read_lines(&out.join("domains.txt")), vec!["late.com"]);
}

#[tokio::test]
async fn test_probe_failure_aborts_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, 0, ResponseTemplate::new(500)).await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("publish");
    let config = create_test_config(&base_url, &out, 0, None);

    let err = Coordinator::new(config).unwrap().run().await.unwrap_err();

    assert!(matches!(err, BlockedError::Probe { .. }));
    assert_eq!(err.exit_code(), 3);
    // Nothing is written when the run aborts before crawling.
    assert!(!out.exists());
}

#[tokio::test]
async fn test_page_without_pager_aborts_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, 0, html(listing(None, &[("/a.com", "100%", "")]))).await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("publish");
    let config = create_test_config(&base_url, &out, 0, None);

    let err = Coordinator::new(config).unwrap().run().await.unwrap_err();
    assert!(matches!(err, BlockedError::Probe { .. }));
}

#[tokio::test]
async fn test_out_of_bounds_range_aborts_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, 0, html(listing(Some(4), &[]))).await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("publish");
    let config = create_test_config(&base_url, &out, 1, Some(9));

    let err = Coordinator::new(config).unwrap().run().await.unwrap_err();

    match err {
        BlockedError::InvalidPageRange {
            target,
            from,
            to,
            max_page,
        } => {
            assert_eq!(target, "blocked");
            assert_eq!((from, to, max_page), (1, 9, 4));
        }
        other => panic!("unexpected error {:?}", other),
    }

    // Only the probe was sent.
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_explicit_range_limits_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, 0, html(listing(Some(5), &[("/zero.com", "100%", "")]))).await;
    for page in 1..=5 {
        let href = format!("/p{}.com", page);
        mount_page(
            &mock_server,
            page,
            html(listing(Some(5), &[(href.as_str(), "100%", "")])),
        )
        .await;
    }

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("publish");
    let config = create_test_config(&base_url, &out, 2, Some(3));

    let summary = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(summary.jobs_total, 2);
    assert_eq!(read_lines(&out.join("domains.txt")), vec!["p2.com", "p3.com"]);
}
