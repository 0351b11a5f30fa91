use reqwest::Client;
use shelf_core::{page_size, FeedClient, GoodreadsConfig, Shelf, ShelfError, FEED_ACCEPT};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_rss() -> String {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Bookshelf</title>
    <item><guid>1</guid><title>One</title></item>
    <item><guid>2</guid><title>Two</title></item>
  </channel>
</rss>"#
        .to_string()
}

fn feed_client(base_url: &str) -> FeedClient {
    let config = GoodreadsConfig {
        base_url: base_url.to_string(),
        user_id: "1234".into(),
        ..GoodreadsConfig::default()
    };
    FeedClient::new(Client::new(), &config).expect("valid base url")
}

#[test]
fn page_size_doubles_with_floor_and_optional_ceiling() {
    assert_eq!(page_size(1, None), 20);
    assert_eq!(page_size(12, None), 24);
    assert_eq!(page_size(40, None), 80);
    assert_eq!(page_size(40, Some(60)), 60);
    assert_eq!(page_size(5, Some(60)), 20);
}

#[test]
fn feed_url_carries_shelf_page_size_and_order() {
    let client = feed_client("https://www.goodreads.com");
    let url = client.feed_url(Shelf::ToRead, 24);
    assert_eq!(
        url.as_str(),
        "https://www.goodreads.com/review/list_rss/1234?per_page=24&shelf=to-read&order=d"
    );
    assert_eq!(
        client.feed_path(Shelf::Read, 20),
        "/review/list_rss/1234?per_page=20&shelf=read&order=d"
    );
}

#[tokio::test]
async fn fetch_shelf_sends_rss_accept_header_and_parses() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/review/list_rss/1234"))
        .and(query_param("shelf", "currently-reading"))
        .and(query_param("per_page", "60"))
        .and(query_param("order", "d"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(sample_rss()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = feed_client(&server.uri());
    let books = client
        .fetch_shelf(Shelf::CurrentlyReading, 40, Some(60))
        .await
        .expect("shelf fetch");
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].title, "One");

    let requests = server.received_requests().await.expect("recording enabled");
    let accept = requests[0]
        .headers
        .get("accept")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    assert_eq!(accept, FEED_ACCEPT);
}

#[tokio::test]
async fn non_success_status_is_reported_with_its_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = feed_client(&server.uri());
    let err = client
        .fetch_shelf(Shelf::Read, 10, None)
        .await
        .expect_err("404 must fail");
    assert_eq!(err.upstream_status(), Some(404));
}

#[tokio::test]
async fn malformed_body_is_a_parse_failure_not_an_http_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<rss><channel><item>"))
        .mount(&server)
        .await;

    let client = feed_client(&server.uri());
    let err = client.fetch_shelf(Shelf::Read, 10, None).await.unwrap_err();
    assert!(matches!(err, ShelfError::MalformedFeed(_)));
}

#[tokio::test]
async fn unreachable_upstream_is_a_network_failure() {
    let client = feed_client("http://127.0.0.1:1");
    let err = client.fetch_shelf(Shelf::Read, 10, None).await.unwrap_err();
    assert!(matches!(err, ShelfError::Network(_)));
}
