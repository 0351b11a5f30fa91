use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use reqwest::Client;
use shelf_core::{
    Book, LoadState, Shelf, ShelfConfig, ShelfError, ShelfLoader, ShelfSource, ShelfView,
    SourcePlan, WarnOnce,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

enum Outcome {
    Books(Vec<Book>),
    Fail(&'static str),
}

struct FakeSource {
    name: &'static str,
    outcome: Outcome,
    calls: Arc<AtomicUsize>,
}

impl FakeSource {
    fn boxed(name: &'static str, outcome: Outcome) -> (Box<dyn ShelfSource>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FakeSource {
            name,
            outcome,
            calls: calls.clone(),
        };
        (Box::new(source), calls)
    }
}

impl ShelfSource for FakeSource {
    fn name(&self) -> &str {
        self.name
    }

    fn fetch(&self, _shelf: Shelf, _limit: usize) -> BoxFuture<'_, Result<Vec<Book>, ShelfError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = match &self.outcome {
            Outcome::Books(books) => Ok(books.clone()),
            Outcome::Fail(message) => Err(ShelfError::Backend(message.to_string())),
        };
        Box::pin(async move { result })
    }
}

fn books(prefix: &str, count: usize) -> Vec<Book> {
    (0..count)
        .map(|i| Book {
            id: format!("{prefix}-{i}"),
            title: format!("{prefix} {i}"),
            ..Book::default()
        })
        .collect()
}

fn one_item_rss() -> &'static str {
    r#"<?xml version="1.0"?><rss version="2.0"><channel><title>T</title>
<item><guid>g1</guid><title>Only Book</title><book_large_image_url>http://img.test/1.jpg</book_large_image_url></item>
</channel></rss>"#
}

#[tokio::test]
async fn first_successful_mirror_wins_and_earlier_ones_run_once() {
    let (primary, primary_calls) = FakeSource::boxed("backend", Outcome::Fail("backend down"));
    let (m1, m1_calls) = FakeSource::boxed("m1", Outcome::Fail("m1 down"));
    let (m2, m2_calls) = FakeSource::boxed("m2", Outcome::Fail("m2 down"));
    let (m3, m3_calls) = FakeSource::boxed("m3", Outcome::Books(books("m3", 3)));
    let (m4, m4_calls) = FakeSource::boxed("m4", Outcome::Books(books("m4", 3)));

    let loader = ShelfLoader::new(SourcePlan::new(Some(primary), vec![m1, m2, m3, m4]), WarnOnce::new());
    let result = loader.load(Shelf::Read, 10).await.expect("m3 succeeds");

    assert_eq!(result, books("m3", 3));
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(m1_calls.load(Ordering::SeqCst), 1);
    assert_eq!(m2_calls.load(Ordering::SeqCst), 1);
    assert_eq!(m3_calls.load(Ordering::SeqCst), 1);
    assert_eq!(m4_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn results_are_truncated_to_the_requested_limit() {
    for (available, limit) in [(30, 12), (5, 12), (12, 12), (1, 1)] {
        let (source, _) = FakeSource::boxed("only", Outcome::Books(books("b", available)));
        let loader = ShelfLoader::new(SourcePlan::new(None, vec![source]), WarnOnce::new());
        let result = loader.load(Shelf::Read, limit).await.unwrap();
        assert_eq!(result.len(), available.min(limit));
    }
}

#[tokio::test]
async fn every_source_failing_returns_the_last_error() {
    let (primary, _) = FakeSource::boxed("backend", Outcome::Fail("first"));
    let (m1, _) = FakeSource::boxed("m1", Outcome::Fail("second"));
    let (m2, _) = FakeSource::boxed("m2", Outcome::Fail("last"));
    let loader = ShelfLoader::new(SourcePlan::new(Some(primary), vec![m1, m2]), WarnOnce::new());

    let err = loader.load(Shelf::ToRead, 5).await.unwrap_err();
    assert_eq!(err.to_string(), "last");
}

#[tokio::test]
async fn empty_answer_keeps_looking_but_is_not_an_error() {
    let (m1, _) = FakeSource::boxed("m1", Outcome::Books(Vec::new()));
    let (m2, m2_calls) = FakeSource::boxed("m2", Outcome::Fail("down"));
    let loader = ShelfLoader::new(SourcePlan::new(None, vec![m1, m2]), WarnOnce::new());

    let result = loader.load(Shelf::Read, 5).await.expect("empty is not an error");
    assert!(result.is_empty());
    assert_eq!(m2_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn no_sources_at_all_is_an_error() {
    let loader = ShelfLoader::new(SourcePlan::new(None, Vec::new()), WarnOnce::new());
    assert!(matches!(
        loader.load(Shelf::Read, 5).await,
        Err(ShelfError::NoSources)
    ));
}

#[tokio::test]
async fn missing_backend_warning_fires_once_until_reset() {
    let warning = WarnOnce::new();
    let (m1, _) = FakeSource::boxed("m1", Outcome::Books(books("b", 1)));
    let loader = ShelfLoader::new(SourcePlan::new(None, vec![m1]), warning.clone());

    assert!(!warning.has_fired());
    loader.load(Shelf::Read, 5).await.unwrap();
    assert!(warning.has_fired());
    assert!(!warning.fire(), "already fired by the loader");

    warning.reset();
    assert!(!warning.has_fired());
    assert!(warning.fire());
}

#[tokio::test]
async fn backend_down_dev_proxy_serves_the_shelf() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dev/goodreads/review/list_rss/195680955"))
        .respond_with(ResponseTemplate::new(200).set_body_string(one_item_rss()))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = ShelfConfig::default();
    config.goodreads.base_url = server.uri();
    config.sources.backend_url = Some("http://127.0.0.1:1".into());
    config.sources.is_development = true;
    config.sources.dev_proxy_base = format!("{}/dev/goodreads", server.uri());
    config.sources.cors_relay_url = None;

    let plan = SourcePlan::from_config(&config, Client::new()).unwrap();
    let loader = ShelfLoader::new(plan, WarnOnce::new());
    assert_eq!(loader.plan().source_names(), vec!["backend", "dev-proxy", "direct"]);

    let mut view = ShelfView::new(Shelf::CurrentlyReading, 12);
    let state = view.refresh(&loader, Shelf::CurrentlyReading, 12).await.clone();

    match state {
        LoadState::Ready(books) => {
            assert_eq!(books.len(), 1);
            assert_eq!(books[0].title, "Only Book");
            assert_eq!(books[0].image_url, "https://img.test/1.jpg");
        }
        other => panic!("expected ready state, got {other:?}"),
    }
    assert_eq!(view.error_message(), None);
}

#[tokio::test]
async fn all_sources_failing_ends_in_error_not_empty_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dev/goodreads/review/list_rss/195680955"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/relay"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<rss><channel>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/review/list_rss/195680955"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut config = ShelfConfig::default();
    config.goodreads.base_url = server.uri();
    config.sources.backend_url = Some("http://127.0.0.1:1".into());
    config.sources.is_development = true;
    config.sources.dev_proxy_base = format!("{}/dev/goodreads", server.uri());
    config.sources.cors_relay_url = Some(format!("{}/relay", server.uri()));

    let loader = ShelfLoader::new(
        SourcePlan::from_config(&config, Client::new()).unwrap(),
        WarnOnce::new(),
    );
    let mut view = ShelfView::new(Shelf::Read, 12);
    view.refresh(&loader, Shelf::Read, 12).await;

    assert_eq!(view.error_message(), Some("Proxy responded with 503"));
    assert!(!view.is_empty_state());
    assert!(view.books().is_empty());
}
