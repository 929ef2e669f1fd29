//! Wiremock integration tests for the HTTP providers.
//!
//! Exercises the full engine against mocked OMDb and Rotten Tomatoes hosts:
//! primary hit, variation walk, secondary fallback, and total miss.

use std::sync::Arc;

use marquee::providers::{
    OmdbClient, PrimaryProvider, PrimaryResponse, RottenTomatoesClient, SecondaryProvider,
    SecondaryResponse,
};
use marquee::{Marquee, MarqueeError, MemoryStore, RatingEngine, RetryConfig};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn omdb_hit_json() -> serde_json::Value {
    serde_json::json!({
        "Title": "The Matrix",
        "Year": "1999",
        "Response": "True",
        "Ratings": [
            {"Source": "Internet Movie Database", "Value": "8.7/10"},
            {"Source": "Rotten Tomatoes", "Value": "90%"}
        ],
        "imdbRating": "8.1"
    })
}

fn omdb_miss_json() -> serde_json::Value {
    serde_json::json!({"Response": "False", "Error": "Movie not found!"})
}

/// Build an engine pointed at the two mock servers with fast pacing.
async fn engine_for(omdb: &MockServer, rt: &MockServer) -> RatingEngine {
    Marquee::builder()
        .omdb("test-key")
        .omdb_base_url(omdb.uri())
        .rotten_tomatoes_base_url(rt.uri())
        .store(Arc::new(MemoryStore::new()))
        .dispatch_config(common::fast_dispatch())
        .retry_config(RetryConfig::disabled())
        .build()
        .await
        .expect("engine should build")
}

async fn mount_omdb_miss_fallback(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(omdb_miss_json()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn omdb_hit_resolves_without_scraping() {
    let omdb = MockServer::start().await;
    let rt = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("t", "The Matrix (1999)"))
        .and(query_param("apikey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(omdb_hit_json()))
        .expect(1)
        .mount(&omdb)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&rt)
        .await;

    let engine = engine_for(&omdb, &rt).await;
    let result = engine
        .resolve("The Matrix (1999)")
        .await
        .unwrap()
        .expect("rating");

    assert_eq!(result.critics(), Some("90%"));
    assert_eq!(result.audience(), Some("8.1/10"));
    assert_eq!(result.source_title(), "The Matrix");
    assert_eq!(result.source_year(), Some("1999"));
    assert_eq!(result.source_url(), None);
}

#[tokio::test]
async fn omdb_walks_variations_until_a_hit() {
    let omdb = MockServer::start().await;
    let rt = MockServer::start().await;

    // Only the year-stripped variation is known.
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("t", "The Matrix"))
        .respond_with(ResponseTemplate::new(200).set_body_json(omdb_hit_json()))
        .expect(1)
        .mount(&omdb)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("t", "The Matrix (1999)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(omdb_miss_json()))
        .expect(1)
        .mount(&omdb)
        .await;

    let engine = engine_for(&omdb, &rt).await;
    let result = engine.resolve("The Matrix (1999)").await.unwrap();
    assert_eq!(result.unwrap().critics(), Some("90%"));
}

#[tokio::test]
async fn scrape_fallback_reads_scoreboard() {
    let omdb = MockServer::start().await;
    let rt = MockServer::start().await;
    mount_omdb_miss_fallback(&omdb).await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("search", "Good Movie"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><search-page-result><a href="/m/good_movie" class="title">Good Movie</a></search-page-result></html>"#,
        ))
        .expect(1)
        .mount(&rt)
        .await;
    Mock::given(method("GET"))
        .and(path("/m/good_movie"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<score-board tomatometerscore="90" audiencescore="85" rating="PG"></score-board>"#,
        ))
        .expect(1)
        .mount(&rt)
        .await;

    let engine = engine_for(&omdb, &rt).await;
    let result = engine.resolve("Good Movie").await.unwrap().expect("rating");

    assert_eq!(result.critics(), Some("90%"));
    assert_eq!(result.audience(), Some("85%"));
    assert_eq!(result.source_title(), "Good Movie");
    assert_eq!(
        result.source_url(),
        Some(format!("{}/m/good_movie", rt.uri()).as_str())
    );
}

#[tokio::test]
async fn total_miss_is_tombstoned() {
    let omdb = MockServer::start().await;
    let rt = MockServer::start().await;
    mount_omdb_miss_fallback(&omdb).await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>no results</html>"))
        .expect(1)
        .mount(&rt)
        .await;

    let engine = engine_for(&omdb, &rt).await;
    assert_eq!(engine.resolve("Nothing Here").await.unwrap(), None);

    let entry = engine.cache().get("Nothing Here").expect("tombstone");
    assert!(entry.is_missing());

    // Second call is answered by the tombstone (the `expect(1)` above
    // fails the test on drop otherwise).
    assert_eq!(engine.resolve("nothing  here").await.unwrap(), None);
}

#[tokio::test]
async fn scrape_server_error_is_not_tombstoned() {
    let omdb = MockServer::start().await;
    let rt = MockServer::start().await;
    mount_omdb_miss_fallback(&omdb).await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&rt)
        .await;

    let engine = engine_for(&omdb, &rt).await;
    assert_eq!(engine.resolve("Flaky").await.unwrap(), None);
    assert!(engine.cache().get("Flaky").is_none());

    // Not cached, so the chain runs again.
    assert_eq!(engine.resolve("Flaky").await.unwrap(), None);
}

// ============================================================================
// Provider-level
// ============================================================================

#[tokio::test]
async fn omdb_rate_limit_maps_to_transient_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
        .mount(&server)
        .await;

    let client = OmdbClient::with_base_url("k", server.uri());
    let err = client.lookup("Anything").await.unwrap_err();
    assert!(matches!(err, MarqueeError::RateLimited { .. }));
    assert!(err.is_transient());
    assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(3)));
}

#[tokio::test]
async fn providers_identify_themselves() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", marquee::user_agent().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(omdb_hit_json()))
        .expect(1)
        .mount(&server)
        .await;

    let client = OmdbClient::with_base_url("k", server.uri());
    assert!(matches!(
        client.lookup("The Matrix").await.unwrap(),
        PrimaryResponse::Found(_)
    ));
}

#[tokio::test]
async fn stalled_requests_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(omdb_hit_json())
                .set_delay(std::time::Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let timeout = std::time::Duration::from_millis(100);
    let omdb = OmdbClient::with_timeout("k", server.uri(), timeout).unwrap();
    let err = omdb.lookup("The Matrix").await.unwrap_err();
    assert!(err.is_transient(), "expected a transient error, got {err:?}");

    let scraper = RottenTomatoesClient::with_timeout(server.uri(), timeout).unwrap();
    assert!(matches!(
        scraper.search("The Matrix").await,
        SecondaryResponse::Error(_)
    ));
}

#[tokio::test]
async fn omdb_client_error_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key!"))
        .mount(&server)
        .await;

    let client = OmdbClient::with_base_url("bad", server.uri());
    let err = client.lookup("Anything").await.unwrap_err();
    match err {
        MarqueeError::Api { status, ref message } => {
            assert_eq!(status, 401);
            assert!(message.contains("Invalid API key"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(!err.is_transient());
}

#[tokio::test]
async fn omdb_found_without_scores_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "Title": "Obscure", "Year": "1971", "Response": "True",
            "Ratings": [], "imdbRating": "N/A"
        })))
        .mount(&server)
        .await;

    let client = OmdbClient::with_base_url("k", server.uri());
    assert_eq!(
        client.lookup("Obscure").await.unwrap(),
        PrimaryResponse::NotFound
    );
}

#[tokio::test]
async fn scraper_tolerates_missing_detail_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<a href="/tv/gone_show">Gone</a>"#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tv/gone_show"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = RottenTomatoesClient::with_base_url(server.uri());
    match client.search("Gone").await {
        SecondaryResponse::Error(MarqueeError::Api { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected Error, got {other:?}"),
    }
}

#[tokio::test]
async fn scraper_without_scores_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<a href="/m/blank">x</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/m/blank"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<score-board></score-board>"))
        .mount(&server)
        .await;

    let client = RottenTomatoesClient::with_base_url(server.uri());
    assert!(matches!(
        client.search("Blank").await,
        SecondaryResponse::NotFound
    ));
}
