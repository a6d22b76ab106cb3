use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use seattle_events::aggregator::Aggregator;
use seattle_events::api;
use seattle_events::cache::{EventCache, ManualClock, DEFAULT_TTL};
use seattle_events::enrich::Enricher;
use seattle_events::models::Event;
use seattle_events::scraping::base::HtmlFetcher;
use seattle_events::scraping::{default_sources, EventSource};
use seattle_events::search::TavilyProvider;
use seattle_events::service::EventService;

const EVENTS12_HTML: &str = r#"
    <ul>
        <li><a href="https://jazz.example/">Jazz Night + Friends</a></li>
        <li><a href="https://food.example/">Seattle Food Fest FREE</a></li>
    </ul>
"#;
const LUMA_HTML: &str = r#"<a href="/ai-meetup">Seattle AI Builders Meetup</a>"#;

struct CountingFetcher {
    pages: HashMap<String, String>,
    calls: AtomicUsize,
}

impl CountingFetcher {
    fn seattle() -> Arc<Self> {
        Arc::new(Self {
            pages: HashMap::from([
                ("https://www.events12.com/seattle/".to_string(), EVENTS12_HTML.to_string()),
                (
                    "https://www.events12.com/seattle/march-2025/".to_string(),
                    EVENTS12_HTML.to_string(),
                ),
                ("https://lu.ma/seattle".to_string(), LUMA_HTML.to_string()),
            ]),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HtmlFetcher for CountingFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("404 for {url}"))
    }
}

struct StubSource {
    id: &'static str,
    title: &'static str,
    url: &'static str,
}

#[async_trait]
impl EventSource for StubSource {
    fn source_id(&self) -> &'static str {
        self.id
    }

    fn source_name(&self) -> &'static str {
        self.id
    }

    fn source_url(&self) -> &'static str {
        self.url
    }

    async fn fetch(&self, fetcher: &dyn HtmlFetcher) -> Result<Vec<Event>> {
        fetcher.fetch_html(self.url).await?;
        Ok(vec![Event {
            title: self.title.to_string(),
            date: "March 2025".to_string(),
            description: None,
            location: None,
            is_free: false,
            url: Some(self.url.to_string()),
            source: String::new(),
            relevant_date: None,
        }])
    }
}

struct TestApp {
    router: Router,
    fetcher: Arc<CountingFetcher>,
    clock: Arc<ManualClock>,
    cache: Arc<EventCache>,
}

fn test_app(
    sources: Vec<Arc<dyn EventSource>>,
    fetcher: Arc<CountingFetcher>,
    search_endpoint: &str,
) -> TestApp {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 3, 20, 17, 0, 0)
            .single()
            .expect("valid time"),
    ));
    let cache = Arc::new(EventCache::new(clock.clone(), DEFAULT_TTL));
    let provider =
        TavilyProvider::with_endpoint("tvly-test", search_endpoint).expect("search provider");
    let service = EventService::new(
        Aggregator::new(sources, fetcher.clone()),
        Enricher::new(Arc::new(provider)),
        cache.clone(),
    );
    TestApp {
        router: api::router(Arc::new(service)),
        fetcher,
        clock,
        cache,
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&bytes).expect("json body");
    (status, body)
}

async fn tavily_returning(results: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn lists_events_from_every_source() {
    let fetcher = Arc::new(CountingFetcher {
        pages: HashMap::from([
            ("http://a".to_string(), String::new()),
            ("http://b".to_string(), String::new()),
        ]),
        calls: AtomicUsize::new(0),
    });
    let app = test_app(
        vec![
            Arc::new(StubSource {
                id: "events12",
                title: "Jazz Night+",
                url: "http://a",
            }),
            Arc::new(StubSource {
                id: "luma",
                title: "Food Fest",
                url: "http://b",
            }),
        ],
        fetcher,
        "http://127.0.0.1:9/search",
    );

    let (status, body) = get(&app.router, "/api/events").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "events": [
                { "title": "Jazz Night+", "date": "March 2025", "isFree": false, "url": "http://a", "source": "events12" },
                { "title": "Food Fest", "date": "March 2025", "isFree": false, "url": "http://b", "source": "luma" }
            ]
        })
    );
}

#[tokio::test]
async fn cached_events_are_served_until_stale_or_flushed() {
    let app = test_app(default_sources(), CountingFetcher::seattle(), "http://127.0.0.1:9/search");

    let (_, first) = get(&app.router, "/api/events").await;
    assert_eq!(first["events"].as_array().map(Vec::len), Some(3));
    assert_eq!(app.fetcher.calls(), 2);

    app.clock.advance(Duration::from_secs(9 * 60));
    let (_, second) = get(&app.router, "/api/events").await;
    assert_eq!(second, first);
    assert_eq!(app.fetcher.calls(), 2);

    app.cache.flush();
    let (_, third) = get(&app.router, "/api/events").await;
    assert_eq!(third, first);
    assert_eq!(app.fetcher.calls(), 4);
}

#[tokio::test]
async fn date_endpoint_validates_shape_only() {
    let app = test_app(default_sources(), CountingFetcher::seattle(), "http://127.0.0.1:9/search");

    let (status, body) = get(&app.router, "/api/events/date/march-22").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid date format. Use YYYY-MM-DD" }));

    let (status, body) = get(&app.router, "/api/events/date/2025-13-99").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "date": "2025-13-99", "events": [] }));
}

#[tokio::test]
async fn date_endpoint_enriches_from_search() {
    let tavily = tavily_returning(json!([
        {
            "title": "Jazz Night + Friends - Seattle",
            "url": "https://www.events12.com/seattle/jazz/",
            "content": "Jazz Night + Friends at The Triple Door, downtown Seattle."
        }
    ]))
    .await;
    let app = test_app(
        default_sources(),
        CountingFetcher::seattle(),
        &format!("{}/search", tavily.uri()),
    );

    let (status, body) = get(&app.router, "/api/events/date/2025-03-22").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date"], "Saturday, March 22, 2025");
    let events = body["events"].as_array().expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["title"], "Jazz Night + Friends");
    assert_eq!(events[0]["location"], "The Triple Door");
    assert_eq!(events[0]["url"], "https://www.events12.com/seattle/jazz/");
    assert_eq!(events[0]["relevantDate"], "Saturday, March 22, 2025");
    assert!(events[0]["description"]
        .as_str()
        .is_some_and(|d| d.ends_with("...")));
}

#[tokio::test]
async fn search_filters_are_conjunctive() {
    let app = test_app(default_sources(), CountingFetcher::seattle(), "http://127.0.0.1:9/search");

    let (status, body) = get(&app.router, "/api/events/search?q=seattle").await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = body["events"]
        .as_array()
        .expect("events")
        .iter()
        .filter_map(|e| e["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Seattle Food Fest", "Seattle AI Builders Meetup"]);
    assert!(body.get("failedSources").is_none());

    // Scraped listings carry no location, so a city filter excludes them all.
    let (_, body) = get(&app.router, "/api/events/search?q=seattle&city=Seattle").await;
    assert_eq!(body, json!({ "events": [] }));

    let (_, body) = get(&app.router, "/api/events/search?category=All").await;
    assert_eq!(body["events"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn search_by_date_reports_failed_enrichment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&server)
        .await;
    let app = test_app(
        default_sources(),
        CountingFetcher::seattle(),
        &format!("{}/search", server.uri()),
    );

    let (status, body) = get(&app.router, "/api/events/search?q=jazz&date=2025-03-22").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"][0]["title"], "Jazz Night + Friends");
    assert_eq!(body["failedSources"][0]["source"], "tavily");
}

#[tokio::test]
async fn lists_sources() {
    let app = test_app(default_sources(), CountingFetcher::seattle(), "http://127.0.0.1:9/search");

    let (status, body) = get(&app.router, "/api/events/sources").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "sources": [
                { "id": "events12", "name": "Events12.com", "url": "https://www.events12.com/seattle/" },
                { "id": "luma", "name": "Lu.ma", "url": "https://lu.ma/seattle" }
            ]
        })
    );
}
