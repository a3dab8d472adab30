use std::{net::SocketAddr, time::Duration};

use clickhouse::test::{Mock, handlers};
use reqwest::StatusCode;
use tokio::{
    net::{TcpListener, TcpStream},
    time::{Instant, sleep},
};
use url::Url;

use api::{ApiState, CacheDirectives, DEFAULT_POOL_CAPACITY};
use axum::serve;
use clickhouse_lib::{ClickhouseReader, PhotoRow};
use runtime::rate_limiter::RateLimiter;
use server::{ServerSettings, router};

fn photo(name: &str, year: Option<u16>, city: Option<&str>) -> PhotoRow {
    PhotoRow {
        name: name.to_owned(),
        year,
        city: city.map(ToOwned::to_owned),
        year_options: Vec::new(),
        city_options: Vec::new(),
    }
}

fn settings() -> ServerSettings {
    ServerSettings {
        allowed_origins: config::DEFAULT_ALLOWED_ORIGINS
            .split(',')
            .map(|s| s.to_owned())
            .collect(),
        trust_proxy: false,
        cache: CacheDirectives::default(),
    }
}

async fn spawn_server(
    mock_url: &str,
    pool_capacity: usize,
    limiter: RateLimiter,
) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let url = Url::parse(mock_url).unwrap();
    let client =
        ClickhouseReader::new(url, "test-db".to_owned(), "user".into(), "pass".into()).unwrap();
    let state = ApiState::new(client, pool_capacity);
    let app = router(state, limiter, &settings());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
    });
    (addr, handle)
}

async fn wait_for_server(addr: SocketAddr) {
    let start = Instant::now();
    loop {
        if TcpStream::connect(addr).await.is_ok() {
            break;
        }
        if start.elapsed() > Duration::from_secs(5) {
            panic!("server did not start in time");
        }
        sleep(Duration::from_millis(10)).await;
    }
}

fn unlimited() -> RateLimiter {
    RateLimiter::new(u64::MAX, Duration::from_secs(1))
}

#[tokio::test]
async fn health_and_status_integration() {
    let mock = Mock::new();
    let (addr, server) = spawn_server(mock.url(), DEFAULT_POOL_CAPACITY, unlimited()).await;
    wait_for_server(addr).await;

    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "status": "ok" }));

    let resp = reqwest::get(format!("http://{addr}/api/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "status": "Photos goes here" }));

    server.abort();
}

/// The year pool serves the whole dataset scenario: two photos carry a year,
/// a third does not. Draws only ever surface the first two, and draining the
/// pool triggers exactly one further sample.
#[tokio::test]
async fn year_pool_drains_and_refills_integration() {
    let mock = Mock::new();
    // First sample: both year-bearing photos. The store-side filter keeps
    // the yearless third photo out of every batch.
    mock.add(handlers::provide(vec![
        photo("19900512_plaza.jpg", Some(1990), Some("San Jose")),
        photo("20010708_rio.jpg", Some(2001), Some("Cartago")),
    ]));
    // Second sample, for the refill after both are drawn.
    mock.add(handlers::provide(vec![
        photo("20010708_rio.jpg", Some(2001), Some("Cartago")),
        photo("19900512_plaza.jpg", Some(1990), Some("San Jose")),
    ]));

    let (addr, server) = spawn_server(mock.url(), 25, unlimited()).await;
    wait_for_server(addr).await;

    let year_bearing = ["19900512_plaza.jpg", "20010708_rio.jpg"];
    for _ in 0..4 {
        let resp = reqwest::get(format!("http://{addr}/api/year")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("cache-control").unwrap(), "no-store");
        let body: serde_json::Value = resp.json().await.unwrap();
        let name = body["name"].as_str().unwrap();
        assert!(year_bearing.contains(&name), "unexpected photo {name}");
        assert!(body["year"].is_u64());
    }

    server.abort();
}

#[tokio::test]
async fn empty_sample_is_retried_on_the_next_request() {
    let mock = Mock::new();
    mock.add(handlers::provide(Vec::<PhotoRow>::new()));
    mock.add(handlers::provide(vec![photo("20010708_rio.jpg", Some(2001), None)]));

    let (addr, server) = spawn_server(mock.url(), 25, unlimited()).await;
    wait_for_server(addr).await;

    let resp = reqwest::get(format!("http://{addr}/api/year")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = reqwest::get(format!("http://{addr}/api/year")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["name"], "20010708_rio.jpg");

    server.abort();
}

/// Full fixed-window walk: three requests succeed with decreasing remaining,
/// the fourth is rejected with Retry-After, and the budget returns once the
/// window elapses.
#[tokio::test]
async fn rate_limit_window_integration() {
    let mock = Mock::new();
    let limiter = RateLimiter::new(3, Duration::from_millis(1000));
    let (addr, server) = spawn_server(mock.url(), DEFAULT_POOL_CAPACITY, limiter).await;
    wait_for_server(addr).await;

    let url = format!("http://{addr}/api/");
    for expected_remaining in ["2", "1", "0"] {
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("x-ratelimit-limit").unwrap(), "3");
        assert_eq!(resp.headers().get("x-ratelimit-remaining").unwrap(), expected_remaining);
    }

    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 =
        resp.headers().get("retry-after").unwrap().to_str().unwrap().parse().unwrap();
    assert!(retry_after <= 1);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], "Rate limit exceeded");

    sleep(Duration::from_millis(1050)).await;
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("x-ratelimit-remaining").unwrap(), "2");

    server.abort();
}
