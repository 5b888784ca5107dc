use std::fmt;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use screener_api::{build_router, AppState};
use screener_core::screener::error::ScreenerDiagnosticsError;
use screener_core::screener::{Query, ScanMetadata, ScanResult, ScreenerClient, Table};
use screener_core::view::{HandlebarsViews, ViewRenderer};

enum Stub {
    Result(ScanResult),
    Fail(&'static str),
    Rejected(&'static str),
}

#[async_trait::async_trait]
impl ScreenerClient for Stub {
    fn provider_name(&self) -> &'static str {
        "stub"
    }

    async fn scan(&self, _query: &Query) -> anyhow::Result<ScanResult> {
        match self {
            Stub::Result(r) => Ok(r.clone()),
            Stub::Fail(msg) => anyhow::bail!("{msg}"),
            Stub::Rejected(body) => Err(ScreenerDiagnosticsError {
                provider: "stub",
                stage: "http",
                detail: "status=400 Bad Request".to_string(),
                raw_body: Some(body.to_string()),
                raw_response_json: serde_json::from_str(body).ok(),
            }
            .into()),
        }
    }
}

struct BrokenViews;

impl ViewRenderer for BrokenViews {
    fn render(&self, template: &str, _context: &Value) -> anyhow::Result<String> {
        anyhow::bail!("template {template} exploded")
    }
}

/// Records every ERROR event, whatever its target, as `target: field=value ...`.
#[derive(Clone, Default)]
struct ErrorEvents(Arc<Mutex<Vec<String>>>);

impl ErrorEvents {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

struct FieldWriter(String);

impl Visit for FieldWriter {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.push_str(&format!(" {}={}", field.name(), value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.push_str(&format!(" {}={:?}", field.name(), value));
    }
}

impl<S: tracing::Subscriber> Layer<S> for ErrorEvents {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() == tracing::Level::ERROR {
            let mut writer = FieldWriter(format!("{}:", meta.target()));
            event.record(&mut writer);
            self.0.lock().unwrap().push(writer.0);
        }
    }
}

fn abc_table() -> Table {
    Table {
        columns: vec![
            "ticker".into(),
            "name".into(),
            "Recommend.All".into(),
            "close".into(),
        ],
        rows: vec![vec![
            json!("NASDAQ:ABC"),
            json!("ABC"),
            json!(0.42),
            json!(10.0),
        ]],
    }
}

fn app_with(stub: Stub) -> axum::Router {
    let views = HandlebarsViews::bundled().unwrap();
    build_router(AppState::new(Arc::new(stub), Arc::new(views)))
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn renders_rated_rows_as_html() {
    let app = app_with(Stub::Result(ScanResult::Plain(abc_table())));

    let (status, content_type, body) = get(app, "/tradingview_data").await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert!(body.contains("<th>ticker</th><th>name</th><th>Recommend.All</th><th>close</th>"));
    assert!(body.contains(r#"<td class="rating-buy">Buy</td>"#));
    assert!(body.contains("NASDAQ:ABC"));
    assert!(!body.contains("0.42"));
}

#[tokio::test]
async fn metadata_pair_renders_like_plain_table() {
    let meta = ScanMetadata {
        total_count: 1,
        fetched_at: Utc.with_ymd_and_hms(2026, 1, 27, 21, 0, 0).unwrap(),
    };
    let (_, _, plain) = get(
        app_with(Stub::Result(ScanResult::Plain(abc_table()))),
        "/tradingview_data",
    )
    .await;
    let (status, _, wrapped) = get(
        app_with(Stub::Result(ScanResult::WithMetadata(meta, abc_table()))),
        "/tradingview_data",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(plain, wrapped);
}

#[tokio::test]
async fn scan_failure_returns_500_and_logs_once() {
    let events = ErrorEvents::default();
    let _guard = tracing_subscriber::registry()
        .with(events.clone())
        .set_default();

    let app = app_with(Stub::Fail("scanner unavailable"));
    let (status, content_type, body) = get(app, "/tradingview_data").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert!(body.starts_with("<h1>Error</h1><p>"));
    assert!(body.contains("scanner unavailable"));
    let logged = events.take();
    assert_eq!(logged.len(), 1, "{logged:?}");
    assert!(logged[0].starts_with("screener_api:"));
    assert!(logged[0].contains("scanner unavailable"));
}

#[tokio::test]
async fn rejected_scan_logs_upstream_body_but_hides_it_from_the_page() {
    let events = ErrorEvents::default();
    let _guard = tracing_subscriber::registry()
        .with(events.clone())
        .set_default();

    let upstream = r#"{"error":"Unknown field \"EMA5x\""}"#;
    let app = app_with(Stub::Rejected(upstream));
    let (status, _, body) = get(app, "/tradingview_data").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("400 Bad Request"));
    assert!(!body.contains("Unknown field"));

    let logged = events.take();
    assert_eq!(logged.len(), 1, "{logged:?}");
    assert!(logged[0].contains(&format!("raw_body={upstream}")));
}

#[tokio::test]
async fn render_failure_returns_500() {
    let app = build_router(AppState::new(
        Arc::new(Stub::Result(ScanResult::Plain(abc_table()))),
        Arc::new(BrokenViews),
    ));

    let (status, _, body) = get(app, "/tradingview_data").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("template tradingview_data.html exploded"));
}

#[tokio::test]
async fn error_message_is_escaped() {
    let app = app_with(Stub::Fail("<b>boom</b>"));

    let (status, _, body) = get(app, "/tradingview_data").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("&lt;b&gt;boom&lt;/b&gt;"));
    assert!(!body.contains("<b>"));
}

#[tokio::test]
async fn query_string_is_ignored() {
    let app = app_with(Stub::Result(ScanResult::Plain(abc_table())));
    let (status, _, _) = get(app, "/tradingview_data?limit=5").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn healthz_is_ok() {
    let app = app_with(Stub::Result(ScanResult::Plain(Table::default())));
    let (status, _, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}
