use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::trace::{DefaultOnFailure, TraceLayer};
use tracing::Level;

use screener_core::pipeline::{render_tradingview_data, RequestContext};
use screener_core::screener::error::ScreenerDiagnosticsError;
use screener_core::screener::ScreenerClient;
use screener_core::view::ViewRenderer;

#[derive(Clone)]
pub struct AppState {
    pub screener: Arc<dyn ScreenerClient>,
    pub views: Arc<dyn ViewRenderer>,
}

impl AppState {
    pub fn new(screener: Arc<dyn ScreenerClient>, views: Arc<dyn ViewRenderer>) -> Self {
        Self { screener, views }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/tradingview_data", get(show_tradingview_data))
        .with_state(state)
        // The handler logs its own failures; keep tower-http's 5xx report below ERROR.
        .layer(
            TraceLayer::new_for_http().on_failure(DefaultOnFailure::new().level(Level::WARN)),
        )
}

async fn healthz() -> &'static str {
    "ok"
}

async fn show_tradingview_data(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Response {
    let request = RequestContext {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
    };

    match render_tradingview_data(state.screener.as_ref(), state.views.as_ref(), &request).await {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            let raw_body = err
                .chain()
                .find_map(|e| e.downcast_ref::<ScreenerDiagnosticsError>())
                .and_then(|diag| diag.raw_body.as_deref());
            tracing::error!(error = ?err, raw_body, "error retrieving trading data");
            error_page(&err).into_response()
        }
    }
}

fn error_page(err: &anyhow::Error) -> (StatusCode, Html<String>) {
    let message = handlebars::html_escape(&format!("{err:#}"));
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(format!("<h1>Error</h1><p>{message}</p>")),
    )
}
