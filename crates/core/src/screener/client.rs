use crate::config::Settings;
use crate::screener::error::ScreenerDiagnosticsError;
use crate::screener::query::Query;
use crate::screener::result::{ScanMetadata, ScanResult, Table};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use serde::Deserialize;
use serde_json::Value;

const PROVIDER_NAME: &str = "tradingview_scanner";

/// Column the scanner prepends to every row (the `EXCHANGE:SYMBOL` identifier).
pub const TICKER_COLUMN: &str = "ticker";

#[async_trait::async_trait]
pub trait ScreenerClient: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn scan(&self, query: &Query) -> Result<ScanResult>;
}

#[derive(Debug, Clone)]
pub struct HttpScreenerClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<String>,
}

impl HttpScreenerClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.screener_timeout)
            .build()
            .context("failed to build screener http client")?;

        Ok(Self {
            http,
            base_url: settings.screener_base_url.clone(),
            session: settings.screener_session.clone(),
        })
    }

    fn url(&self, query: &Query) -> String {
        format!(
            "{}/{}/scan",
            self.base_url.trim_end_matches('/'),
            query.url_market()
        )
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(session) = &self.session {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(&format!("sessionid={session}"))
                    .context("SCREENER_SESSION is not a valid header value")?,
            );
        }
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl ScreenerClient for HttpScreenerClient {
    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn scan(&self, query: &Query) -> Result<ScanResult> {
        let url = self.url(query);
        let headers = self.headers()?;

        let res = self
            .http
            .post(&url)
            .headers(headers)
            .json(&query.to_payload())
            .send()
            .await
            .context("screener request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read screener response")?;

        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<Value>(&text).ok();
            return Err(ScreenerDiagnosticsError {
                provider: PROVIDER_NAME,
                stage: "http",
                detail: format!("status={status}"),
                raw_body: Some(text),
                raw_response_json,
            }
            .into());
        }

        let result = parse_scan_response(&text, query)?;
        tracing::debug!(
            %url,
            total_count = ?result.metadata().map(|m| m.total_count),
            "screener scan completed"
        );
        Ok(result)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanResponse {
    total_count: u64,
    #[serde(default)]
    data: Option<Vec<ScanResponseRow>>,
}

#[derive(Debug, Deserialize)]
struct ScanResponseRow {
    s: String,
    d: Vec<Value>,
}

/// Decodes a scan response body into a table whose first column is the ticker, followed by the
/// query's selected columns.
pub fn parse_scan_response(text: &str, query: &Query) -> Result<ScanResult> {
    let parsed = serde_json::from_str::<ScanResponse>(text).map_err(|e| {
        ScreenerDiagnosticsError {
            provider: PROVIDER_NAME,
            stage: "decode",
            detail: e.to_string(),
            raw_body: Some(text.to_string()),
            raw_response_json: serde_json::from_str::<Value>(text).ok(),
        }
    })?;

    let mut columns = Vec::with_capacity(query.columns().len() + 1);
    columns.push(TICKER_COLUMN.to_string());
    columns.extend(query.columns().iter().cloned());

    let mut table = Table::new(columns);
    for row in parsed.data.unwrap_or_default() {
        anyhow::ensure!(
            row.d.len() == query.columns().len(),
            "screener row {} has {} values, expected {}",
            row.s,
            row.d.len(),
            query.columns().len()
        );
        let mut cells = Vec::with_capacity(row.d.len() + 1);
        cells.push(Value::String(row.s));
        cells.extend(row.d);
        table.push_row(cells)?;
    }

    Ok(ScanResult::WithMetadata(
        ScanMetadata {
            total_count: parsed.total_count,
            fetched_at: chrono::Utc::now(),
        },
        table,
    ))
}
