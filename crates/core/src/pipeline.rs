use crate::domain::row::{ScanRow, RECOMMEND_ALL};
use crate::screener::query::tradingview_data_query;
use crate::screener::ScreenerClient;
use crate::view::{ViewRenderer, TRADINGVIEW_DATA_TEMPLATE};
use anyhow::Context;
use serde::Serialize;
use serde_json::json;

/// Snapshot of the inbound request handed to templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
}

pub async fn fetch_rated_rows(client: &dyn ScreenerClient) -> anyhow::Result<Vec<ScanRow>> {
    let query = tradingview_data_query();
    let result = client
        .scan(&query)
        .await
        .with_context(|| format!("{} scan failed", client.provider_name()))?;

    let mut rows = result
        .into_table()
        .into_records()
        .context("screener returned a malformed table")?;
    for row in &mut rows {
        row.apply_rating(RECOMMEND_ALL);
    }
    Ok(rows)
}

pub async fn render_tradingview_data(
    client: &dyn ScreenerClient,
    views: &dyn ViewRenderer,
    request: &RequestContext,
) -> anyhow::Result<String> {
    let rows = fetch_rated_rows(client).await?;
    views.render(
        TRADINGVIEW_DATA_TEMPLATE,
        &json!({
            "request": request,
            "data": rows,
        }),
    )
}
