use serde_json::Value;
use std::fmt;

/// Failure talking to the screener, with enough of the exchange kept for diagnosis.
#[derive(Debug, Clone)]
pub struct ScreenerDiagnosticsError {
    pub provider: &'static str,
    pub stage: &'static str,
    pub detail: String,
    pub raw_body: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl fmt::Display for ScreenerDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "screener error (provider={}, stage={}): {}",
            self.provider, self.stage, self.detail
        )
    }
}

impl std::error::Error for ScreenerDiagnosticsError {}
