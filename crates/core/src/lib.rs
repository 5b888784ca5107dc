pub mod domain;
pub mod pipeline;
pub mod screener;
pub mod view;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;
    use std::time::Duration;

    pub const DEFAULT_SCREENER_BASE_URL: &str = "https://scanner.tradingview.com";
    const DEFAULT_SCREENER_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_PORT: u16 = 3000;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub port: u16,
        pub sentry_dsn: Option<String>,
        pub screener_base_url: String,
        pub screener_session: Option<String>,
        pub screener_timeout: Duration,
        pub templates_dir: Option<PathBuf>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                port: DEFAULT_PORT,
                sentry_dsn: None,
                screener_base_url: DEFAULT_SCREENER_BASE_URL.to_string(),
                screener_session: None,
                screener_timeout: Duration::from_secs(DEFAULT_SCREENER_TIMEOUT_SECS),
                templates_dir: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Self::default();

            let port = match non_empty_var("PORT") {
                Some(v) => v
                    .parse::<u16>()
                    .with_context(|| format!("PORT must be a port number (got {v})"))?,
                None => defaults.port,
            };

            let screener_timeout = match non_empty_var("SCREENER_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(v.parse::<u64>().with_context(|| {
                    format!("SCREENER_TIMEOUT_SECS must be a whole number of seconds (got {v})")
                })?),
                None => defaults.screener_timeout,
            };

            Ok(Self {
                port,
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                screener_base_url: non_empty_var("SCREENER_BASE_URL")
                    .unwrap_or(defaults.screener_base_url),
                screener_session: non_empty_var("SCREENER_SESSION"),
                screener_timeout,
                templates_dir: non_empty_var("TEMPLATES_DIR").map(PathBuf::from),
            })
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }
}
