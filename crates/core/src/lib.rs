pub mod domain;
pub mod error;
pub mod ingest;
pub mod invocation;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod time;

pub mod config {
    use crate::domain::record::Recommendation;
    use crate::pipeline::filter::{FilterOptions, DEFAULT_WINDOW_DAYS};
    use anyhow::Context;

    pub const DEFAULT_DATA_FILE: &str = "mock_data/mock_broker_data.csv";
    pub const DEFAULT_REPORT_DIR: &str = "reports";
    pub const DEFAULT_REPORT_PREFIX: &str = "broker_reports";
    pub const DEFAULT_RETENTION_DAYS: i64 = 180;
    pub const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub data_file: String,
        pub report_dir: String,
        pub report_prefix: String,
        pub report_store_base_url: Option<String>,
        pub report_store_api_key: Option<String>,
        pub report_store_timeout_secs: u64,
        pub window_days: i64,
        pub allowed_recommendations: Vec<Recommendation>,
        pub retention_days: i64,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let window_days = match std::env::var("RECO_WINDOW_DAYS") {
                Ok(s) => s
                    .trim()
                    .parse::<i64>()
                    .with_context(|| format!("RECO_WINDOW_DAYS must be an integer (got {s})"))?,
                Err(_) => DEFAULT_WINDOW_DAYS,
            };

            let allowed_recommendations = match std::env::var("RECO_ALLOWED") {
                Ok(s) => parse_recommendation_list(&s),
                Err(_) => vec![Recommendation::Buy, Recommendation::Sell],
            };

            let retention_days = match std::env::var("REPORT_RETENTION_DAYS") {
                Ok(s) => s.trim().parse::<i64>().with_context(|| {
                    format!("REPORT_RETENTION_DAYS must be an integer (got {s})")
                })?,
                Err(_) => DEFAULT_RETENTION_DAYS,
            };

            Ok(Self {
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                data_file: non_empty_env("BROKER_DATA_FILE")
                    .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string()),
                report_dir: non_empty_env("REPORT_DIR")
                    .unwrap_or_else(|| DEFAULT_REPORT_DIR.to_string()),
                report_prefix: non_empty_env("REPORT_PREFIX")
                    .unwrap_or_else(|| DEFAULT_REPORT_PREFIX.to_string()),
                report_store_base_url: non_empty_env("REPORT_STORE_BASE_URL"),
                report_store_api_key: std::env::var("REPORT_STORE_API_KEY").ok(),
                report_store_timeout_secs: std::env::var("REPORT_STORE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_STORE_TIMEOUT_SECS),
                window_days,
                allowed_recommendations,
                retention_days,
            })
        }

        /// Validated filter options built from the configured window and labels.
        pub fn filter_options(&self) -> anyhow::Result<FilterOptions> {
            FilterOptions::new(self.window_days, self.allowed_recommendations.clone())
        }

        pub fn require_report_store_base_url(&self) -> anyhow::Result<&str> {
            self.report_store_base_url
                .as_deref()
                .context("REPORT_STORE_BASE_URL is required")
        }
    }

    /// Parses a comma separated list of labels such as `Buy,Sell`.
    pub fn parse_recommendation_list(s: &str) -> Vec<Recommendation> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Recommendation::from_label)
            .collect()
    }

    fn non_empty_env(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

}
