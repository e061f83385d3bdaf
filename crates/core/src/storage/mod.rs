pub mod http;
pub mod local;
pub mod memory;
pub mod retention;

use crate::config::Settings;
use anyhow::Result;
use chrono::{DateTime, Utc};

pub use http::HttpReportStore;
pub use local::LocalReportStore;
pub use memory::MemoryReportStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

/// Destination for report artifacts. Implementations never retry.
#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    fn store_name(&self) -> &'static str;

    /// Writes `body` under `key` and returns a location string for the caller.
    async fn put(&self, key: &str, body: Vec<u8>) -> Result<String>;

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>>;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// HTTP store when `REPORT_STORE_BASE_URL` is set, local directory otherwise.
pub fn from_settings(settings: &Settings) -> Result<Box<dyn ReportStore>> {
    if settings.report_store_base_url.is_some() {
        Ok(Box::new(HttpReportStore::from_settings(settings)?))
    } else {
        Ok(Box::new(LocalReportStore::new(&settings.report_dir)))
    }
}

/// Rejects keys that are empty, absolute, or climb out of the store root.
pub(crate) fn validate_key(key: &str) -> Result<()> {
    anyhow::ensure!(!key.trim().is_empty(), "object key must be non-empty");
    anyhow::ensure!(!key.starts_with('/'), "object key must be relative: {key}");
    anyhow::ensure!(
        key.split('/').all(|part| part != ".." && part != "."),
        "object key must not contain relative segments: {key}"
    );
    Ok(())
}
