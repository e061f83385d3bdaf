use crate::config::Settings;
use crate::storage::{validate_key, ReportStore, StoredObject};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use std::time::Duration;

/// Object endpoint that accepts `PUT` and `DELETE` on `{base_url}/{key}`.
#[derive(Debug, Clone)]
pub struct HttpReportStore {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpReportStore {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_report_store_base_url()?.to_string();

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.report_store_timeout_secs))
            .build()
            .context("failed to build report store http client")?;

        Ok(Self {
            http,
            base_url,
            api_key: settings.report_store_api_key.clone(),
        })
    }

    fn url(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            key.trim_start_matches('/')
        )
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }
}

#[async_trait::async_trait]
impl ReportStore for HttpReportStore {
    fn store_name(&self) -> &'static str {
        "http"
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<String> {
        validate_key(key)?;
        let url = self.url(key);

        let res = self
            .http
            .put(&url)
            .headers(self.headers()?)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .context("report upload request failed")?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            anyhow::bail!("report upload HTTP {status}: {text}");
        }

        tracing::info!(%url, "report uploaded");
        Ok(url)
    }

    async fn list(&self, _prefix: &str) -> Result<Vec<StoredObject>> {
        anyhow::bail!("listing is not supported by the http report store")
    }

    async fn delete(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let url = self.url(key);

        let res = self
            .http
            .delete(&url)
            .headers(self.headers()?)
            .send()
            .await
            .context("report delete request failed")?;

        let status = res.status();
        anyhow::ensure!(status.is_success(), "report delete HTTP {status}");
        Ok(())
    }
}
