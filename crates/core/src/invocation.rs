use crate::config::parse_recommendation_list;
use crate::error::ValidationError;
use crate::ingest::RecordSource;
use crate::pipeline::{self, filter::FilterOptions};
use crate::report::artifact::{report_object_key, ReportArtifact};
use crate::storage::ReportStore;
use crate::time::resolve_as_of_date;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Trigger payload. Every field is optional text so the same shape can come
/// from a query string or a JSON body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationEvent {
    #[serde(default)]
    pub as_of_date: Option<String>,
    #[serde(default, deserialize_with = "text_or_number")]
    pub window_days: Option<String>,
    /// Comma separated labels, e.g. `Buy,Sell`.
    #[serde(default)]
    pub allowed: Option<String>,
}

/// JSON bodies may carry `window_days` as a number; query strings always give text.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(
        Option::<TextOrNumber>::deserialize(deserializer)?.map(|v| match v {
            TextOrNumber::Text(s) => s,
            TextOrNumber::Number(n) => n.to_string(),
        }),
    )
}

impl InvocationEvent {
    /// Accepts either the bare event or a gateway envelope carrying it under
    /// `queryStringParameters`.
    pub fn from_trigger(value: &Value) -> anyhow::Result<Self> {
        let inner = match value.get("queryStringParameters") {
            Some(Value::Null) => return Ok(Self::default()),
            Some(params) => params,
            None if value.is_null() => return Ok(Self::default()),
            None => value,
        };
        serde_json::from_value(inner.clone()).context("trigger event has an unexpected shape")
    }

    /// Overrides the configured filter options with whatever the event carries.
    pub fn filter_options(&self, base: &FilterOptions) -> anyhow::Result<FilterOptions> {
        let window_days = match self.window_days.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.parse::<i64>().map_err(|_| {
                ValidationError::InvalidOptions(format!("window_days must be an integer (got {s})"))
            })?,
            _ => base.window_days(),
        };

        let allowed = match self.allowed.as_deref() {
            Some(s) => parse_recommendation_list(s),
            None => base.allowed().iter().cloned().collect(),
        };

        FilterOptions::new(window_days, allowed)
    }
}

/// Collaborators for one invocation. Built fresh per call; nothing here is shared
/// between runs.
pub struct InvocationDeps<'a> {
    pub source: &'a dyn RecordSource,
    pub store: &'a dyn ReportStore,
    pub options: FilterOptions,
    pub report_prefix: &'a str,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: Value,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub location: String,
    pub artifact: ReportArtifact,
}

pub async fn invoke(event: &InvocationEvent, deps: &InvocationDeps<'_>) -> InvocationResponse {
    let run_id = Uuid::new_v4();
    tracing::info!(%run_id, source = %deps.source.describe(), "invocation started");

    match execute(event, deps, run_id).await {
        Ok(outcome) => {
            tracing::info!(%run_id, location = %outcome.location, "invocation succeeded");
            InvocationResponse {
                status_code: 200,
                body: json!({
                    "message": "Report generated and saved successfully",
                    "run_id": run_id,
                    "report_location": outcome.location,
                    "top_companies": outcome.artifact.report.top_companies,
                    "top_brokers": outcome.artifact.report.top_brokers,
                }),
            }
        }
        Err(err) => {
            let refused = err.downcast_ref::<ValidationError>().is_some();
            let message = format!("{err:#}");
            tracing::error!(%run_id, refused, error = %message, "invocation failed");
            InvocationResponse {
                status_code: 500,
                body: json!({ "error": message }),
            }
        }
    }
}

pub async fn execute(
    event: &InvocationEvent,
    deps: &InvocationDeps<'_>,
    run_id: Uuid,
) -> anyhow::Result<RunOutcome> {
    let today = resolve_as_of_date(event.as_of_date.as_deref(), deps.now)?;
    let options = event.filter_options(&deps.options)?;

    let artifact = build_artifact(deps.source, &options, today, run_id, deps.now).await?;
    let location = persist_artifact(deps.store, deps.report_prefix, &artifact).await?;

    Ok(RunOutcome { location, artifact })
}

/// Ingest and run the pipeline. No persistence.
pub async fn build_artifact(
    source: &dyn RecordSource,
    options: &FilterOptions,
    today: chrono::NaiveDate,
    run_id: Uuid,
    now: DateTime<Utc>,
) -> anyhow::Result<ReportArtifact> {
    let store = source
        .load()
        .await
        .with_context(|| format!("failed to ingest records from {}", source.describe()))?;

    let output = pipeline::run(&store.records, options, today);
    let allowed = options
        .allowed()
        .iter()
        .map(|r| r.as_label().to_string())
        .collect();

    Ok(ReportArtifact::new(
        run_id,
        now,
        options.window_days(),
        allowed,
        &store,
        &output,
    ))
}

pub async fn persist_artifact(
    store: &dyn ReportStore,
    prefix: &str,
    artifact: &ReportArtifact,
) -> anyhow::Result<String> {
    let key = report_object_key(prefix, artifact.generated_at);
    let body = artifact.to_json_bytes()?;
    store.put(&key, body).await.with_context(|| {
        format!("failed to save report to {} store as {key}", store.store_name())
    })
}
