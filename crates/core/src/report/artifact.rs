use crate::domain::record::{RecommendationRecord, RecordStore};
use crate::pipeline::PipelineOutput;
use crate::report::Report;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted form of a run: metadata, the per-broker picks and the report itself.
/// The report is flattened so the boundary fields sit at the top level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub run_id: Uuid,
    pub as_of_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub window_days: i64,
    pub allowed_recommendations: Vec<String>,
    pub stats: RunStats,
    pub broker_top_picks: Vec<RecommendationRecord>,
    #[serde(flatten)]
    pub report: Report,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub rows_read: usize,
    pub rows_rejected: usize,
    pub excluded_by_window: usize,
    pub excluded_by_recommendation: usize,
    pub records_ranked: usize,
}

impl ReportArtifact {
    pub fn new(
        run_id: Uuid,
        generated_at: DateTime<Utc>,
        window_days: i64,
        allowed_recommendations: Vec<String>,
        store: &RecordStore,
        output: &PipelineOutput,
    ) -> Self {
        Self {
            run_id,
            as_of_date: output.filtered.as_of_date,
            generated_at,
            window_days,
            allowed_recommendations,
            stats: RunStats {
                rows_read: store.total_rows(),
                rows_rejected: store.rejected.len(),
                excluded_by_window: output.filtered.excluded_by_window,
                excluded_by_recommendation: output.filtered.excluded_by_recommendation,
                records_ranked: output.filtered.records.len(),
            },
            broker_top_picks: output.ranking.broker_top_picks.values().cloned().collect(),
            report: output.report.clone(),
        }
    }

    pub fn to_json_bytes(&self) -> anyhow::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self).context("report artifact serialization failed")
    }
}

/// `{prefix}/report_{YYYYMMDD-HHMMSS}.json`
pub fn report_object_key(prefix: &str, generated_at: DateTime<Utc>) -> String {
    let prefix = prefix.trim_matches('/');
    let name = format!("report_{}.json", generated_at.format("%Y%m%d-%H%M%S"));
    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}/{name}")
    }
}
