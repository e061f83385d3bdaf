pub mod filter;
pub mod rank;

use crate::domain::record::RecommendationRecord;
use crate::report::{emit, Report};
use chrono::NaiveDate;
use filter::{FilterOptions, FilteredView};
use rank::RankingResult;

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub filtered: FilteredView,
    pub ranking: RankingResult,
    pub report: Report,
}

/// Filter, rank and emit in one pass. Owns no state beyond its return value.
pub fn run(
    records: &[RecommendationRecord],
    opts: &FilterOptions,
    today: NaiveDate,
) -> PipelineOutput {
    let filtered = filter::filter(records, opts, today);
    let ranking = rank::rank(&filtered);
    let report = emit(&ranking);

    tracing::info!(
        as_of_date = %today,
        input = records.len(),
        filtered = filtered.records.len(),
        brokers = ranking.broker_top_picks.len(),
        "ranking pipeline finished"
    );

    PipelineOutput {
        filtered,
        ranking,
        report,
    }
}
