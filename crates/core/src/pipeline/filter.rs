use crate::domain::record::{Recommendation, RecommendationRecord};
use crate::error::ValidationError;
use chrono::{Days, NaiveDate};
use std::collections::BTreeSet;

pub const DEFAULT_WINDOW_DAYS: i64 = 90;
pub const MAX_WINDOW_DAYS: i64 = 36_500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    window_days: i64,
    allowed: BTreeSet<Recommendation>,
}

impl FilterOptions {
    pub fn new(
        window_days: i64,
        allowed: impl IntoIterator<Item = Recommendation>,
    ) -> anyhow::Result<Self> {
        if !(1..=MAX_WINDOW_DAYS).contains(&window_days) {
            return Err(ValidationError::InvalidOptions(format!(
                "window_days must be 1..={MAX_WINDOW_DAYS} (got {window_days})"
            ))
            .into());
        }

        let allowed: BTreeSet<Recommendation> = allowed.into_iter().collect();
        if allowed.is_empty() {
            return Err(ValidationError::InvalidOptions(
                "allowed recommendations must be non-empty".to_string(),
            )
            .into());
        }

        Ok(Self {
            window_days,
            allowed,
        })
    }

    pub fn window_days(&self) -> i64 {
        self.window_days
    }

    pub fn allowed(&self) -> &BTreeSet<Recommendation> {
        &self.allowed
    }

    /// Earliest reporting date still inside the window.
    pub fn cutoff(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(self.window_days as u64))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn in_window(&self, record: &RecommendationRecord, today: NaiveDate) -> bool {
        record.reporting_date >= self.cutoff(today)
    }

    pub fn is_allowed(&self, record: &RecommendationRecord) -> bool {
        self.allowed.contains(&record.recommendation)
    }
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            allowed: [Recommendation::Buy, Recommendation::Sell].into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilteredView {
    pub as_of_date: NaiveDate,
    pub cutoff: NaiveDate,
    pub records: Vec<RecommendationRecord>,
    /// Counted first when a record fails both predicates.
    pub excluded_by_window: usize,
    pub excluded_by_recommendation: usize,
}

impl FilteredView {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn filter(
    records: &[RecommendationRecord],
    opts: &FilterOptions,
    today: NaiveDate,
) -> FilteredView {
    let cutoff = opts.cutoff(today);
    let mut view = FilteredView {
        as_of_date: today,
        cutoff,
        records: Vec::with_capacity(records.len()),
        excluded_by_window: 0,
        excluded_by_recommendation: 0,
    };

    for record in records {
        if record.reporting_date < cutoff {
            view.excluded_by_window += 1;
        } else if !opts.is_allowed(record) {
            view.excluded_by_recommendation += 1;
        } else {
            view.records.push(record.clone());
        }
    }

    tracing::debug!(
        %today,
        %cutoff,
        kept = view.records.len(),
        excluded_by_window = view.excluded_by_window,
        excluded_by_recommendation = view.excluded_by_recommendation,
        "filtered recommendation records"
    );

    view
}
