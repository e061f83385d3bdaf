use anyhow::Context;
use brokerpick_core::domain::contract::REQUIRED_COLUMNS;
use chrono::{Datelike, Days, NaiveDate};
use std::path::Path;

const BROKERS: [&str; 6] = [
    "ICICI Securities",
    "HDFC Securities",
    "Kotak Securities",
    "Motilal Oswal",
    "Axis Securities",
    "Reliance Securities",
];

const COMPANIES: [&str; 10] = [
    "Tata Motors",
    "Reliance Industries",
    "HDFC Bank",
    "Infosys",
    "Wipro",
    "Bajaj Finance",
    "Maruti Suzuki",
    "Larsen & Toubro",
    "TCS",
    "Hindustan Unilever",
];

/// Reporting dates fall within this many days before the as-of date.
const MAX_AGE_DAYS: u64 = 180;

#[derive(Debug, Clone, PartialEq)]
pub struct MockRow {
    pub broker: &'static str,
    pub company: &'static str,
    pub reporting_date: NaiveDate,
    pub recommendation: &'static str,
    pub profit_potential: f64,
}

/// Deterministic placeholder data: the same `as_of_date` and `count` always give the
/// same rows. Profit potential lies in [-20, 50] with two decimals.
pub fn generate_mock_rows(as_of_date: NaiveDate, count: usize) -> Vec<MockRow> {
    let seed = as_of_date.num_days_from_ce().unsigned_abs() as usize;

    (0..count)
        .map(|i| {
            let days_ago = 1 + ((i * 37 + seed) as u64 % MAX_AGE_DAYS);
            let cents = (i * 7919 + seed * 104_729) % 7001;
            MockRow {
                broker: BROKERS[(i * 7 + seed) % BROKERS.len()],
                company: COMPANIES[(i * 3 + seed / 7) % COMPANIES.len()],
                reporting_date: as_of_date
                    .checked_sub_days(Days::new(days_ago))
                    .unwrap_or(as_of_date),
                recommendation: if (i * 5 + seed / 3) % 2 == 0 { "Buy" } else { "Sell" },
                profit_potential: -20.0 + (cents as f64) / 100.0,
            }
        })
        .collect()
}

pub fn write_mock_csv(path: &Path, rows: &[MockRow]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    wtr.write_record(REQUIRED_COLUMNS)?;
    for row in rows {
        wtr.write_record([
            row.broker.to_string(),
            row.company.to_string(),
            row.reporting_date.format("%Y-%m-%d").to_string(),
            row.recommendation.to_string(),
            format!("{:.2}", row.profit_potential),
        ])?;
    }
    wtr.flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}
