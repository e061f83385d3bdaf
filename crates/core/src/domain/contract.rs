use crate::domain::record::{Recommendation, RecommendationRecord};
use anyhow::{bail, ensure, Context};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const COL_BROKER: &str = "Broker";
pub const COL_COMPANY: &str = "Company";
pub const COL_REPORTING_DATE: &str = "Reporting_Date";
pub const COL_RECOMMENDATION: &str = "Recommendation";
pub const COL_PROFIT_POTENTIAL: &str = "Profit_Potential";

pub const REQUIRED_COLUMNS: [&str; 5] = [
    COL_BROKER,
    COL_COMPANY,
    COL_REPORTING_DATE,
    COL_RECOMMENDATION,
    COL_PROFIT_POTENTIAL,
];

/// One source row as text, before any parsing.
#[derive(Debug, Clone, Default)]
pub struct RawRecommendationRow {
    pub broker: String,
    pub company: String,
    pub reporting_date: String,
    pub recommendation: String,
    pub profit_potential: String,
}

impl RawRecommendationRow {
    pub fn validate_and_into_record(self) -> anyhow::Result<RecommendationRecord> {
        let broker = self.broker.trim().to_string();
        ensure!(!broker.is_empty(), "broker must be non-empty");

        let company = self.company.trim().to_string();
        ensure!(!company.is_empty(), "company must be non-empty");

        let reporting_date = parse_reporting_date(&self.reporting_date)?;

        let profit_potential = self
            .profit_potential
            .trim()
            .parse::<f64>()
            .with_context(|| {
                format!(
                    "profit potential is not numeric: {:?}",
                    self.profit_potential
                )
            })?;
        ensure!(
            profit_potential.is_finite(),
            "profit potential must be finite (got {profit_potential})"
        );

        Ok(RecommendationRecord {
            broker,
            company,
            reporting_date,
            recommendation: Recommendation::from_label(&self.recommendation),
            profit_potential,
        })
    }
}

pub fn parse_reporting_date(s: &str) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    ensure!(!s.is_empty(), "reporting date must be non-empty");

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    bail!("unparsable reporting date: {s:?}")
}
