use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
    Other(String),
}

impl Recommendation {
    /// Labels are matched exactly; anything unrecognised is kept verbatim.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Buy" => Recommendation::Buy,
            "Sell" => Recommendation::Sell,
            "Hold" => Recommendation::Hold,
            other => Recommendation::Other(other.to_string()),
        }
    }

    pub fn as_label(&self) -> &str {
        match self {
            Recommendation::Buy => "Buy",
            Recommendation::Sell => "Sell",
            Recommendation::Hold => "Hold",
            Recommendation::Other(label) => label,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

impl From<String> for Recommendation {
    fn from(s: String) -> Self {
        Recommendation::from_label(&s)
    }
}

impl From<Recommendation> for String {
    fn from(r: Recommendation) -> Self {
        r.as_label().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub broker: String,
    pub company: String,
    pub reporting_date: NaiveDate,
    pub recommendation: Recommendation,
    /// Expected return in percent. Always finite.
    pub profit_potential: f64,
}

/// Ingested records in source order, plus the rows that failed to parse.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    pub records: Vec<RecommendationRecord>,
    pub rejected: Vec<RejectedRow>,
}

impl RecordStore {
    pub fn total_rows(&self) -> usize {
        self.records.len() + self.rejected.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    /// 1-based line in the source, header included.
    pub line: u64,
    pub reason: String,
}
