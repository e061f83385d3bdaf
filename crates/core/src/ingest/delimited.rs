use crate::domain::contract::{
    RawRecommendationRow, COL_BROKER, COL_COMPANY, COL_PROFIT_POTENTIAL, COL_RECOMMENDATION,
    COL_REPORTING_DATE, REQUIRED_COLUMNS,
};
use crate::domain::record::{RecordStore, RejectedRow};
use crate::error::ValidationError;
use anyhow::{Context, Result};
use std::io::Read;

/// Reads comma separated recommendation rows.
pub fn read_records<R: Read>(reader: R) -> Result<RecordStore> {
    read_records_delimited(reader, b',')
}

/// Header names are matched exactly. Rows that fail to parse are collected in
/// `RecordStore::rejected` instead of failing the read.
pub fn read_records_delimited<R: Read>(reader: R, delimiter: u8) -> Result<RecordStore> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::Fields)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("failed to read header row")?.clone();
    let columns = ColumnIndex::resolve(&headers)?;

    let mut store = RecordStore::default();
    for (idx, result) in rdr.records().enumerate() {
        // Header is line 1.
        let fallback_line = idx as u64 + 2;
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                let line = err.position().map(|p| p.line()).unwrap_or(fallback_line);
                store.rejected.push(RejectedRow {
                    line,
                    reason: format!("unreadable row: {err}"),
                });
                continue;
            }
        };
        let line = row.position().map(|p| p.line()).unwrap_or(fallback_line);

        match columns.raw_row(&row).validate_and_into_record() {
            Ok(record) => store.records.push(record),
            Err(err) => store.rejected.push(RejectedRow {
                line,
                reason: format!("{err:#}"),
            }),
        }
    }

    if store.total_rows() == 0 {
        return Err(ValidationError::EmptySource.into());
    }

    if !store.rejected.is_empty() {
        tracing::warn!(
            rejected = store.rejected.len(),
            accepted = store.records.len(),
            first_line = store.rejected[0].line,
            first_reason = %store.rejected[0].reason,
            "skipped unparsable recommendation rows"
        );
    }

    Ok(store)
}

struct ColumnIndex {
    broker: usize,
    company: usize,
    reporting_date: usize,
    recommendation: usize,
    profit_potential: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .into_iter()
            .filter(|name| column_position(headers, name).is_none())
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingColumns(missing).into());
        }

        let require = |name: &str| {
            column_position(headers, name)
                .ok_or_else(|| ValidationError::MissingColumns(vec![name.to_string()]))
        };

        Ok(Self {
            broker: require(COL_BROKER)?,
            company: require(COL_COMPANY)?,
            reporting_date: require(COL_REPORTING_DATE)?,
            recommendation: require(COL_RECOMMENDATION)?,
            profit_potential: require(COL_PROFIT_POTENTIAL)?,
        })
    }

    fn raw_row(&self, row: &csv::StringRecord) -> RawRecommendationRow {
        let field = |idx: usize| row.get(idx).unwrap_or_default().to_string();
        RawRecommendationRow {
            broker: field(self.broker),
            company: field(self.company),
            reporting_date: field(self.reporting_date),
            recommendation: field(self.recommendation),
            profit_potential: field(self.profit_potential),
        }
    }
}

fn column_position(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}
