use crate::domain::record::RecordStore;
use crate::ingest::delimited::read_records;
use anyhow::{Context, Result};
use std::path::PathBuf;

#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    fn describe(&self) -> String;

    async fn load(&self) -> Result<RecordStore>;
}

#[derive(Debug, Clone)]
pub struct FileRecordSource {
    path: PathBuf,
}

impl FileRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl RecordSource for FileRecordSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<RecordStore> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("failed to read source file {}", self.path.display()))?;
        let store = read_records(bytes.as_slice())?;

        tracing::info!(
            source = %self.path.display(),
            records = store.records.len(),
            rejected = store.rejected.len(),
            "loaded recommendation records"
        );
        Ok(store)
    }
}

/// Source backed by text already in memory, e.g. a request payload.
#[derive(Debug, Clone)]
pub struct InMemoryRecordSource {
    text: String,
}

impl InMemoryRecordSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait::async_trait]
impl RecordSource for InMemoryRecordSource {
    fn describe(&self) -> String {
        "in-memory".to_string()
    }

    async fn load(&self) -> Result<RecordStore> {
        read_records(self.text.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[tokio::test]
    async fn file_source_reads_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broker_data.csv");
        std::fs::write(
            &path,
            "Broker,Company,Reporting_Date,Recommendation,Profit_Potential\n\
             Axis Securities,Infosys,2024-06-01,Buy,12.3\n",
        )
        .unwrap();

        let store = FileRecordSource::new(&path).load().await.unwrap();
        assert_eq!(store.records.len(), 1);
        assert_eq!(store.records[0].company, "Infosys");
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error_not_a_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileRecordSource::new(dir.path().join("absent.csv"))
            .load()
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ValidationError>().is_none());
        assert!(format!("{err:#}").contains("failed to read source file"));
    }

    #[tokio::test]
    async fn in_memory_source_propagates_validation_errors() {
        let err = InMemoryRecordSource::new("Broker,Company\nA,B\n")
            .load()
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ValidationError>(),
            Some(ValidationError::MissingColumns(_))
        ));
    }
}
