use crate::storage::{validate_key, ReportStore, StoredObject};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Report objects as files below a root directory; keys map to relative paths.
#[derive(Debug, Clone)]
pub struct LocalReportStore {
    root: PathBuf,
}

impl LocalReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |p, part| p.join(part)))
    }
}

#[async_trait::async_trait]
impl ReportStore for LocalReportStore {
    fn store_name(&self) -> &'static str {
        "local"
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<String> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("failed to write report {}", path.display()))?;
        Ok(path.display().to_string())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        let prefix = prefix.trim_matches('/');
        let start = if prefix.is_empty() {
            self.root.clone()
        } else {
            self.path_for(prefix)?
        };

        if !tokio::fs::try_exists(&start).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        let mut pending = vec![start];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .with_context(|| format!("failed to list {}", dir.display()))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .with_context(|| format!("failed to list {}", dir.display()))?
            {
                let meta = entry.metadata().await?;
                let path = entry.path();
                if meta.is_dir() {
                    pending.push(path);
                    continue;
                }

                let modified = meta
                    .modified()
                    .with_context(|| format!("no modification time for {}", path.display()))?;
                out.push(StoredObject {
                    key: self.key_for(&path)?,
                    last_modified: DateTime::<Utc>::from(modified),
                });
            }
        }

        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::remove_file(&path)
            .await
            .with_context(|| format!("failed to delete {}", path.display()))
    }
}

impl LocalReportStore {
    fn key_for(&self, path: &Path) -> Result<String> {
        let rel = path
            .strip_prefix(&self.root)
            .with_context(|| format!("{} is outside the store root", path.display()))?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Ok(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_list_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalReportStore::new(dir.path());

        let location = store
            .put("broker_reports/report_20240201-000000.json", b"{}".to_vec())
            .await
            .unwrap();
        assert!(location.ends_with("report_20240201-000000.json"));
        store
            .put("other/report.json", b"{}".to_vec())
            .await
            .unwrap();

        let listed = store.list("broker_reports").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "broker_reports/report_20240201-000000.json");

        assert_eq!(store.list("").await.unwrap().len(), 2);

        store.delete(&listed[0].key).await.unwrap();
        assert!(store.list("broker_reports").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listing_a_missing_prefix_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalReportStore::new(dir.path().join("never-created"));
        assert!(store.list("broker_reports").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn refuses_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalReportStore::new(dir.path());
        assert!(store.put("../escape.json", Vec::new()).await.is_err());
    }
}
