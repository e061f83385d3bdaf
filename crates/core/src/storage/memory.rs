use crate::storage::{validate_key, ReportStore, StoredObject};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// In-process store for tests and dry runs. Timestamps come from `clock`, not the wall clock.
#[derive(Debug)]
pub struct MemoryReportStore {
    objects: Mutex<BTreeMap<String, (DateTime<Utc>, Vec<u8>)>>,
    clock: DateTime<Utc>,
    pub fail_writes: bool,
}

impl MemoryReportStore {
    pub fn new(clock: DateTime<Utc>) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            clock,
            fail_writes: false,
        }
    }

    pub async fn insert_at(&self, key: &str, last_modified: DateTime<Utc>, body: Vec<u8>) {
        self.objects
            .lock()
            .await
            .insert(key.to_string(), (last_modified, body));
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().await.get(key).map(|(_, b)| b.clone())
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.lock().await.keys().cloned().collect()
    }
}

#[async_trait::async_trait]
impl ReportStore for MemoryReportStore {
    fn store_name(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, key: &str, body: Vec<u8>) -> Result<String> {
        validate_key(key)?;
        anyhow::ensure!(!self.fail_writes, "memory store is read-only");
        self.insert_at(key, self.clock, body).await;
        Ok(format!("memory://{key}"))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<StoredObject>> {
        let prefix = match prefix.trim_matches('/') {
            "" => String::new(),
            dir => format!("{dir}/"),
        };
        Ok(self
            .objects
            .lock()
            .await
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(key, (last_modified, _))| StoredObject {
                key: key.clone(),
                last_modified: *last_modified,
            })
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let removed = self.objects.lock().await.remove(key);
        anyhow::ensure!(removed.is_some(), "no such object: {key}");
        Ok(())
    }
}
