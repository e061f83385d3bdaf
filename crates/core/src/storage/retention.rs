use crate::storage::ReportStore;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};

/// Deletes objects under `prefix` last modified before `now - older_than_days`.
/// Returns the affected keys; with `dry_run` nothing is deleted.
pub async fn cleanup_older_than(
    store: &dyn ReportStore,
    prefix: &str,
    older_than_days: i64,
    now: DateTime<Utc>,
    dry_run: bool,
) -> Result<Vec<String>> {
    anyhow::ensure!(
        older_than_days >= 1,
        "retention must be at least 1 day (got {older_than_days})"
    );
    let cutoff = Duration::try_days(older_than_days)
        .and_then(|age| now.checked_sub_signed(age))
        .with_context(|| format!("retention of {older_than_days} days is out of range"))?;

    let objects = store.list(prefix).await.with_context(|| {
        format!("failed to list {} store under {prefix:?}", store.store_name())
    })?;

    let mut expired = Vec::new();
    for object in objects.into_iter().filter(|o| o.last_modified < cutoff) {
        if !dry_run {
            store.delete(&object.key).await?;
        }
        tracing::info!(
            key = %object.key,
            last_modified = %object.last_modified,
            dry_run,
            "expired report"
        );
        expired.push(object.key);
    }

    tracing::info!(
        prefix,
        %cutoff,
        expired = expired.len(),
        dry_run,
        "report cleanup finished"
    );
    Ok(expired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryReportStore;
    use chrono::TimeZone;

    async fn seeded(now: DateTime<Utc>) -> MemoryReportStore {
        let store = MemoryReportStore::new(now);
        store
            .insert_at("broker_reports/old.json", now - Duration::days(200), Vec::new())
            .await;
        store
            .insert_at("broker_reports/edge.json", now - Duration::days(180), Vec::new())
            .await;
        store
            .insert_at("broker_reports/new.json", now - Duration::days(3), Vec::new())
            .await;
        store
            .insert_at("elsewhere/old.json", now - Duration::days(400), Vec::new())
            .await;
        store
    }

    #[tokio::test]
    async fn removes_only_expired_objects_under_prefix() {
        let now = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
        let store = seeded(now).await;

        let expired = cleanup_older_than(&store, "broker_reports", 180, now, false)
            .await
            .unwrap();
        assert_eq!(expired, vec!["broker_reports/old.json".to_string()]);
        assert_eq!(
            store.keys().await,
            vec![
                "broker_reports/edge.json".to_string(),
                "broker_reports/new.json".to_string(),
                "elsewhere/old.json".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn dry_run_keeps_everything() {
        let now = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
        let store = seeded(now).await;

        let expired = cleanup_older_than(&store, "broker_reports/", 30, now, true)
            .await
            .unwrap();
        assert_eq!(expired.len(), 2);
        assert_eq!(store.keys().await.len(), 4);
    }

    #[tokio::test]
    async fn rejects_zero_retention() {
        let now = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
        let store = seeded(now).await;
        assert!(cleanup_older_than(&store, "", 0, now, false).await.is_err());
    }

    #[tokio::test]
    async fn huge_retention_is_an_error() {
        let now = Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap();
        let store = seeded(now).await;

        let err = cleanup_older_than(&store, "broker_reports", 1_000_000_000, now, true)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("out of range"));
        assert_eq!(store.keys().await.len(), 4);
    }
}
