//! Saved Report History
//!
//! Information Hiding:
//! - The whole history lives in one blob under `rg_saved_reports`
//! - Ordering (newest first) and the size cap are enforced on every write
//! - Callers get typed reports and listing metadata, never raw JSON

use super::{decode_or_default, KeyValueStore};
use crate::models::{ActivityItem, ActivityType, ReportData, SavedReportMetadata};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

pub const HISTORY_KEY: &str = "rg_saved_reports";
pub const DEFAULT_HISTORY_LIMIT: usize = 20;
const MAX_ACTIVITY_ITEMS: usize = 8;

pub struct ReportHistory {
    store: Arc<dyn KeyValueStore>,
    limit: usize,
}

impl ReportHistory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_limit(store, DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(store: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        Self {
            store,
            limit: limit.max(1),
        }
    }

    async fn read_all(&self) -> Result<Vec<ReportData>> {
        Ok(decode_or_default(HISTORY_KEY, self.store.get(HISTORY_KEY).await?))
    }

    async fn write_all(&self, mut reports: Vec<ReportData>) -> Result<()> {
        reports.truncate(self.limit);
        self.store
            .set(HISTORY_KEY, serde_json::to_value(&reports)?)
            .await
    }

    /// Replace a report with the same id in place, otherwise insert at the front
    pub async fn save_report(&self, report: &ReportData) -> Result<()> {
        let mut reports = self.read_all().await?;

        match reports.iter_mut().find(|r| r.id == report.id) {
            Some(existing) => *existing = report.clone(),
            None => reports.insert(0, report.clone()),
        }

        self.write_all(reports).await?;
        tracing::info!("[ReportHistory] Saved report {}", report.id);
        Ok(())
    }

    /// Move a report to the front of the history, dropping any older copy
    pub async fn add_to_history(&self, report: &ReportData) -> Result<()> {
        let mut reports = self.read_all().await?;
        reports.retain(|r| r.id != report.id);
        reports.insert(0, report.clone());

        self.write_all(reports).await?;
        tracing::info!("[ReportHistory] Added report {} to history", report.id);
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<SavedReportMetadata>> {
        Ok(self
            .read_all()
            .await?
            .iter()
            .map(SavedReportMetadata::from)
            .collect())
    }

    pub async fn load(&self, id: &str) -> Result<Option<ReportData>> {
        Ok(self.read_all().await?.into_iter().find(|r| r.id == id))
    }

    /// Returns whether anything was removed
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut reports = self.read_all().await?;
        let before = reports.len();
        reports.retain(|r| r.id != id);
        let removed = reports.len() != before;

        self.write_all(reports).await?;
        if removed {
            tracing::info!("[ReportHistory] Deleted report {}", id);
        }
        Ok(removed)
    }

    /// Generated-report feed, newest first
    pub async fn recent_activity(&self) -> Result<Vec<ActivityItem>> {
        let mut activity: Vec<ActivityItem> = self
            .read_all()
            .await?
            .into_iter()
            .map(|r| ActivityItem {
                id: format!("gen_{}", r.id),
                activity_type: ActivityType::ReportGenerated,
                description: format!("Generated {}", r.title),
                timestamp: parse_report_date(&r.date),
                meta: Some(r.id),
            })
            .collect();

        activity.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        activity.truncate(MAX_ACTIVITY_ITEMS);
        Ok(activity)
    }
}

/// Report dates are stored as `MM/DD/YYYY`; anything unreadable sorts last
fn parse_report_date(date: &str) -> DateTime<Utc> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(date) {
        return ts.with_timezone(&Utc);
    }
    NaiveDate::parse_from_str(date, "%m/%d/%Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use serde_json::json;

    fn report(id: &str, date: &str) -> ReportData {
        ReportData {
            id: id.to_string(),
            title: format!("Report {}", id),
            date: date.to_string(),
            ..ReportData::default()
        }
    }

    fn history() -> ReportHistory {
        ReportHistory::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_save_report_inserts_newest_first() {
        let history = history();
        history.save_report(&report("a", "01/01/2024")).await.unwrap();
        history.save_report(&report("b", "01/02/2024")).await.unwrap();

        let ids: Vec<String> = history.list().await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_save_report_replaces_in_place() {
        let history = history();
        history.save_report(&report("a", "01/01/2024")).await.unwrap();
        history.save_report(&report("b", "01/02/2024")).await.unwrap();

        let mut updated = report("a", "01/01/2024");
        updated.title = "Renamed".to_string();
        history.save_report(&updated).await.unwrap();

        let listing = history.list().await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[1].id, "a");
        assert_eq!(listing[1].title, "Renamed");
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let history = history();
        for i in 0..21 {
            history
                .save_report(&report(&format!("r{}", i), "01/01/2024"))
                .await
                .unwrap();
        }

        let listing = history.list().await.unwrap();
        assert_eq!(listing.len(), 20);
        assert_eq!(listing[0].id, "r20");
        assert!(listing.iter().all(|m| m.id != "r0"));
    }

    #[tokio::test]
    async fn test_add_to_history_moves_existing_to_front() {
        let history = history();
        history.add_to_history(&report("a", "01/01/2024")).await.unwrap();
        history.add_to_history(&report("b", "01/01/2024")).await.unwrap();
        history.add_to_history(&report("a", "01/01/2024")).await.unwrap();

        let ids: Vec<String> = history.list().await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_load_and_delete() {
        let history = history();
        history.save_report(&report("a", "01/01/2024")).await.unwrap();

        assert!(history.load("a").await.unwrap().is_some());
        assert!(history.delete("a").await.unwrap());
        assert!(!history.delete("a").await.unwrap());
        assert!(history.load("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_blob_reads_as_empty() {
        let store = Arc::new(InMemoryStore::new());
        store.set(HISTORY_KEY, json!({"not": "a list"})).await.unwrap();

        let history = ReportHistory::new(store);
        assert!(history.list().await.unwrap().is_empty());
        history.save_report(&report("a", "01/01/2024")).await.unwrap();
        assert_eq!(history.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_recent_activity_sorted_and_capped() {
        let history = history();
        for day in 1..=10 {
            history
                .save_report(&report(&format!("r{}", day), &format!("03/{:02}/2024", day)))
                .await
                .unwrap();
        }
        history.save_report(&report("undated", "")).await.unwrap();

        let activity = history.recent_activity().await.unwrap();
        assert_eq!(activity.len(), 8);
        assert_eq!(activity[0].meta.as_deref(), Some("r10"));
        assert_eq!(activity[0].id, "gen_r10");
        assert!(activity.iter().all(|a| a.meta.as_deref() != Some("undated")));
    }
}
