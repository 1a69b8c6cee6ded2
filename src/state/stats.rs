use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters and timestamps for a crawl
///
/// `pages_processed` counts terminal outcomes only: one increment per task
/// that was captured or abandoned after its last retry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrawlStats {
    pub pages_processed: u64,
    pub pages_successful: u64,
    pub pages_failed: u64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl CrawlStats {
    /// Stamps the start time unless a previous run already did
    pub fn mark_started(&mut self) {
        if self.start_time.is_none() {
            self.start_time = Some(Utc::now());
        }
    }

    pub fn mark_finished(&mut self) {
        self.end_time = Some(Utc::now());
    }

    pub fn record_success(&mut self) {
        self.pages_processed += 1;
        self.pages_successful += 1;
    }

    pub fn record_failure(&mut self) {
        self.pages_processed += 1;
        self.pages_failed += 1;
    }
}

/// Index entry for one captured page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMetadataEntry {
    pub id: u64,
    pub url: String,
    pub depth: u32,
    pub filename: String,
    pub timestamp: DateTime<Utc>,
}

/// The run index: stats plus the list of captured pages
///
/// Serialized as `{"stats": {...}, "pages": [...]}`, the shape downstream
/// processing reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunMetadata {
    pub stats: CrawlStats,
    pub pages: Vec<PageMetadataEntry>,
}

impl RunMetadata {
    /// Returns the id following the largest id in the index
    pub fn next_capture_id(&self) -> u64 {
        self.pages
            .iter()
            .map(|page| page.id.saturating_add(1))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64) -> PageMetadataEntry {
        PageMetadataEntry {
            id,
            url: format!("https://example.com/{}", id),
            depth: 0,
            filename: format!("page-{}.json", id),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_record_outcomes() {
        let mut stats = CrawlStats::default();
        stats.record_success();
        stats.record_success();
        stats.record_failure();

        assert_eq!(stats.pages_processed, 3);
        assert_eq!(stats.pages_successful, 2);
        assert_eq!(stats.pages_failed, 1);
    }

    #[test]
    fn test_mark_started_keeps_first_start() {
        let mut stats = CrawlStats::default();
        stats.mark_started();
        let first = stats.start_time;
        stats.mark_started();
        assert_eq!(stats.start_time, first);
        assert!(stats.end_time.is_none());

        stats.mark_finished();
        assert!(stats.end_time.is_some());
    }

    #[test]
    fn test_stats_json_field_names() {
        let json = serde_json::to_value(CrawlStats::default()).unwrap();
        for key in [
            "pagesProcessed",
            "pagesSuccessful",
            "pagesFailed",
            "startTime",
            "endTime",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
    }

    #[test]
    fn test_next_capture_id() {
        let mut metadata = RunMetadata::default();
        assert_eq!(metadata.next_capture_id(), 0);

        metadata.pages = vec![entry(0), entry(7), entry(3)];
        assert_eq!(metadata.next_capture_id(), 8);
    }

    #[test]
    fn test_next_capture_id_saturates() {
        let mut metadata = RunMetadata::default();
        metadata.pages = vec![entry(u64::MAX)];
        assert_eq!(metadata.next_capture_id(), u64::MAX);
    }

    #[test]
    fn test_parse_partial_metadata() {
        let raw = r#"{"stats": {"pagesProcessed": 4, "startTime": "2024-05-01T10:00:00.000Z"}}"#;
        let metadata: RunMetadata = serde_json::from_str(raw).unwrap();
        assert_eq!(metadata.stats.pages_processed, 4);
        assert_eq!(metadata.stats.pages_failed, 0);
        assert!(metadata.stats.start_time.is_some());
        assert!(metadata.pages.is_empty());
    }
}
