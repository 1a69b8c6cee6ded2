use crate::state::PageMetadataEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A URL waiting in the frontier, with its link depth from the seeds
///
/// The URL is always in normalized form; this is also the shape of each
/// entry in the persisted pending queue (`{"url": ..., "depth": ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrontierTask {
    pub url: String,
    pub depth: u32,
}

impl FrontierTask {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

impl fmt::Display for FrontierTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (depth {})", self.url, self.depth)
    }
}

/// Terminal result of one dispatched task
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    /// The page was captured and persisted
    Captured {
        /// Index entry for the written capture record
        entry: PageMetadataEntry,
        /// Absolute URLs discovered on the page (anchors or frame sources)
        discovered: Vec<String>,
        /// Attempts used, including the successful one
        attempts: u32,
    },

    /// Every attempt failed; the task is abandoned for this run
    Failed {
        /// Attempts made before giving up
        attempts: u32,
        /// Description of the last error
        error: String,
    },
}

impl TaskOutcome {
    /// Returns true if this represents a successful capture
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Captured { .. })
    }

    /// Number of worker invocations spent on the task
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Captured { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_task_serialization_shape() {
        let task = FrontierTask::new("https://example.com/a", 2);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"url": "https://example.com/a", "depth": 2})
        );
    }

    #[test]
    fn test_task_display() {
        let task = FrontierTask::new("https://example.com/a", 1);
        assert_eq!(task.to_string(), "https://example.com/a (depth 1)");
    }

    #[test]
    fn test_outcome_accessors() {
        let captured = TaskOutcome::Captured {
            entry: PageMetadataEntry {
                id: 0,
                url: "https://example.com/".to_string(),
                depth: 0,
                filename: "page-0.json".to_string(),
                timestamp: Utc::now(),
            },
            discovered: vec![],
            attempts: 2,
        };
        assert!(captured.is_success());
        assert_eq!(captured.attempts(), 2);

        let failed = TaskOutcome::Failed {
            attempts: 4,
            error: "timeout".to_string(),
        };
        assert!(!failed.is_success());
        assert_eq!(failed.attempts(), 4);
    }
}
