//! Crawl frontier
//!
//! The frontier owns the FIFO queue of pending tasks and the set of URLs
//! already dispatched. Every URL entering it is normalized first, so two
//! spellings of the same page collapse to one entry.

use crate::state::FrontierTask;
use crate::url::{normalize_url, UrlFilter};
use std::collections::{HashSet, VecDeque};

/// FIFO queue of pending pages plus the visited set
///
/// A URL is in at most one of the queue and the visited set, and appears in
/// the queue at most once.
#[derive(Debug, Clone)]
pub struct Frontier {
    queue: VecDeque<FrontierTask>,
    queued: HashSet<String>,
    visited: HashSet<String>,
    filter: UrlFilter,
    max_depth: u32,
}

impl Frontier {
    /// Creates an empty frontier
    ///
    /// # Arguments
    ///
    /// * `filter` - Include/exclude patterns applied to discovered links
    /// * `max_depth` - Deepest link depth that is still enqueued
    pub fn new(filter: UrlFilter, max_depth: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            filter,
            max_depth,
        }
    }

    /// Restores the state captured by a checkpoint
    ///
    /// Pending tasks go through the same admission rules as when they were
    /// first queued, so tasks also present in `visited` (or repeated) are
    /// dropped. Depth 0 tasks are seeds and skip the URL patterns.
    pub fn restore(&mut self, visited: Vec<String>, pending: Vec<FrontierTask>) {
        self.visited.extend(visited);

        let total = pending.len();
        let admitted = pending
            .into_iter()
            .filter(|task| self.admit(&task.url, task.depth, task.depth == 0))
            .count();

        if admitted < total {
            tracing::debug!(
                "Dropped {} restored tasks (already visited, duplicated, or out of scope)",
                total - admitted
            );
        }
    }

    /// Enqueues seed URLs at depth 0
    ///
    /// Seeds bypass the include/exclude patterns but are still normalized and
    /// deduplicated. Returns the number of seeds enqueued.
    pub fn seed<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        urls.into_iter()
            .filter(|url| self.admit(url.as_ref(), 0, true))
            .count()
    }

    /// Offers a discovered link at `depth`
    ///
    /// The link is dropped when it cannot be normalized, is deeper than the
    /// depth limit, fails the URL patterns, or is already visited or queued.
    ///
    /// # Returns
    ///
    /// `true` if the link was appended to the queue
    pub fn enqueue(&mut self, url: &str, depth: u32) -> bool {
        self.admit(url, depth, false)
    }

    fn admit(&mut self, url: &str, depth: u32, is_seed: bool) -> bool {
        if depth > self.max_depth {
            return false;
        }

        let normalized = match normalize_url(url) {
            Ok(normalized) => normalized.to_string(),
            Err(e) => {
                tracing::trace!("Skipping {}: {}", url, e);
                return false;
            }
        };

        if !is_seed && !self.filter.allows(&normalized) {
            return false;
        }

        if self.visited.contains(&normalized) || self.queued.contains(&normalized) {
            return false;
        }

        self.queued.insert(normalized.clone());
        self.queue.push_back(FrontierTask::new(normalized, depth));
        true
    }

    /// Removes up to `n` tasks from the front of the queue
    pub fn dequeue_batch(&mut self, n: usize) -> Vec<FrontierTask> {
        let take = n.min(self.queue.len());
        let batch: Vec<FrontierTask> = self.queue.drain(..take).collect();
        for task in &batch {
            self.queued.remove(&task.url);
        }
        batch
    }

    /// Marks a URL visited
    ///
    /// # Returns
    ///
    /// `false` if it was already visited
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Visited set in sorted order, for checkpoints
    pub fn visited_urls(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.visited.iter().cloned().collect();
        urls.sort();
        urls
    }

    /// Pending tasks in queue order, for checkpoints
    pub fn pending_tasks(&self) -> Vec<FrontierTask> {
        self.queue.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternConfig;

    fn frontier(max_depth: u32) -> Frontier {
        let patterns = PatternConfig {
            include: vec![r"example\.com".to_string()],
            exclude: vec![r"(?i)\.pdf$".to_string(), "mailto:".to_string()],
        };
        Frontier::new(UrlFilter::new(&patterns).unwrap(), max_depth)
    }

    #[test]
    fn test_fifo_order() {
        let mut f = frontier(10);
        assert!(f.enqueue("https://example.com/a", 1));
        assert!(f.enqueue("https://example.com/b", 1));
        assert!(f.enqueue("https://example.com/c", 2));

        let urls: Vec<String> = f.dequeue_batch(2).into_iter().map(|t| t.url).collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
        assert_eq!(f.pending_count(), 1);
        assert_eq!(f.dequeue_batch(5).len(), 1);
        assert!(f.is_empty());
    }

    #[test]
    fn test_normalizes_and_dedups() {
        let mut f = frontier(10);
        assert!(f.enqueue("https://example.com/a/#top", 1));
        assert!(!f.enqueue("https://example.com/a", 1));
        assert!(!f.enqueue("https://example.com/a//", 2));

        assert_eq!(f.pending_tasks(), vec![FrontierTask::new("https://example.com/a", 1)]);
    }

    #[test]
    fn test_drops_visited() {
        let mut f = frontier(10);
        assert!(f.mark_visited("https://example.com/a"));
        assert!(!f.mark_visited("https://example.com/a"));
        assert!(!f.enqueue("https://example.com/a#x", 1));
        assert!(f.is_empty());
    }

    #[test]
    fn test_depth_limit() {
        let mut f = frontier(2);
        assert!(f.enqueue("https://example.com/two", 2));
        assert!(!f.enqueue("https://example.com/three", 3));
    }

    #[test]
    fn test_patterns() {
        let mut f = frontier(10);
        assert!(!f.enqueue("https://other.org/page", 1));
        assert!(!f.enqueue("https://example.com/manual.PDF", 1));
        assert!(!f.enqueue("mailto:someone@example.com", 1));
        assert!(!f.enqueue("javascript:void(0)", 1));
        assert!(!f.enqueue("not a url", 1));
        assert!(f.is_empty());
    }

    #[test]
    fn test_seeds_bypass_patterns() {
        let mut f = frontier(10);
        let added = f.seed(["https://other.org/start", "https://other.org/start/", "ftp://x/y"]);
        assert_eq!(added, 1);
        assert_eq!(f.pending_tasks(), vec![FrontierTask::new("https://other.org/start", 0)]);
    }

    #[test]
    fn test_dequeued_url_can_be_requeued_until_visited() {
        let mut f = frontier(10);
        f.enqueue("https://example.com/a", 1);
        let batch = f.dequeue_batch(1);
        assert!(f.mark_visited(&batch[0].url));
        assert!(!f.enqueue("https://example.com/a", 1));
    }

    #[test]
    fn test_restore() {
        let mut f = frontier(3);
        f.restore(
            vec!["https://example.com/a".to_string()],
            vec![
                FrontierTask::new("https://example.com/a", 1),
                FrontierTask::new("https://example.com/b", 1),
                FrontierTask::new("https://example.com/b", 2),
                FrontierTask::new("https://example.com/deep", 4),
            ],
        );

        assert!(f.is_visited("https://example.com/a"));
        assert_eq!(f.visited_count(), 1);
        assert_eq!(f.pending_tasks(), vec![FrontierTask::new("https://example.com/b", 1)]);
    }

    #[test]
    fn test_restore_keeps_pending_seeds_outside_patterns() {
        let mut f = frontier(3);
        assert_eq!(f.seed(["https://other.org/x", "https://other.org/y"]), 2);

        let first = f.dequeue_batch(1);
        assert!(f.mark_visited(&first[0].url));
        assert!(f.enqueue("https://example.com/b", 1));
        assert!(!f.enqueue("https://other.org/z", 1));

        let mut resumed = frontier(3);
        resumed.restore(f.visited_urls(), f.pending_tasks());

        assert_eq!(
            resumed.pending_tasks(),
            vec![
                FrontierTask::new("https://other.org/y", 0),
                FrontierTask::new("https://example.com/b", 1),
            ]
        );
        assert!(resumed.is_visited("https://other.org/x"));
    }

    #[test]
    fn test_visited_urls_sorted() {
        let mut f = frontier(3);
        f.mark_visited("https://example.com/z");
        f.mark_visited("https://example.com/a");
        assert_eq!(
            f.visited_urls(),
            vec!["https://example.com/a", "https://example.com/z"]
        );
    }
}
