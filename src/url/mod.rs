//! URL handling module for Page-Harvest
//!
//! This module provides URL normalization, href/frame resolution, and the
//! include/exclude pattern contract used by the frontier.

mod matcher;
mod normalize;

// Re-export main functions
pub use matcher::UrlFilter;
pub use normalize::{normalize_url, resolve_frame_src, resolve_href};
