//! URL handling module for Page-Spider
//!
//! This module turns raw hrefs into comparable page URLs and decides which of
//! them the crawl may follow.

mod filter;
mod normalize;

// Re-export main functions
pub use filter::{default_whitelist_pattern, UrlFilter, Verdict};
pub use normalize::{resolve_link, ResolvedLink};
