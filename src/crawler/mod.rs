//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with explicit redirect handling
//! - HTML parsing and link extraction
//! - The LIFO crawl frontier
//! - Overall crawl coordination and diagnostics

mod coordinator;
mod diagnostics;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{Coordinator, FailedFetch};
pub use diagnostics::{Diagnostic, DiagnosticSink, NullSink, TracingSink};
pub use fetcher::{
    build_http_client, follow_redirects, media_type, FetchOutcome, FetchedPage, Fetcher, Hop,
    Redirected, MAX_REDIRECT_HOPS,
};
pub use frontier::Frontier;
pub use parser::{extract_links, LinkReport, Page, SkipReason, SkippedLink};

use crate::config::Config;

/// Runs a complete crawl operation
///
/// Convenience wrapper around [`Coordinator`] for callers that only need the
/// verdict.
///
/// # Arguments
///
/// * `config` - The crawl configuration
/// * `callback` - Called once for every fetched HTML page
///
/// # Returns
///
/// * `Ok(true)` - Every fetch succeeded
/// * `Ok(false)` - At least one fetch failed
/// * `Err(SpiderError::Config)` - The configuration is invalid; nothing was fetched
pub async fn crawl<F>(config: Config, callback: F) -> crate::Result<bool>
where
    F: FnMut(&Page) -> anyhow::Result<()>,
{
    let mut coordinator = Coordinator::new(config)?;
    Ok(coordinator.start(callback).await)
}
