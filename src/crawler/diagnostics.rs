//! Crawl diagnostics
//!
//! The coordinator reports what it does through a [`DiagnosticSink`] instead
//! of logging directly. Problems (failed fetches, failing callbacks) are always
//! reported; everything else only when tracing is enabled.

use crate::crawler::parser::SkippedLink;
use crate::FetchError;
use std::fmt;
use url::Url;

/// One event worth reporting during a crawl
#[derive(Debug)]
pub enum Diagnostic<'a> {
    /// About to fetch a URL
    Visiting { url: &'a Url },

    /// A fetch ended at a different URL
    Redirected {
        from: &'a Url,
        to: &'a Url,
        hops: usize,
    },

    /// A fetch was redirected to a page that was already visited
    AlreadyVisited { url: &'a Url },

    /// A page was fetched but is not HTML, so it has no links
    NotHtml {
        url: &'a Url,
        content_type: &'a str,
    },

    /// A link on a page was dropped
    LinkSkipped {
        page: &'a Url,
        link: &'a SkippedLink,
    },

    /// New links were pushed onto the frontier
    LinksAdded { page: &'a Url, count: usize },

    /// A fetch failed; the crawl result is now a failure
    FetchFailed {
        url: &'a Url,
        error: &'a FetchError,
    },

    /// The page callback returned an error; the crawl continues
    CallbackFailed {
        url: &'a Url,
        error: &'a anyhow::Error,
    },
}

impl Diagnostic<'_> {
    /// Returns true for events that are reported even without tracing
    pub fn is_problem(&self) -> bool {
        matches!(self, Self::FetchFailed { .. } | Self::CallbackFailed { .. })
    }
}

impl fmt::Display for Diagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visiting { url } => write!(f, "Visiting {}", url),
            Self::Redirected { from, to, hops } => {
                write!(f, "{} redirected to {} after {} hop(s)", from, to, hops)
            }
            Self::AlreadyVisited { url } => {
                write!(f, "Skipping {} because it was already visited", url)
            }
            Self::NotHtml { url, content_type } => write!(
                f,
                "Skipping links of {} because it is not HTML ({})",
                url, content_type
            ),
            Self::LinkSkipped { page, link } => write!(
                f,
                "Skipping {} found at {} because {}",
                link.link, page, link.reason
            ),
            Self::LinksAdded { page, count } => {
                write!(f, "Adding {} new links found at {}", count, page)
            }
            Self::FetchFailed { url, error } => write!(f, "Skipping {} because of {}", url, error),
            Self::CallbackFailed { url, error } => {
                write!(f, "Callback error for {}: {}", url, error)
            }
        }
    }
}

/// Receives crawl diagnostics
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: &Diagnostic<'_>);
}

/// Writes diagnostics through `tracing`
///
/// Problems are logged at WARN, everything else at DEBUG. When `detailed` is
/// set, problems carry the full error (with its source chain) as a field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink {
    detailed: bool,
}

impl TracingSink {
    pub fn new(detailed: bool) -> Self {
        Self { detailed }
    }
}

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: &Diagnostic<'_>) {
        match diagnostic {
            Diagnostic::FetchFailed { error, .. } if self.detailed => {
                tracing::warn!(error = ?error, "{}", diagnostic);
            }
            Diagnostic::CallbackFailed { error, .. } if self.detailed => {
                tracing::warn!(error = ?error, "{}", diagnostic);
            }
            d if d.is_problem() => tracing::warn!("{}", d),
            d => tracing::debug!("{}", d),
        }
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn emit(&mut self, _diagnostic: &Diagnostic<'_>) {}
}
