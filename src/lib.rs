//! Page-Spider: a single-site crawler
//!
//! This crate walks every reachable page of a site, starting from one URL, and
//! hands each fetched HTML page to a caller-supplied handler. Discovered links
//! are resolved, stripped of fragments, filtered through a regex whitelist and
//! blacklist, and visited depth-first (most recently discovered link first).
//!
//! # Example
//!
//! ```no_run
//! use page_spider::config::Config;
//! use page_spider::crawler::Coordinator;
//!
//! # async fn example() -> Result<(), page_spider::SpiderError> {
//! let config = Config::new("https://example.com/");
//! let mut coordinator = Coordinator::new(config)?;
//!
//! let success = coordinator
//!     .start(|page| {
//!         println!("{}", page.url);
//!         Ok(())
//!     })
//!     .await;
//!
//! println!("visited {} pages, success: {}", coordinator.done().len(), success);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod crawler;
pub mod url;

use thiserror::Error;

/// Main error type for Page-Spider operations
///
/// Per-page and per-link errors never end a crawl, so only configuration
/// problems surface here.
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration-specific errors
///
/// These are fatal: they surface before any page is fetched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid starting point '{url}': {reason}")]
    InvalidStartingPoint { url: String, reason: String },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Errors for a single href that cannot become a navigable link
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to resolve '{href}': {source}")]
    Invalid {
        href: String,
        source: ::url::ParseError,
    },

    #[error("Unsupported URL scheme '{scheme}' in '{href}'")]
    UnsupportedScheme { href: String, scheme: String },
}

/// Errors for one logical fetch (including the redirects it follows)
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("HTTP {status} redirect from {url} without a Location header")]
    MissingLocation { url: String, status: u16 },

    #[error("Invalid redirect location '{location}' from {url}")]
    InvalidLocation { url: String, location: String },

    #[error("Too many redirects ({hops}) from {url}")]
    TooManyRedirects { url: String, hops: usize },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

impl FetchError {
    /// The URL the failing request was sent to
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. }
            | Self::Status { url, .. }
            | Self::MissingLocation { url, .. }
            | Self::InvalidLocation { url, .. }
            | Self::TooManyRedirects { url, .. }
            | Self::Body { url, .. } => url,
        }
    }
}

/// Result type alias for Page-Spider operations
pub type Result<T> = std::result::Result<T, SpiderError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Page};
pub use crate::url::{resolve_link, ResolvedLink, UrlFilter, Verdict};
