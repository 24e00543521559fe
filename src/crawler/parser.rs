//! HTML parser for extracting links and metadata
//!
//! Each fetched HTML page is parsed exactly once. The parsed document is used
//! both for link extraction and as the document handed to the page callback.

use crate::crawler::fetcher::FetchedPage;
use crate::url::{resolve_link, ResolvedLink, UrlFilter, Verdict};
use crate::UrlError;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// A fetched and parsed HTML page
pub struct Page {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: String,
    /// Raw page body
    pub body: String,
    /// Parsed document
    pub document: Html,
}

impl Page {
    /// Parses the body of a fetched page
    pub fn parse(fetched: FetchedPage) -> Self {
        let document = Html::parse_document(&fetched.body);

        Self {
            url: fetched.url,
            status: fetched.status,
            content_type: fetched.content_type,
            body: fetched.body,
            document,
        }
    }

    /// Extracts the page title (from the `<title>` tag)
    pub fn title(&self) -> Option<String> {
        let title_selector = Selector::parse("title").ok()?;

        self.document
            .select(&title_selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Extracts the outbound links of this page, resolved against its final URL
    pub fn links(&self, filter: &UrlFilter) -> LinkReport {
        extract_links(&self.document, &self.url, filter)
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("url", &self.url.as_str())
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Why a link found on a page is not followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Fragment-only or empty href
    SameDocument,
    /// The href cannot be resolved to an http(s) URL
    Invalid(UrlError),
    /// No whitelist pattern matches
    NotWhitelisted,
    /// Excluded by a blacklist pattern
    Blacklisted { pattern: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameDocument => write!(f, "it refers to the same document"),
            Self::Invalid(e) => write!(f, "{}", e),
            Self::NotWhitelisted => write!(f, "it is not on the whitelist"),
            Self::Blacklisted { pattern } => {
                write!(f, "it is on the blacklist (matches '{}')", pattern)
            }
        }
    }
}

/// A link that was found but not admitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLink {
    /// The raw href, or the resolved URL once resolution succeeded
    pub link: String,
    pub reason: SkipReason,
}

/// Links extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Admitted links in document order, duplicates collapsed
    pub admitted: Vec<Url>,
    /// Every link that was dropped, in document order
    pub skipped: Vec<SkippedLink>,
}

/// Extracts the links to follow from a parsed HTML document
///
/// # Link Extraction Rules
///
/// - Only `<a href="...">` elements are considered, in document order
/// - Each href is resolved against `base_url` and stripped of its fragment
/// - Fragment-only hrefs, unresolvable hrefs and non-http(s) schemes are skipped
/// - Resolved links must pass `filter`
/// - A link admitted twice on the same page is reported once
///
/// A bad href only affects itself; the rest of the page is still extracted.
///
/// # Arguments
///
/// * `document` - The parsed HTML document
/// * `base_url` - The URL the document was served from (after redirects)
/// * `filter` - The crawl's whitelist and blacklist
///
/// # Example
///
/// ```
/// use page_spider::crawler::extract_links;
/// use page_spider::url::UrlFilter;
/// use scraper::Html;
/// use url::Url;
///
/// let html = Html::parse_document(r##"<a href="/a">A</a> <a href="/a#x">A again</a> <a href="#top">Top</a>"##);
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let filter = UrlFilter::for_starting_point("https://example.com/", [] as [&str; 0]).unwrap();
///
/// let report = extract_links(&html, &base_url, &filter);
/// assert_eq!(report.admitted, vec![Url::parse("https://example.com/a").unwrap()]);
/// assert_eq!(report.skipped.len(), 1);
/// ```
pub fn extract_links(document: &Html, base_url: &Url, filter: &UrlFilter) -> LinkReport {
    let mut report = LinkReport::default();
    let mut seen = HashSet::new();

    let a_selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return report,
    };

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        match classify(href, base_url, filter) {
            Ok(url) => {
                if seen.insert(url.clone()) {
                    report.admitted.push(url);
                }
            }
            Err(skipped) => report.skipped.push(skipped),
        }
    }

    report
}

/// Runs one href through resolution and filtering
fn classify(href: &str, base_url: &Url, filter: &UrlFilter) -> Result<Url, SkippedLink> {
    let skip = |link: String, reason: SkipReason| SkippedLink { link, reason };

    let url = match resolve_link(base_url, href) {
        Ok(ResolvedLink::Document(url)) => url,
        Ok(ResolvedLink::SameDocument) => {
            return Err(skip(href.to_string(), SkipReason::SameDocument))
        }
        Err(e) => return Err(skip(href.to_string(), SkipReason::Invalid(e))),
    };

    match filter.evaluate(&url) {
        Verdict::Admitted => Ok(url),
        Verdict::NotWhitelisted => Err(skip(url.into(), SkipReason::NotWhitelisted)),
        Verdict::Blacklisted { pattern } => {
            Err(skip(url.into(), SkipReason::Blacklisted { pattern }))
        }
    }
}
