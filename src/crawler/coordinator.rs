//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates:
//! - Managing the frontier
//! - Fetching pages one at a time
//! - Parsing HTML, extracting and filtering links
//! - Invoking the page callback
//! - Containing per-page failures and computing the overall verdict

use crate::config::{validate_starting_point, Config};
use crate::crawler::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::crawler::fetcher::{FetchOutcome, FetchedPage, Fetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::Page;
use crate::url::UrlFilter;
use crate::{ConfigError, FetchError};
use url::Url;

/// A fetch that failed during a crawl
#[derive(Debug)]
pub struct FailedFetch {
    /// The URL that was requested
    pub url: Url,
    pub error: FetchError,
}

/// Main crawler coordinator structure
///
/// A coordinator owns one frontier. Each call to [`Coordinator::start`]
/// begins with a fresh frontier seeded with the starting point; the frontier
/// stays available for inspection after the crawl.
pub struct Coordinator {
    starting_point: Url,
    filter: UrlFilter,
    fetcher: Fetcher,
    sink: Box<dyn DiagnosticSink>,
    tracing: bool,
    frontier: Frontier,
    failures: Vec<FailedFetch>,
}

impl Coordinator {
    /// Creates a new coordinator
    ///
    /// Validates the starting point, compiles the whitelist and blacklist and
    /// builds the HTTP client. Nothing is fetched yet.
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(ConfigError)` - Invalid starting point or pattern
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let starting_point = validate_starting_point(&config.starting_point)?;

        let filter = match &config.whitelist {
            Some(whitelist) => UrlFilter::new(whitelist, &config.blacklist)?,
            None => UrlFilter::for_starting_point(&config.starting_point, &config.blacklist)?,
        };

        let fetcher = Fetcher::new(&config.http).map_err(ConfigError::Client)?;

        Ok(Self {
            frontier: Frontier::new(starting_point.clone()),
            starting_point,
            filter,
            fetcher,
            sink: Box::new(TracingSink::new(config.tracing)),
            tracing: config.tracing,
            failures: Vec::new(),
        })
    }

    /// Replaces the diagnostic sink
    pub fn with_sink(mut self, sink: Box<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replaces the fetcher
    pub fn with_fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Runs the crawl to completion
    ///
    /// Pops URLs most-recently-discovered first, fetches each one, hands every
    /// HTML page to `callback`, and pushes the page's new admitted links.
    ///
    /// A failed fetch is reported, recorded in [`Coordinator::failures`] and
    /// makes the result `false`, but the crawl goes on. A callback error is
    /// reported and otherwise ignored.
    ///
    /// # Returns
    ///
    /// `true` iff every fetch succeeded
    pub async fn start<F>(&mut self, mut callback: F) -> bool
    where
        F: FnMut(&Page) -> anyhow::Result<()>,
    {
        self.frontier = Frontier::new(self.starting_point.clone());
        self.failures.clear();

        let mut success = true;

        while let Some(url) = self.frontier.pop() {
            // A redirect may already have led here
            if self.frontier.is_done(&url) {
                continue;
            }

            self.trace(Diagnostic::Visiting { url: &url });

            let frontier = &self.frontier;
            let outcome = self
                .fetcher
                .fetch_unvisited(&url, |target| frontier.is_done(target))
                .await;

            match outcome {
                Ok(FetchOutcome::Fetched(fetched)) => self.visit(url, fetched, &mut callback),
                Ok(FetchOutcome::RedirectedToVisited { url: target, hops }) => {
                    self.trace(Diagnostic::Redirected {
                        from: &url,
                        to: &target,
                        hops,
                    });
                    self.trace(Diagnostic::AlreadyVisited { url: &target });
                    self.frontier.mark_seen(url);
                }
                Err(error) => {
                    success = false;
                    self.sink.emit(&Diagnostic::FetchFailed {
                        url: &url,
                        error: &error,
                    });
                    // Never retried
                    self.frontier.mark_done(url.clone());
                    self.failures.push(FailedFetch { url, error });
                }
            }
        }

        tracing::debug!(
            "Crawl of {} finished: {} visited, {} failed",
            self.starting_point,
            self.frontier.done().len(),
            self.failures.len()
        );

        success
    }

    /// Processes one successfully fetched response
    fn visit<F>(&mut self, requested: Url, fetched: FetchedPage, callback: &mut F)
    where
        F: FnMut(&Page) -> anyhow::Result<()>,
    {
        if fetched.url != requested {
            self.trace(Diagnostic::Redirected {
                from: &requested,
                to: &fetched.url,
                hops: fetched.redirects,
            });
            self.frontier.mark_seen(requested);
        }

        if !fetched.is_html() {
            self.trace(Diagnostic::NotHtml {
                url: &fetched.url,
                content_type: &fetched.content_type,
            });
            self.frontier.mark_done(fetched.url);
            return;
        }

        let page = Page::parse(fetched);
        let report = page.links(&self.filter);

        if self.tracing {
            for skipped in &report.skipped {
                self.sink.emit(&Diagnostic::LinkSkipped {
                    page: &page.url,
                    link: skipped,
                });
            }
        }

        if let Err(error) = callback(&page) {
            self.sink.emit(&Diagnostic::CallbackFailed {
                url: &page.url,
                error: &error,
            });
        }

        self.frontier.mark_done(page.url.clone());

        let count = self.frontier.push_new(report.admitted);
        if count > 0 {
            self.trace(Diagnostic::LinksAdded {
                page: &page.url,
                count,
            });
        }
    }

    /// Emits a diagnostic that is only wanted when tracing
    fn trace(&mut self, diagnostic: Diagnostic<'_>) {
        if self.tracing {
            self.sink.emit(&diagnostic);
        }
    }

    /// The URL every crawl starts from
    pub fn starting_point(&self) -> &Url {
        &self.starting_point
    }

    /// The compiled whitelist and blacklist
    pub fn filter(&self) -> &UrlFilter {
        &self.filter
    }

    /// URLs still waiting to be visited (bottom of the stack first)
    pub fn todo(&self) -> &[Url] {
        self.frontier.todo()
    }

    /// URLs visited so far, in visit order
    pub fn done(&self) -> &[Url] {
        self.frontier.done()
    }

    /// Fetches that failed during the last crawl
    pub fn failures(&self) -> &[FailedFetch] {
        &self.failures
    }
}
