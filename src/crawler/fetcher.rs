//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - GET requests to fetch page content
//! - Explicit, bounded redirect handling
//! - Error classification

use crate::config::HttpConfig;
use crate::FetchError;
use reqwest::{header, redirect::Policy, Client, Response, StatusCode};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for one logical fetch
pub const MAX_REDIRECT_HOPS: usize = 10;

/// Content type assumed when a response does not declare one
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A successfully fetched response
///
/// Every field is always populated, whatever the server sent.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: Url,
    /// HTTP status code of the final response
    pub status: u16,
    /// Content-Type header value, or `application/octet-stream` if absent
    pub content_type: String,
    /// Response body
    pub body: String,
    /// Number of redirects followed to reach `url`
    pub redirects: usize,
}

impl FetchedPage {
    /// Returns true if the response is an HTML document
    pub fn is_html(&self) -> bool {
        media_type(&self.content_type) == "text/html"
    }
}

/// Result of a fetch that may stop at an already visited page
#[derive(Debug)]
pub enum FetchOutcome {
    /// The chain ended at a new page
    Fetched(FetchedPage),

    /// The chain led to `url`, which was not requested again
    RedirectedToVisited { url: Url, hops: usize },
}

/// Returns the lowercased media type of a Content-Type value, without parameters
///
/// ```
/// use page_spider::crawler::media_type;
///
/// assert_eq!(media_type("Text/HTML; charset=UTF-8"), "text/html");
/// ```
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// One step of a redirect chain
#[derive(Debug)]
pub enum Hop<T> {
    /// The server pointed somewhere else
    Redirect(Url),
    /// The chain ended with this value
    Done(T),
}

/// Outcome of following a redirect chain
#[derive(Debug)]
pub enum Redirected<T> {
    /// The chain ended within budget
    Resolved {
        /// URL that produced `value`
        url: Url,
        value: T,
        /// Redirects followed
        hops: usize,
    },

    /// The budget ran out
    TooManyRedirects {
        /// The redirect target that would have exceeded the budget
        last: Url,
        hops: usize,
    },
}

/// Follows redirects from `start`, at most `max_hops` times
///
/// `step` performs one request and reports whether it was redirected. The
/// redirect response that would exceed the budget is not followed.
///
/// # Examples
///
/// ```
/// use page_spider::crawler::{follow_redirects, Hop, Redirected};
/// use std::convert::Infallible;
/// use url::Url;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let start = Url::parse("https://example.com/old").unwrap();
/// let outcome = follow_redirects(start, 10, |url: Url| async move {
///     if url.path() == "/old" {
///         Ok::<_, Infallible>(Hop::Redirect(url.join("/new").unwrap()))
///     } else {
///         Ok(Hop::Done(url.path().to_string()))
///     }
/// })
/// .await
/// .unwrap();
///
/// match outcome {
///     Redirected::Resolved { url, value, hops } => {
///         assert_eq!(url.path(), "/new");
///         assert_eq!(value, "/new");
///         assert_eq!(hops, 1);
///     }
///     Redirected::TooManyRedirects { .. } => unreachable!(),
/// }
/// # }
/// ```
pub async fn follow_redirects<T, E, F, Fut>(
    start: Url,
    max_hops: usize,
    mut step: F,
) -> Result<Redirected<T>, E>
where
    F: FnMut(Url) -> Fut,
    Fut: Future<Output = Result<Hop<T>, E>>,
{
    let mut current = start;
    let mut hops = 0;

    loop {
        match step(current.clone()).await? {
            Hop::Done(value) => {
                return Ok(Redirected::Resolved {
                    url: current,
                    value,
                    hops,
                })
            }
            Hop::Redirect(next) => {
                if hops == max_hops {
                    return Ok(Redirected::TooManyRedirects { last: next, hops });
                }
                hops += 1;
                current = next;
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are disabled in the client; [`Fetcher`] follows them itself so
/// that every hop is observed and counted.
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs logical fetches: one GET per hop, redirects followed explicitly
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with a client built from `config`
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Wraps an existing client
    ///
    /// The client should not follow redirects by itself, or the hop budget
    /// and final-URL tracking are bypassed.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a URL
    ///
    /// # Request Flow
    ///
    /// 1. Send GET
    /// 2. On a 3xx with a `Location` header, resolve it against the current
    ///    URL and go back to 1 (at most [`MAX_REDIRECT_HOPS`] times)
    /// 3. Reject any non-2xx final status
    /// 4. Read the body
    ///
    /// # Errors
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | Connection/timeout/TLS failure | `FetchError::Request` |
    /// | Final status not 2xx | `FetchError::Status` |
    /// | 3xx without `Location` | `FetchError::MissingLocation` |
    /// | Unparseable `Location` | `FetchError::InvalidLocation` |
    /// | More than 10 redirects | `FetchError::TooManyRedirects` |
    /// | Body read failure | `FetchError::Body` |
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let outcome = follow_redirects(url.clone(), MAX_REDIRECT_HOPS, |hop: Url| self.send(hop))
            .await?;

        match outcome {
            Redirected::Resolved {
                url: final_url,
                value: response,
                hops,
            } => self.read_page(final_url, response, hops).await,
            Redirected::TooManyRedirects { hops, .. } => Err(too_many_redirects(url, hops)),
        }
    }

    /// Fetches a URL, stopping before any redirect target for which
    /// `visited` returns true
    ///
    /// The first request is always sent. Behaves like [`Fetcher::fetch`]
    /// otherwise.
    pub async fn fetch_unvisited<V>(
        &self,
        url: &Url,
        visited: V,
    ) -> Result<FetchOutcome, FetchError>
    where
        V: Fn(&Url) -> bool,
    {
        let outcome = follow_redirects(url.clone(), MAX_REDIRECT_HOPS, |hop: Url| {
            let stop = hop != *url && visited(&hop);
            async move {
                if stop {
                    return Ok::<_, FetchError>(Hop::Done(None));
                }
                self.send(hop).await.map(|step| match step {
                    Hop::Redirect(next) => Hop::Redirect(next),
                    Hop::Done(response) => Hop::Done(Some(response)),
                })
            }
        })
        .await?;

        match outcome {
            Redirected::Resolved {
                url: target,
                value: None,
                hops,
            } => Ok(FetchOutcome::RedirectedToVisited { url: target, hops }),
            Redirected::Resolved {
                url: final_url,
                value: Some(response),
                hops,
            } => Ok(FetchOutcome::Fetched(
                self.read_page(final_url, response, hops).await?,
            )),
            Redirected::TooManyRedirects { hops, .. } => Err(too_many_redirects(url, hops)),
        }
    }

    /// Checks the final status and reads the body
    async fn read_page(
        &self,
        final_url: Url,
        response: Response,
        redirects: usize,
    ) -> Result<FetchedPage, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: final_url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();

        let body = response.text().await.map_err(|source| FetchError::Body {
            url: final_url.to_string(),
            source,
        })?;

        Ok(FetchedPage {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
            redirects,
        })
    }

    /// Sends a single GET and classifies the response as a hop
    async fn send(&self, url: Url) -> Result<Hop<Response>, FetchError> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_redirection() || status == StatusCode::NOT_MODIFIED {
            return Ok(Hop::Done(response));
        }

        let location = response
            .headers()
            .get(header::LOCATION)
            .ok_or_else(|| FetchError::MissingLocation {
                url: url.to_string(),
                status: status.as_u16(),
            })?;

        let invalid = || FetchError::InvalidLocation {
            url: url.to_string(),
            location: String::from_utf8_lossy(location.as_bytes()).into_owned(),
        };
        let target = location.to_str().map_err(|_| invalid())?;
        let mut next = url.join(target.trim()).map_err(|_| invalid())?;
        // Pages are identified without their fragment
        next.set_fragment(None);

        tracing::debug!("{} {} redirects to {}", status.as_u16(), url, next);
        Ok(Hop::Redirect(next))
    }
}

fn too_many_redirects(url: &Url, hops: usize) -> FetchError {
    FetchError::TooManyRedirects {
        url: url.to_string(),
        hops,
    }
}
