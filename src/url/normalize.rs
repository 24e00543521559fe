use crate::UrlError;
use url::Url;

/// Schemes that can be fetched
const NAVIGABLE_SCHEMES: &[&str] = &["http", "https"];

/// Outcome of resolving one href found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLink {
    /// An absolute link to a document, with its fragment removed
    Document(Url),

    /// A reference to the current document (`#section` or an empty href)
    SameDocument,
}

/// Resolves an href against the URL of the page it was found on
///
/// # Resolution Steps
///
/// 1. Trim surrounding whitespace
/// 2. Empty and fragment-only hrefs refer to the current document
/// 3. Join with `base` per the WHATWG URL standard; reject if malformed
/// 4. Reject anything that is not http or https
/// 5. Remove the fragment, so `page.html` and `page.html#top` are the same page
///
/// # Arguments
///
/// * `base` - The (post-redirect) URL of the page containing the link
/// * `href` - The raw `href` attribute value
///
/// # Returns
///
/// * `Ok(ResolvedLink)` - A navigable document or a same-document reference
/// * `Err(UrlError)` - The href cannot be turned into a fetchable URL
///
/// # Examples
///
/// ```
/// use page_spider::url::{resolve_link, ResolvedLink};
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/").unwrap();
///
/// let link = resolve_link(&base, "intro.html#setup").unwrap();
/// assert_eq!(
///     link,
///     ResolvedLink::Document(Url::parse("https://example.com/docs/intro.html").unwrap())
/// );
///
/// assert_eq!(resolve_link(&base, "#top").unwrap(), ResolvedLink::SameDocument);
/// ```
pub fn resolve_link(base: &Url, href: &str) -> Result<ResolvedLink, UrlError> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return Ok(ResolvedLink::SameDocument);
    }

    let mut url = base.join(href).map_err(|source| UrlError::Invalid {
        href: href.to_string(),
        source,
    })?;

    if !NAVIGABLE_SCHEMES.contains(&url.scheme()) {
        return Err(UrlError::UnsupportedScheme {
            href: href.to_string(),
            scheme: url.scheme().to_string(),
        });
    }

    url.set_fragment(None);

    Ok(ResolvedLink::Document(url))
}
