use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Result of evaluating a candidate link against the whitelist and blacklist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Eligible for the frontier
    Admitted,
    /// No whitelist pattern matches
    NotWhitelisted,
    /// Whitelisted, but excluded by the given blacklist pattern
    Blacklisted { pattern: String },
}

impl Verdict {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// Compiled whitelist and blacklist for one crawl
///
/// A URL is admitted iff it matches at least one whitelist pattern and no
/// blacklist pattern. Patterns use plain `regex` semantics and are matched
/// against the full serialized URL, unanchored unless the pattern says so.
#[derive(Debug, Clone)]
pub struct UrlFilter {
    whitelist: Vec<Regex>,
    blacklist: Vec<Regex>,
}

impl UrlFilter {
    /// Compiles the given patterns
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPattern` naming the first pattern that
    /// does not compile.
    pub fn new<W, B>(whitelist: W, blacklist: B) -> Result<Self, ConfigError>
    where
        W: IntoIterator,
        W::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        Ok(Self {
            whitelist: compile_all(whitelist)?,
            blacklist: compile_all(blacklist)?,
        })
    }

    /// Builds a filter whose whitelist is the default for `starting_point`
    ///
    /// The default admits every URL whose serialization starts with the
    /// literal starting-point string. The string is used exactly as given,
    /// not in its parsed form, so `HTTP://Example.com` admits nothing.
    pub fn for_starting_point<B>(starting_point: &str, blacklist: B) -> Result<Self, ConfigError>
    where
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        Self::new([default_whitelist_pattern(starting_point)], blacklist)
    }

    /// Evaluates a candidate URL
    ///
    /// # Examples
    ///
    /// ```
    /// use page_spider::url::{UrlFilter, Verdict};
    /// use url::Url;
    ///
    /// let filter = UrlFilter::for_starting_point("https://example.com/docs/", ["\\.pdf$"]).unwrap();
    ///
    /// let page = Url::parse("https://example.com/docs/intro.html").unwrap();
    /// assert_eq!(filter.evaluate(&page), Verdict::Admitted);
    ///
    /// let outside = Url::parse("https://example.com/blog/").unwrap();
    /// assert_eq!(filter.evaluate(&outside), Verdict::NotWhitelisted);
    ///
    /// let pdf = Url::parse("https://example.com/docs/manual.pdf").unwrap();
    /// assert!(matches!(filter.evaluate(&pdf), Verdict::Blacklisted { .. }));
    /// ```
    pub fn evaluate(&self, url: &Url) -> Verdict {
        let candidate = url.as_str();

        if !self.whitelist.iter().any(|re| re.is_match(candidate)) {
            return Verdict::NotWhitelisted;
        }

        if let Some(re) = self.blacklist.iter().find(|re| re.is_match(candidate)) {
            return Verdict::Blacklisted {
                pattern: re.as_str().to_string(),
            };
        }

        Verdict::Admitted
    }

    /// Returns true if the URL may enter the frontier
    pub fn admits(&self, url: &Url) -> bool {
        self.evaluate(url).is_admitted()
    }

    /// The whitelist patterns, in the order they were given
    pub fn whitelist(&self) -> impl Iterator<Item = &str> {
        self.whitelist.iter().map(Regex::as_str)
    }

    /// The blacklist patterns, in the order they were given
    pub fn blacklist(&self) -> impl Iterator<Item = &str> {
        self.blacklist.iter().map(Regex::as_str)
    }
}

/// The pattern used when no whitelist is configured
pub fn default_whitelist_pattern(starting_point: &str) -> String {
    format!("^{}", regex::escape(starting_point))
}

fn compile_all<I>(patterns: I) -> Result<Vec<Regex>, ConfigError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
        })
        .collect()
}
