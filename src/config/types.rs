use serde::Deserialize;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("page-spider/", env!("CARGO_PKG_VERSION"));

/// Main configuration structure for a crawl
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// URL the crawl starts from; always fetched first and never filtered
    #[serde(rename = "starting-point")]
    pub starting_point: String,

    /// Inclusion patterns; `None` means "starts with the starting point"
    #[serde(default)]
    pub whitelist: Option<Vec<String>>,

    /// Exclusion patterns, checked after the whitelist
    #[serde(default)]
    pub blacklist: Vec<String>,

    /// Emit detailed diagnostics; never changes crawl behavior
    #[serde(default)]
    pub tracing: bool,

    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Creates a configuration with the default filters for `starting_point`
    pub fn new(starting_point: impl Into<String>) -> Self {
        Self {
            starting_point: starting_point.into(),
            whitelist: None,
            blacklist: Vec::new(),
            tracing: false,
            http: HttpConfig::default(),
        }
    }

    /// Replaces the default whitelist entirely
    pub fn with_whitelist<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_blacklist<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_tracing(mut self, tracing: bool) -> Self {
        self.tracing = tracing;
        self
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User agent header value
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Total request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(
        rename = "connect-timeout-secs",
        default = "default_connect_timeout_secs"
    )]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}
