// ABOUTME: Configuration for extraction and fetching: ExtractorConfig, Options, and ClientBuilder.
// ABOUTME: ClientBuilder provides a fluent API for constructing Client instances with custom settings.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::client::Client;

/// Site base prepended to every listing path when building article URLs.
pub const DEFAULT_SITE_BASE: &str = "https://www.anthropic.com";

/// Field used as the search anchor on single-article pages.
pub const DEFAULT_ANCHOR_FIELD: &str = "publishedOn";

/// `_type` discriminators that mark an article document in the CMS export.
pub const DEFAULT_ARTICLE_TYPES: &[&str] = &["engineeringArticle", "post", "article", "newsArticle"];

/// Maximum allowed content length (10 MB).
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// Knobs for the pure extraction passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorConfig {
    pub site_base: String,
    pub article_types: Vec<String>,
    pub anchor_field: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            site_base: DEFAULT_SITE_BASE.to_string(),
            article_types: DEFAULT_ARTICLE_TYPES.iter().map(|s| s.to_string()).collect(),
            anchor_field: DEFAULT_ANCHOR_FIELD.to_string(),
        }
    }
}

/// Output format for a fetched article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentType {
    #[default]
    Markdown,
    Html,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentType::Markdown => "markdown",
            ContentType::Html => "html",
        };
        write!(f, "{}", s)
    }
}

impl From<&str> for ContentType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "html" | "htm" => ContentType::Html,
            _ => ContentType::Markdown,
        }
    }
}

/// Configuration options for the fetch client.
#[derive(Debug, Clone)]
pub struct Options {
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    pub max_content_length: usize,
    pub concurrency: usize,
    pub http_client: Option<reqwest::Client>,
    pub extractor: ExtractorConfig,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            user_agent: "Mozilla/5.0 (compatible; sitegen-fetch-web/0.1)".to_string(),
            headers: HashMap::new(),
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
            concurrency: 4,
            http_client: None,
            extractor: ExtractorConfig::default(),
        }
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
        }
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Cap the response body size.
    pub fn max_content_length(mut self, bytes: usize) -> Self {
        self.opts.max_content_length = bytes;
        self
    }

    /// Number of article pages fetched at once by `fetch_articles`.
    pub fn concurrency(mut self, n: usize) -> Self {
        self.opts.concurrency = n.max(1);
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Override the site base used for stub URLs.
    pub fn site_base(mut self, base: impl Into<String>) -> Self {
        self.opts.extractor.site_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the set of article `_type` discriminators.
    pub fn article_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.opts.extractor.article_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Override the anchor field used on single-article pages.
    pub fn anchor_field(mut self, field: impl Into<String>) -> Self {
        self.opts.extractor.anchor_field = field.into();
        self
    }

    pub fn build(self) -> Client {
        Client::new(self.opts)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_source_layout() {
        let opts = Options::default();
        assert_eq!(opts.timeout, Duration::from_secs(15));
        assert_eq!(opts.extractor.site_base, "https://www.anthropic.com");
        assert_eq!(opts.extractor.anchor_field, "publishedOn");
        assert!(opts.extractor.article_types.iter().any(|t| t == "engineeringArticle"));
    }

    #[test]
    fn builder_overrides_options() {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(3))
            .user_agent("test-agent")
            .site_base("https://example.com/")
            .article_types(["story"])
            .anchor_field("date")
            .concurrency(0)
            .build();
        let opts = client.options();
        assert_eq!(opts.timeout, Duration::from_secs(3));
        assert_eq!(opts.user_agent, "test-agent");
        assert_eq!(opts.extractor.site_base, "https://example.com");
        assert_eq!(opts.extractor.article_types, vec!["story".to_string()]);
        assert_eq!(opts.extractor.anchor_field, "date");
        assert_eq!(opts.concurrency, 1);
    }

    #[test]
    fn content_type_from_str() {
        assert_eq!(ContentType::from("HTML"), ContentType::Html);
        assert_eq!(ContentType::from("md"), ContentType::Markdown);
        assert_eq!(ContentType::from("whatever"), ContentType::Markdown);
        assert_eq!(ContentType::Html.to_string(), "html");
    }
}
