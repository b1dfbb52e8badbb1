// ABOUTME: The Client ties HTTP retrieval to the payload extractors for listing and article pages.
// ABOUTME: Provides async fetch_* methods plus synchronous parse_* methods for already-fetched HTML.

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::article::extract_single_article_metadata_with;
use crate::blocks::{extract_body_blocks, render_blocks_to_html, render_blocks_to_markdown};
use crate::error::FetchError;
use crate::formats::{
    extract_description, extract_excerpt, extract_main_html, extract_title, html_to_markdown,
    sanitize_html,
};
use crate::listing::find_article_stubs_with_base;
use crate::models::ArticleStub;
use crate::options::{ClientBuilder, Options};
use crate::payload::{combine_payloads, extract_payloads};
use crate::resource::{fetch, FetchOptions};
use crate::result::{ArticleSource, FetchedArticle};

/// Fetches listing and article pages and runs extraction over them.
///
/// Cloning is cheap: clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    opts: Options,
    http_client: reqwest::Client,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(opts: Options) -> Self {
        let http_client = opts.http_client.clone().unwrap_or_else(|| {
            reqwest::Client::builder()
                .user_agent(&opts.user_agent)
                .timeout(opts.timeout)
                .cookie_store(true)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .unwrap_or_else(|e| {
                    warn!(error = %e, "falling back to a default HTTP client");
                    reqwest::Client::new()
                })
        });

        Self { opts, http_client }
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    async fn get_html(&self, url: &str) -> Result<String, FetchError> {
        let fetch_opts = FetchOptions {
            headers: self.opts.headers.clone(),
            max_content_length: self.opts.max_content_length,
        };
        let result = fetch(&self.http_client, url, &fetch_opts).await?;
        Ok(result.text())
    }

    /// Fetches a listing page and returns the article stubs found in it.
    pub async fn fetch_listing(&self, feed_url: &str) -> Result<Vec<ArticleStub>, FetchError> {
        let html = self.get_html(feed_url).await?;
        Ok(self.parse_listing_html(&html, feed_url))
    }

    /// Fetches one article page and extracts its metadata and body.
    pub async fn fetch_article(&self, url: &str) -> Result<FetchedArticle, FetchError> {
        let html = self.get_html(url).await?;
        Ok(self.parse_article_html(&html, url))
    }

    /// Fetches every stub's article, at most `concurrency` at a time.
    ///
    /// Results keep the order of `stubs`. Fields the article page lacks are
    /// filled from its stub.
    pub async fn fetch_articles(
        &self,
        stubs: &[ArticleStub],
    ) -> Vec<Result<FetchedArticle, FetchError>> {
        let mut results: Vec<(usize, Result<FetchedArticle, FetchError>)> =
            stream::iter(stubs.iter().enumerate())
                .map(|(index, stub)| async move {
                    let result = self
                        .fetch_article(&stub.url)
                        .await
                        .map(|article| merge_stub(article, stub));
                    if let Err(ref e) = result {
                        warn!(url = %stub.url, error = %e, "article fetch failed");
                    }
                    (index, result)
                })
                .buffer_unordered(self.opts.concurrency.max(1))
                .collect()
                .await;

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }

    /// Extracts article stubs from an already-fetched listing page.
    pub fn parse_listing_html(&self, html: &str, feed_url: &str) -> Vec<ArticleStub> {
        let payloads = extract_payloads(html, true);
        let stubs = find_article_stubs_with_base(&payloads, feed_url, &self.opts.extractor.site_base);
        info!(
            feed_url,
            payloads = payloads.len(),
            stubs = stubs.len(),
            "listing parsed"
        );
        stubs
    }

    /// Extracts one article from an already-fetched article page.
    ///
    /// The CMS body blocks are rendered when present; otherwise the visible
    /// page content is sanitized and converted instead.
    pub fn parse_article_html(&self, html: &str, url: &str) -> FetchedArticle {
        let text = combine_payloads(&extract_payloads(html, false));
        let meta = extract_single_article_metadata_with(&text, &self.opts.extractor);
        let blocks = extract_body_blocks(&text);

        let (body_html, markdown, source) = if blocks.is_empty() {
            debug!(url, "no body blocks, using page content");
            let cleaned = extract_main_html(html)
                .map(|main| sanitize_html(&main))
                .unwrap_or_default();
            let markdown = html_to_markdown(&cleaned);
            (cleaned, markdown, ArticleSource::Fallback)
        } else {
            (
                render_blocks_to_html(&blocks),
                render_blocks_to_markdown(&blocks),
                ArticleSource::Structured,
            )
        };

        let title = Some(meta.title)
            .filter(|t| !t.is_empty())
            .or_else(|| extract_title(html))
            .unwrap_or_default();
        let summary = Some(meta.summary)
            .filter(|s| !s.is_empty())
            .or_else(|| extract_description(html))
            .or_else(|| extract_excerpt(&body_html))
            .unwrap_or_default();

        info!(url, blocks = blocks.len(), ?source, "article parsed");
        FetchedArticle {
            url: url.to_string(),
            title,
            summary,
            published_on: meta.published_on,
            markdown,
            html: body_html,
            source,
        }
    }
}

fn merge_stub(mut article: FetchedArticle, stub: &ArticleStub) -> FetchedArticle {
    if article.title.is_empty() {
        article.title = stub.title.clone();
    }
    if article.summary.is_empty() {
        article.summary = stub.summary.clone();
    }
    if article.published_on.is_empty() {
        article.published_on = stub.published_on.clone();
    }
    article
}
