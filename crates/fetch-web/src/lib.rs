// ABOUTME: Library entry point for extracting articles from Next.js RSC payloads embedded in HTML.
// ABOUTME: Re-exports the pure extractors, block renderers, and the async fetch Client.

//! sitegen-fetch-web - pull article listings and bodies out of server-rendered pages.
//!
//! Listing and article pages ship their CMS data as string chunks pushed
//! through `self.__next_f.push(...)`. This crate decodes those chunks,
//! recovers article stubs and single-article metadata from the partially
//! valid JSON inside them, and renders rich-text bodies to HTML and Markdown.
//!
//! The extractors are synchronous and never fail; [`Client`] adds HTTP
//! retrieval on top.
//!
//! # Example
//!
//! ```no_run
//! use sitegen_fetch_web::{Client, FetchError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), FetchError> {
//!     let client = Client::builder().build();
//!     let stubs = client.fetch_listing("https://www.anthropic.com/engineering").await?;
//!     for result in client.fetch_articles(&stubs).await {
//!         println!("{}", result?.format_markdown());
//!     }
//!     Ok(())
//! }
//! ```

pub mod article;
pub mod blocks;
pub mod client;
pub mod error;
pub mod formats;
pub mod listing;
pub mod models;
pub mod options;
pub mod payload;
pub mod resource;
pub mod result;
pub mod scan;

pub use crate::article::{extract_single_article_metadata, extract_single_article_metadata_with};
pub use crate::blocks::{
    extract_body_blocks, render_blocks_to_html, render_blocks_to_markdown, ContentBlock,
};
pub use crate::client::Client;
pub use crate::error::{ErrorCode, FetchError};
pub use crate::listing::{find_article_stubs, find_article_stubs_with_base};
pub use crate::models::{ArticleMetadata, ArticleStub};
pub use crate::options::{ClientBuilder, ContentType, ExtractorConfig, Options};
pub use crate::payload::extract_payloads;
pub use crate::result::{ArticleSource, FetchedArticle};
