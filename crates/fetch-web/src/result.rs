// ABOUTME: FetchedArticle holds one extracted article with both renderings of its body.
// ABOUTME: Includes the Markdown document formatter used by the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::parse_published;

/// Where an article's body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArticleSource {
    /// CMS body blocks recovered from RSC payloads.
    #[default]
    Structured,
    /// Visible page HTML, used when no body blocks were found.
    Fallback,
}

/// A fully extracted article page.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FetchedArticle {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub published_on: String,
    pub markdown: String,
    pub html: String,
    pub source: ArticleSource,
}

impl FetchedArticle {
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        parse_published(&self.published_on)
    }

    /// True when neither a title nor any body text was found.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.markdown.trim().is_empty()
    }

    /// Format the article as a standalone Markdown document.
    pub fn format_markdown(&self) -> String {
        let mut parts = Vec::new();

        if !self.title.is_empty() {
            parts.push(format!("# {}", self.title));
        }
        if let Some(date) = self.published_at() {
            parts.push(date.format("%Y-%m-%d").to_string());
        } else if !self.published_on.is_empty() {
            parts.push(self.published_on.clone());
        }
        if !self.url.is_empty() {
            parts.push(format!("Source: {}", self.url));
        }
        if !self.summary.is_empty() {
            parts.push(format!("> {}", self.summary));
        }

        if !parts.is_empty() && !self.markdown.is_empty() {
            parts.push("---".to_string());
        }
        if !self.markdown.is_empty() {
            parts.push(self.markdown.clone());
        }

        parts.join("\n\n")
    }
}
