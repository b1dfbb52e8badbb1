// ABOUTME: Article-level data produced by extraction: listing stubs and single-article metadata.
// ABOUTME: Includes lenient date parsing for the CMS' loosely formatted publication dates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Minimal listing-page representation of an article, prior to fetching its body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleStub {
    pub title: String,
    pub slug: String,
    pub published_on: String,
    pub summary: String,
    pub url: String,
}

impl ArticleStub {
    /// Parses `published_on` into a UTC timestamp, if it looks like a date.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        parse_published(&self.published_on)
    }
}

/// Metadata for a single article page. Fields are empty when not found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub title: String,
    pub summary: String,
    pub published_on: String,
}

impl ArticleMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.summary.is_empty() && self.published_on.is_empty()
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        parse_published(&self.published_on)
    }
}

/// Parses a publication date, trying RFC 3339, a bare `YYYY-MM-DD`, then dateparser.
///
/// Date-only values are taken as midnight UTC so the day never shifts.
pub fn parse_published(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let naive_dt = date.and_hms_opt(0, 0, 0)?;
        return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive_dt, Utc));
    }

    dateparser::parse(s).ok().map(|dt| dt.with_timezone(&Utc))
}
