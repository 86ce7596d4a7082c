//! Data models shared across the pipeline.
//!
//! - [`DateRange`]: validated, immutable start/end pair for the listing query
//! - [`ArticleRecord`]: one article's URL and its extracted text (or sentinel)
//! - [`PaginationInfo`]: the structured pagination shape produced by the
//!   regex fallback (mirrors the JSON schema the LLM template asks for)
//! - [`RunSummary`]: per-run counters logged when the pipeline finishes

use crate::error::{Result, ScrapeError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Calendar format accepted for `--start-date` / `--end-date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Recorded when the page fetcher returns no content for an article.
pub const MARKDOWN_FETCH_FAILED: &str = "Markdown fetch failed";
/// Recorded when the body extractor returns an error.
pub const EXTRACTION_FAILED: &str = "Extraction failed";
/// Recorded when the body extractor succeeds but returns only whitespace.
pub const EXTRACTION_EMPTY: &str = "Extraction produced empty text";

/// An inclusive date range used to query the press-room listing.
///
/// Fields are private so a `DateRange` can only exist with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(ScrapeError::validation(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse both ends with [`DATE_FORMAT`] and validate ordering.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Parse a single `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|e| {
        ScrapeError::validation(format!(
            "'{s}' is not a valid date, expected YYYY-MM-DD ({e})"
        ))
    })
}

/// The outcome for one dispatched article URL.
///
/// `text` is either the distilled narrative body or one of the sentinel
/// strings ([`MARKDOWN_FETCH_FAILED`], [`EXTRACTION_FAILED`],
/// [`EXTRACTION_EMPTY`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub url: String,
    pub text: String,
}

impl ArticleRecord {
    pub fn extracted(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            text: text.into(),
        }
    }

    pub fn fetch_failed(url: impl Into<String>) -> Self {
        Self::extracted(url, MARKDOWN_FETCH_FAILED)
    }

    pub fn extraction_failed(url: impl Into<String>) -> Self {
        Self::extracted(url, EXTRACTION_FAILED)
    }

    pub fn extraction_empty(url: impl Into<String>) -> Self {
        Self::extracted(url, EXTRACTION_EMPTY)
    }
}

/// One numbered pagination link.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PageLink {
    pub page_number: u32,
    pub url: String,
    pub is_current: bool,
}

/// Named navigation links ("Next", "Last", ...) found alongside the numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NavigationLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,
}

/// Structured pagination for a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaginationInfo {
    pub total_pages: u32,
    pub current_page: u32,
    pub page_links: Vec<PageLink>,
    pub navigation_links: NavigationLinks,
    pub has_pagination: bool,
    pub extraction_method: String,
}

/// Counters for one run, logged at completion.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_visited: usize,
    pub pages_skipped: usize,
    pub articles_dispatched: usize,
    pub articles_extracted: usize,
    pub fetch_failed: usize,
    pub extraction_failed: usize,
    pub extraction_empty: usize,
}

impl RunSummary {
    /// Tally article outcomes from the final URL → text mapping.
    pub fn record_articles(&mut self, articles: &BTreeMap<String, String>) {
        self.articles_dispatched = articles.len();
        for text in articles.values() {
            match text.as_str() {
                MARKDOWN_FETCH_FAILED => self.fetch_failed += 1,
                EXTRACTION_FAILED => self.extraction_failed += 1,
                EXTRACTION_EMPTY => self.extraction_empty += 1,
                _ => self.articles_extracted += 1,
            }
        }
    }
}
