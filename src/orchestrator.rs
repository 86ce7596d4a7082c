//! End-to-end control flow for one run.
//!
//! 1. **Listing**: fetch the press-room search page for the date range
//! 2. **Pagination**: extract and normalize page URLs from the listing
//! 3. **Links**: extract article links from each page, one page at a time
//! 4. **Articles**: fetch and distill every unique article, `concurrency` at a time
//!
//! Only a failed listing fetch aborts the run. Pagination, page and article
//! failures are logged and become skips or sentinel values, so the result
//! holds exactly one entry per dispatched article URL.

use crate::config::Config;
use crate::error::{Result, ScrapeError};
use crate::extractors::{ArticleBodyExtractor, LinkExtractor, PaginationExtractor};
use crate::models::{ArticleRecord, RunSummary};
use crate::pagination::{PaginationResult, extract_pagination_with_regex, normalize_pagination};
use crate::scrapers::PageFetcher;
use crate::scrapers::doj::is_http_url;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Articles keyed by URL plus the run's counters.
#[derive(Debug, Default)]
pub struct RunOutcome {
    pub articles: BTreeMap<String, String>,
    pub summary: RunSummary,
}

/// Keep http(s) URLs only, deduplicated and sorted ascending.
pub fn aggregate_links<I>(links: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    links
        .into_iter()
        .filter(|link| is_http_url(link))
        .sorted()
        .dedup()
        .collect()
}

pub struct Orchestrator<'a, F, X> {
    config: &'a Config,
    fetcher: &'a F,
    extractors: &'a X,
}

impl<'a, F, X> Orchestrator<'a, F, X>
where
    F: PageFetcher,
    X: PaginationExtractor + LinkExtractor + ArticleBodyExtractor,
{
    pub fn new(config: &'a Config, fetcher: &'a F, extractors: &'a X) -> Self {
        Self {
            config,
            fetcher,
            extractors,
        }
    }

    #[instrument(level = "info", skip_all, fields(range = %self.config.date_range))]
    pub async fn run(&self) -> Result<RunOutcome> {
        let t0 = Instant::now();
        let listing_url = self.config.listing_url();
        info!(%listing_url, "Fetching listing page");

        let listing = self.fetcher.fetch(&listing_url).await;
        if listing.is_empty() {
            error!(%listing_url, "Listing page fetch failed; aborting");
            return Err(ScrapeError::ListingFetchFailed { url: listing_url });
        }
        info!(bytes = listing.len(), "Listing page fetched");

        let mut summary = RunSummary::default();
        let page_urls = self.resolve_pages(&listing).await;

        let links = if page_urls.len() <= 1 {
            info!(
                page_urls = page_urls.len(),
                "No pagination; extracting links from the listing page"
            );
            summary.pages_visited = 1;
            self.links_from(&listing_url, &listing)
                .await
                .unwrap_or_default()
        } else {
            info!(pages = page_urls.len(), "Pagination found");
            self.links_from_pages(&page_urls, &mut summary).await
        };

        let article_urls = aggregate_links(links);
        info!(count = article_urls.len(), "Unique article URLs");
        debug!(urls = ?article_urls, "Article URLs");

        let articles = self.fetch_articles(&article_urls).await;
        summary.record_articles(&articles);

        info!(
            elapsed_ms = t0.elapsed().as_millis() as u128,
            dispatched = summary.articles_dispatched,
            extracted = summary.articles_extracted,
            "Run finished"
        );
        Ok(RunOutcome { articles, summary })
    }

    /// Pagination extraction never fails the run: errors fall back to the
    /// regex parser when enabled, otherwise to "no pagination".
    async fn resolve_pages(&self, listing: &str) -> Vec<String> {
        let result = match self.extractors.extract_pagination(listing).await {
            Ok(result) => result,
            Err(e) if self.config.regex_fallback => {
                warn!(error = %e, "Pagination extraction failed; using regex fallback");
                PaginationResult::from(extract_pagination_with_regex(listing))
            }
            Err(e) => {
                warn!(error = %e, "Pagination extraction failed; treating as single page");
                PaginationResult::Empty
            }
        };
        let pages = normalize_pagination(&result);
        debug!(pages = ?pages, "Page URLs");
        pages
    }

    async fn links_from(&self, page_url: &str, content: &str) -> Option<Vec<String>> {
        match self.extractors.extract_links(content).await {
            Ok(links) => {
                info!(%page_url, count = links.len(), "Extracted article links");
                Some(links)
            }
            Err(e) => {
                warn!(%page_url, error = %e, "Link extraction failed; skipping page");
                None
            }
        }
    }

    /// Pages are visited sequentially.
    async fn links_from_pages(&self, page_urls: &[String], summary: &mut RunSummary) -> Vec<String> {
        let mut links = Vec::new();
        for (i, page_url) in page_urls.iter().enumerate() {
            if !is_http_url(page_url) {
                warn!(index = i, %page_url, "Not a page URL; skipping");
                summary.pages_skipped += 1;
                continue;
            }

            info!(page = i + 1, total = page_urls.len(), %page_url, "Fetching listing page");
            let content = self.fetcher.fetch(page_url).await;
            if content.is_empty() {
                warn!(%page_url, "Empty page content; skipping");
                summary.pages_skipped += 1;
                continue;
            }

            match self.links_from(page_url, &content).await {
                Some(page_links) => {
                    summary.pages_visited += 1;
                    links.extend(page_links);
                }
                None => summary.pages_skipped += 1,
            }
        }
        links
    }

    /// Results are gathered only once every article future has resolved.
    async fn fetch_articles(&self, urls: &[String]) -> BTreeMap<String, String> {
        let limit = self.config.concurrency.max(1);
        info!(count = urls.len(), concurrency = limit, "Starting article extraction");

        let records: Vec<ArticleRecord> = stream::iter(urls)
            .map(|url| self.fetch_article(url))
            .buffer_unordered(limit)
            .collect()
            .await;

        records
            .into_iter()
            .map(|record| (record.url, record.text))
            .collect()
    }

    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch_article(&self, url: &str) -> ArticleRecord {
        let content = self.fetcher.fetch(url).await;
        let record = if content.is_empty() {
            warn!("Failed to fetch article markdown");
            ArticleRecord::fetch_failed(url)
        } else {
            match self.extractors.extract_body(&content).await {
                Ok(text) if text.trim().is_empty() => {
                    warn!("Extraction produced empty text");
                    ArticleRecord::extraction_empty(url)
                }
                Ok(text) => {
                    info!(bytes = text.len(), "Extracted article text");
                    ArticleRecord::extracted(url, text)
                }
                Err(e) => {
                    error!(error = %e, "Article extraction failed");
                    ArticleRecord::extraction_failed(url)
                }
            }
        };

        if !self.config.request_delay.is_zero() {
            sleep(self.config.request_delay).await;
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateRange, EXTRACTION_EMPTY, EXTRACTION_FAILED, MARKDOWN_FETCH_FAILED};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// In-memory site: unknown URLs fetch as empty content.
    #[derive(Default)]
    struct FakeSite {
        pages: HashMap<String, String>,
        delay: Duration,
        fetched: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeSite {
        fn with(mut self, url: &str, content: &str) -> Self {
            self.pages.insert(url.to_string(), content.to_string());
            self
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    impl PageFetcher for FakeSite {
        async fn fetch(&self, url: &str) -> String {
            self.fetched.lock().unwrap().push(url.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            if self.delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.pages.get(url).cloned().unwrap_or_default()
        }
    }

    /// Extractors driven by markers in the page content:
    /// `link: <url>` lines are links, `LINKS-FAIL` / `BODY-FAIL` raise,
    /// `BODY-EMPTY` yields whitespace.
    struct FakeExtractors {
        pagination: Option<Value>,
    }

    impl PaginationExtractor for FakeExtractors {
        async fn extract_pagination(&self, _content: &str) -> Result<PaginationResult> {
            match &self.pagination {
                Some(v) => Ok(PaginationResult::from_value(v.clone())),
                None => Err(ScrapeError::extraction("model returned prose")),
            }
        }
    }

    impl LinkExtractor for FakeExtractors {
        async fn extract_links(&self, content: &str) -> Result<Vec<String>> {
            if content.contains("LINKS-FAIL") {
                return Err(ScrapeError::extraction("invalid JSON from model"));
            }
            Ok(content
                .lines()
                .filter_map(|l| l.strip_prefix("link: "))
                .map(str::to_string)
                .collect())
        }
    }

    impl ArticleBodyExtractor for FakeExtractors {
        async fn extract_body(&self, content: &str) -> Result<String> {
            if content.contains("BODY-FAIL") {
                return Err(ScrapeError::Llm {
                    message: "connection reset".to_string(),
                });
            }
            if content.contains("BODY-EMPTY") {
                return Ok("  \n".to_string());
            }
            Ok(format!("Body: {content}"))
        }
    }

    fn test_config() -> Config {
        let mut config = Config::new(DateRange::parse("2025-07-31", "2025-08-01").unwrap());
        config.request_delay = Duration::ZERO;
        config
    }

    #[test]
    fn test_aggregate_links_dedupes_and_sorts() {
        let links = vec![
            "https://x/b".to_string(),
            "https://x/a".to_string(),
            "https://x/a".to_string(),
            "not-a-url".to_string(),
        ];
        assert_eq!(aggregate_links(links), vec!["https://x/a", "https://x/b"]);
    }

    #[test]
    fn test_aggregate_links_keeps_http_and_https() {
        let links = vec![
            "https://x/c".to_string(),
            "/relative/path".to_string(),
            "http://x/c".to_string(),
            "".to_string(),
            "mailto:press@usdoj.gov".to_string(),
        ];
        assert_eq!(aggregate_links(links), vec!["http://x/c", "https://x/c"]);
    }

    #[tokio::test]
    async fn test_single_page_with_sentinels() {
        let config = test_config();
        let listing_url = config.listing_url();
        let site = FakeSite::default()
            .with(
                &listing_url,
                "link: https://x/b\nlink: https://x/a\nlink: https://x/a\nlink: not-a-url\nlink: https://x/c\nlink: https://x/d",
            )
            .with("https://x/b", "BODY-FAIL")
            .with("https://x/c", "WASHINGTON - sentenced")
            .with("https://x/d", "BODY-EMPTY");
        let extractors = FakeExtractors {
            pagination: Some(json!({})),
        };

        let outcome = Orchestrator::new(&config, &site, &extractors)
            .run()
            .await
            .unwrap();

        assert_eq!(outcome.articles.len(), 4);
        assert_eq!(outcome.articles["https://x/a"], MARKDOWN_FETCH_FAILED);
        assert_eq!(outcome.articles["https://x/b"], EXTRACTION_FAILED);
        assert_eq!(outcome.articles["https://x/c"], "Body: WASHINGTON - sentenced");
        assert_eq!(outcome.articles["https://x/d"], EXTRACTION_EMPTY);

        assert_eq!(outcome.summary.pages_visited, 1);
        assert_eq!(outcome.summary.articles_dispatched, 4);
        assert_eq!(outcome.summary.articles_extracted, 1);
        assert_eq!(outcome.summary.fetch_failed, 1);
    }

    #[tokio::test]
    async fn test_listing_fetch_failure_is_fatal() {
        let config = test_config();
        let site = FakeSite::default();
        let extractors = FakeExtractors {
            pagination: Some(json!({})),
        };

        let err = Orchestrator::new(&config, &site, &extractors)
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::ListingFetchFailed { .. }));
        assert_eq!(site.fetched().len(), 1);
    }

    #[tokio::test]
    async fn test_paginated_listing_skips_bad_pages() {
        let config = test_config();
        let listing_url = config.listing_url();
        let site = FakeSite::default()
            .with(&listing_url, "listing page 1")
            .with("https://p/0", "link: https://x/1\nlink: https://x/2")
            .with("https://p/2", "LINKS-FAIL")
            .with("https://p/3", "link: https://x/2\nlink: https://x/3")
            .with("https://x/1", "one")
            .with("https://x/2", "two")
            .with("https://x/3", "three");
        let extractors = FakeExtractors {
            pagination: Some(json!({
                "page_links": [
                    {"page_number": 1, "url": "https://p/0"},
                    {"page_number": 2, "url": "https://p/1"},
                    {"page_number": 3, "url": "https://p/2"},
                    {"page_number": 4, "href": "https://p/3"},
                    {"page_number": 5, "url": "page=4"}
                ]
            })),
        };

        let outcome = Orchestrator::new(&config, &site, &extractors)
            .run()
            .await
            .unwrap();

        let keys: Vec<_> = outcome.articles.keys().cloned().collect();
        assert_eq!(keys, vec!["https://x/1", "https://x/2", "https://x/3"]);
        assert_eq!(outcome.articles["https://x/2"], "Body: two");
        assert_eq!(outcome.summary.pages_visited, 2);
        assert_eq!(outcome.summary.pages_skipped, 3);

        let fetched = site.fetched();
        let page_order: Vec<_> = fetched.iter().filter(|u| u.starts_with("https://p/")).collect();
        assert_eq!(page_order, vec!["https://p/0", "https://p/1", "https://p/2", "https://p/3"]);
    }

    #[tokio::test]
    async fn test_single_pagination_entry_uses_listing() {
        let config = test_config();
        let listing_url = config.listing_url();
        let site = FakeSite::default()
            .with(&listing_url, "link: https://x/a")
            .with("https://x/a", "article");
        let extractors = FakeExtractors {
            pagination: Some(json!({"pages": ["https://p/0"]})),
        };

        let outcome = Orchestrator::new(&config, &site, &extractors)
            .run()
            .await
            .unwrap();

        assert_eq!(outcome.articles.len(), 1);
        assert!(!site.fetched().contains(&"https://p/0".to_string()));
    }

    #[tokio::test]
    async fn test_pagination_failure_without_fallback() {
        let config = test_config();
        let listing_url = config.listing_url();
        let site = FakeSite::default()
            .with(&listing_url, "link: https://x/a")
            .with("https://x/a", "article");
        let extractors = FakeExtractors { pagination: None };

        let outcome = Orchestrator::new(&config, &site, &extractors)
            .run()
            .await
            .unwrap();
        assert_eq!(outcome.articles["https://x/a"], "Body: article");
    }

    #[tokio::test]
    async fn test_pagination_failure_with_regex_fallback() {
        let mut config = test_config();
        config.regex_fallback = true;
        let listing_url = config.listing_url();
        let page0 = "https://www.justice.gov/psc/press-room?start_date=2025-07-31&page=0";
        let page1 = "https://www.justice.gov/psc/press-room?start_date=2025-07-31&page=1";
        let listing = format!("* [1]({page0})\n* [2]({page1})\n");
        let site = FakeSite::default()
            .with(&listing_url, &listing)
            .with(page0, "link: https://x/a")
            .with(page1, "link: https://x/b")
            .with("https://x/a", "a")
            .with("https://x/b", "b");
        let extractors = FakeExtractors { pagination: None };

        let outcome = Orchestrator::new(&config, &site, &extractors)
            .run()
            .await
            .unwrap();
        assert_eq!(outcome.articles.len(), 2);
        assert_eq!(outcome.summary.pages_visited, 2);
    }

    #[tokio::test]
    async fn test_listing_link_failure_yields_empty_output() {
        let config = test_config();
        let listing_url = config.listing_url();
        let site = FakeSite::default().with(&listing_url, "LINKS-FAIL");
        let extractors = FakeExtractors {
            pagination: Some(json!({})),
        };

        let outcome = Orchestrator::new(&config, &site, &extractors)
            .run()
            .await
            .unwrap();
        assert!(outcome.articles.is_empty());
    }

    #[tokio::test]
    async fn test_concurrency_bound_and_completeness() {
        let mut config = test_config();
        config.concurrency = 5;
        let listing_url = config.listing_url();

        let urls: Vec<String> = (0..12).map(|i| format!("https://x/{i:02}")).collect();
        let listing = urls.iter().map(|u| format!("link: {u}")).join("\n");
        let mut site = FakeSite::default().with(&listing_url, &listing);
        for (i, url) in urls.iter().enumerate() {
            // Every third article has no content.
            if i % 3 != 0 {
                site = site.with(url, "article");
            }
        }
        site.delay = Duration::from_millis(20);
        let extractors = FakeExtractors {
            pagination: Some(json!([])),
        };

        let outcome = Orchestrator::new(&config, &site, &extractors)
            .run()
            .await
            .unwrap();

        assert_eq!(outcome.articles.len(), 12);
        assert_eq!(outcome.summary.fetch_failed, 4);
        let max = site.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 5, "max in flight was {max}");
        assert!(max > 1, "articles were not fetched concurrently");
    }
}
