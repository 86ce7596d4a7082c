//! Pagination normalization.
//!
//! The pagination extractor is an LLM, so its output has no fixed shape: it may
//! be an object wrapping a list under `pages`/`page_links`/`links`, a bare
//! object whose values are URLs, or a plain list of strings or link objects.
//! [`PaginationResult::from_value`] classifies that JSON into a closed set of
//! shapes once, at the collaborator boundary, and [`normalize_pagination`]
//! reduces every shape to an ordered list of page URLs without ever failing.
//!
//! # Priority order
//!
//! Wrapper keys are tried as `pages`, then `page_links`, then `links`. Within a
//! link object the URL is read from `url`, then `href`, then `link`. Both
//! orders are observable and must not be reshuffled.
//!
//! JSON has no set type, so every shape here is already ordered. Anything
//! converted from an unordered collection upstream would carry that
//! collection's iteration order into the page list.

use crate::models::{NavigationLinks, PageLink, PaginationInfo};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Wrapper keys, highest priority first.
pub const WRAPPER_KEYS: [&str; 3] = ["pages", "page_links", "links"];
/// URL-bearing fields on link objects, highest priority first.
pub const URL_KEYS: [&str; 3] = ["url", "href", "link"];

/// One element of a pagination sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum PageRef {
    Url(String),
    Object(Map<String, Value>),
    Other(Value),
}

impl From<Value> for PageRef {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => PageRef::Url(s),
            Value::Object(map) => PageRef::Object(map),
            other => PageRef::Other(other),
        }
    }
}

/// The recognized shapes of a pagination extraction result.
#[derive(Debug, Clone, PartialEq)]
pub enum PaginationResult {
    /// Null, `false`, `0`, `""`, `{}` or `[]`.
    Empty,
    /// An object holding the page list under one of [`WRAPPER_KEYS`].
    Wrapped {
        key: &'static str,
        items: Vec<PageRef>,
    },
    /// An object without wrapper keys; its values form the page list.
    Values(Vec<PageRef>),
    /// A bare JSON array.
    Sequence(Vec<PageRef>),
    /// A non-empty scalar.
    Unrecognized,
}

impl PaginationResult {
    /// Classify raw extractor JSON.
    pub fn from_value(value: Value) -> Self {
        if is_falsy(&value) {
            return PaginationResult::Empty;
        }
        match value {
            Value::Object(mut map) => {
                for key in WRAPPER_KEYS {
                    if matches!(map.get(key), Some(Value::Array(_))) {
                        if let Some(Value::Array(items)) = map.remove(key) {
                            return PaginationResult::Wrapped {
                                key,
                                items: items.into_iter().map(PageRef::from).collect(),
                            };
                        }
                    }
                }

                let mut values: Vec<Value> = map.into_iter().map(|(_, v)| v).collect();
                if values.len() == 1 && values[0].is_array() {
                    if let Some(Value::Array(items)) = values.pop() {
                        return PaginationResult::Values(
                            items.into_iter().map(PageRef::from).collect(),
                        );
                    }
                }
                PaginationResult::Values(values.into_iter().map(PageRef::from).collect())
            }
            Value::Array(items) => {
                PaginationResult::Sequence(items.into_iter().map(PageRef::from).collect())
            }
            _ => PaginationResult::Unrecognized,
        }
    }

    fn items(&self) -> &[PageRef] {
        match self {
            PaginationResult::Wrapped { items, .. }
            | PaginationResult::Values(items)
            | PaginationResult::Sequence(items) => items,
            PaginationResult::Empty | PaginationResult::Unrecognized => &[],
        }
    }
}

impl From<PaginationInfo> for PaginationResult {
    fn from(info: PaginationInfo) -> Self {
        if info.page_links.is_empty() {
            return PaginationResult::Empty;
        }
        PaginationResult::Wrapped {
            key: "page_links",
            items: info
                .page_links
                .into_iter()
                .map(|link| PageRef::Url(link.url))
                .collect(),
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(m) => m.is_empty(),
    }
}

/// First string field among [`URL_KEYS`].
fn url_field(map: &Map<String, Value>) -> Option<&str> {
    URL_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
}

/// Reduce any pagination shape to an ordered list of page URLs.
///
/// The first element decides how the list is read: link objects yield their
/// URL field (elements without one are skipped), strings are taken as-is, and
/// any other leading element yields an empty list.
pub fn normalize_pagination(result: &PaginationResult) -> Vec<String> {
    let items = result.items();
    let urls: Vec<String> = match items.first() {
        Some(PageRef::Object(_)) => items
            .iter()
            .filter_map(|item| match item {
                PageRef::Object(map) => url_field(map).map(str::to_string),
                _ => None,
            })
            .collect(),
        Some(PageRef::Url(_)) => items
            .iter()
            .filter_map(|item| match item {
                PageRef::Url(s) => Some(s.clone()),
                _ => None,
            })
            .collect(),
        Some(PageRef::Other(_)) | None => Vec::new(),
    };
    debug!(count = urls.len(), "Normalized pagination");
    urls
}

/// Convenience wrapper: classify then normalize.
pub fn normalize_value(value: Value) -> Vec<String> {
    normalize_pagination(&PaginationResult::from_value(value))
}

static PAGE_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\* \[(\d+)\]\((https://www\.justice\.gov/psc/press-room[^)]+page=(\d+))\)")
        .expect("page link regex")
});

static NAV_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\* \[\s*(Next|Last|Previous|First)\s*\]\((https://www\.justice\.gov/psc/press-room[^)]+)\)",
    )
    .expect("navigation link regex")
});

/// Deterministic pagination extraction from listing markdown.
///
/// Matches numbered bullets such as `* [2](https://www.justice.gov/psc/press-room?...&page=1)`
/// and named navigation bullets (`Next`, `Last`, `Previous`, `First`). The
/// current page cannot be told apart in the markdown, so it is reported as 1.
pub fn extract_pagination_with_regex(markdown: &str) -> PaginationInfo {
    let page_links: Vec<PageLink> = PAGE_LINK_RE
        .captures_iter(markdown)
        .filter_map(|caps| {
            let page_number = caps.get(1)?.as_str().parse().ok()?;
            Some(PageLink {
                page_number,
                url: caps.get(2)?.as_str().to_string(),
                is_current: false,
            })
        })
        .collect();

    let mut navigation_links = NavigationLinks::default();
    for caps in NAV_LINK_RE.captures_iter(markdown) {
        let url = caps[2].to_string();
        match caps[1].to_lowercase().as_str() {
            "next" => navigation_links.next = Some(url),
            "last" => navigation_links.last = Some(url),
            "previous" => navigation_links.previous = Some(url),
            "first" => navigation_links.first = Some(url),
            _ => {}
        }
    }

    let total_pages = if page_links.is_empty() {
        1
    } else {
        page_links.len() as u32
    };
    let has_pagination = page_links.len() > 1;
    info!(total_pages, has_pagination, "Regex pagination fallback finished");

    PaginationInfo {
        total_pages,
        current_page: 1,
        page_links,
        navigation_links,
        has_pagination,
        extraction_method: "regex_fallback".to_string(),
    }
}
