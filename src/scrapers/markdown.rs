//! HTTP page fetcher that renders HTML to markdown.
//!
//! The extraction prompts work on markdown, so pages are flattened into a
//! readable text form that keeps the structure the model needs:
//!
//! - headings become `#`-prefixed lines
//! - list items become `* ` bullets
//! - links become `[text](absolute-url)`, relative hrefs resolved against the page URL
//! - `script`, `style` and similar non-content elements are dropped

use super::PageFetcher;
use crate::error::Result;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use url::Url;

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("body selector"));

static BLANK_LINES_RE: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(r"\n{3,}").expect("blank lines regex"));

const SKIPPED_TAGS: [&str; 7] = ["script", "style", "noscript", "head", "svg", "template", "iframe"];
const BLOCK_TAGS: [&str; 14] = [
    "p", "div", "section", "article", "header", "footer", "nav", "main", "ul", "ol", "table",
    "tr", "blockquote", "aside",
];

#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn try_fetch(&self, url: &str) -> Result<String> {
        let html = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(html_to_markdown(&html, url))
    }
}

impl PageFetcher for HttpPageFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> String {
        match self.try_fetch(url).await {
            Ok(markdown) if markdown.is_empty() => {
                warn!("Page rendered to empty markdown");
                markdown
            }
            Ok(markdown) => {
                info!(bytes = markdown.len(), "Fetched page");
                markdown
            }
            Err(e) => {
                error!(error = %e, "Page fetch failed");
                String::new()
            }
        }
    }
}

/// Render an HTML document as markdown. `page_url` is the base for
/// resolving relative links; if it does not parse, hrefs are kept verbatim.
pub fn html_to_markdown(html: &str, page_url: &str) -> String {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();
    let mut out = String::new();

    match document.select(&BODY_SELECTOR).next() {
        Some(body) => render_children(body, base.as_ref(), &mut out),
        None => render_children(document.root_element(), base.as_ref(), &mut out),
    }

    let trimmed_lines = out
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_LINES_RE
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}

fn render_children(el: ElementRef<'_>, base: Option<&Url>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            push_text(out, text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            render_element(child_el, base, out);
        }
    }
}

fn render_element(el: ElementRef<'_>, base: Option<&Url>, out: &mut String) {
    let tag = el.value().name();
    match tag {
        t if SKIPPED_TAGS.contains(&t) => {}
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = tag[1..].parse::<usize>().unwrap_or(1);
            let mut inner = String::new();
            render_children(el, base, &mut inner);
            let text = inner.split_whitespace().collect::<Vec<_>>().join(" ");
            if !text.is_empty() {
                out.push_str("\n\n");
                out.push_str(&"#".repeat(level));
                out.push(' ');
                out.push_str(&text);
                out.push_str("\n\n");
            }
        }
        "a" => match el.value().attr("href") {
            Some(href) => {
                let text = inline_text(el);
                let target = resolve(base, href);
                if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                    out.push(' ');
                }
                out.push_str(&format!("[{text}]({target})"));
            }
            None => render_children(el, base, out),
        },
        "li" => {
            out.push_str("\n* ");
            render_children(el, base, out);
            out.push('\n');
        }
        "br" => out.push('\n'),
        t if BLOCK_TAGS.contains(&t) => {
            out.push_str("\n\n");
            render_children(el, base, out);
            out.push_str("\n\n");
        }
        _ => render_children(el, base, out),
    }
}

fn push_text(out: &mut String, text: &str) {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return;
    }
    let at_line_start = out.is_empty() || out.ends_with('\n') || out.ends_with("* ");
    if !at_line_start && (text.starts_with(char::is_whitespace) || out.ends_with(')')) {
        out.push(' ');
    }
    out.push_str(&collapsed);
    if text.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

fn inline_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    base.and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.to_string())
}
