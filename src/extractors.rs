//! LLM-backed extraction steps.
//!
//! Three collaborator traits sit at the orchestrator's seams:
//!
//! | Trait | Input | Output |
//! |-------|-------|--------|
//! | [`PaginationExtractor`] | listing markdown | [`PaginationResult`] |
//! | [`LinkExtractor`] | listing page markdown | candidate article URLs |
//! | [`ArticleBodyExtractor`] | article markdown | narrative body text |
//!
//! [`LlmExtractors`] implements all three on top of `awful_aj`, one chat
//! template per step. Model replies are parsed here so the orchestrator only
//! ever sees typed results or a [`ScrapeError`].

use crate::api::{AskAsync, AskFnWrapper};
use crate::error::{Result, ScrapeError};
use crate::pagination::PaginationResult;
use crate::utils::truncate_for_log;
use awful_aj::{config::AwfulJadeConfig, template, template::ChatTemplate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::error::Error;
use tracing::{debug, info, instrument, warn};

pub const PAGINATION_TEMPLATE: &str = "doj_pagination";
pub const LINKS_TEMPLATE: &str = "doj_article_links";
pub const BODY_TEMPLATE: &str = "doj_article_body";

pub trait PaginationExtractor {
    async fn extract_pagination(&self, content: &str) -> Result<PaginationResult>;
}

pub trait LinkExtractor {
    async fn extract_links(&self, content: &str) -> Result<Vec<String>>;
}

pub trait ArticleBodyExtractor {
    /// An empty string is a valid, if suspicious, result.
    async fn extract_body(&self, content: &str) -> Result<String>;
}

static JSON_ARRAY_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```json\s*(\[[\s\S]*?\])\s*```").expect("json fence regex"));

/// Parse a link-extraction reply: a JSON array, optionally inside a
/// ```` ```json ```` fence. Non-string elements are dropped.
pub fn parse_link_response(raw: &str) -> Result<Vec<String>> {
    let raw = raw.trim();
    let text = JSON_ARRAY_FENCE_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map_or(raw, |m| m.as_str());

    let value: Value = serde_json::from_str(text).map_err(|e| {
        ScrapeError::extraction(format!("invalid JSON from model: {e}"))
    })?;

    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect()),
        _ => Err(ScrapeError::extraction("model did not return a JSON array")),
    }
}

/// Parse a pagination reply into a [`PaginationResult`].
///
/// Code fences are stripped wherever they appear. A top-level object with an
/// `error` key is treated as a failed extraction.
pub fn parse_pagination_response(raw: &str) -> Result<PaginationResult> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let value: Value = serde_json::from_str(cleaned.trim()).map_err(|e| {
        ScrapeError::extraction(format!("failed to parse pagination JSON: {e}"))
    })?;

    if let Some(err) = value.get("error") {
        return Err(ScrapeError::extraction(format!(
            "model reported pagination error: {err}"
        )));
    }
    Ok(PaginationResult::from_value(value))
}

/// A body reply is plain text; only surrounding whitespace is removed.
pub fn clean_body_response(raw: &str) -> String {
    raw.trim().to_string()
}

/// The production extractor set: one `awful_aj` config shared by three
/// chat templates.
#[derive(Debug)]
pub struct LlmExtractors {
    config: AwfulJadeConfig,
    pagination: ChatTemplate,
    links: ChatTemplate,
    body: ChatTemplate,
}

impl LlmExtractors {
    pub fn new(
        config: AwfulJadeConfig,
        pagination: ChatTemplate,
        links: ChatTemplate,
        body: ChatTemplate,
    ) -> Self {
        Self {
            config,
            pagination,
            links,
            body,
        }
    }

    /// Load the three extraction templates from the `awful_aj` config dir.
    #[instrument(level = "info", skip_all)]
    pub async fn load(config: AwfulJadeConfig) -> std::result::Result<Self, Box<dyn Error>> {
        let pagination = template::load_template(PAGINATION_TEMPLATE).await?;
        let links = template::load_template(LINKS_TEMPLATE).await?;
        let body = template::load_template(BODY_TEMPLATE).await?;
        info!(
            pagination = PAGINATION_TEMPLATE,
            links = LINKS_TEMPLATE,
            body = BODY_TEMPLATE,
            "Loaded extraction templates"
        );
        Ok(Self::new(config, pagination, links, body))
    }

    fn asker<'a>(&'a self, template: &'a ChatTemplate) -> AskFnWrapper<'a> {
        AskFnWrapper {
            config: &self.config,
            template,
        }
    }
}

fn user_message(content: &str) -> String {
    format!("Markdown content:\n\n{content}")
}

impl PaginationExtractor for LlmExtractors {
    #[instrument(level = "info", skip_all, fields(bytes = content.len()))]
    async fn extract_pagination(&self, content: &str) -> Result<PaginationResult> {
        let reply = self.asker(&self.pagination).ask(&user_message(content)).await?;
        debug!(reply = %truncate_for_log(&reply, 300), "Pagination reply");
        parse_pagination_response(&reply).inspect_err(|e| {
            warn!(error = %e, reply = %truncate_for_log(&reply, 300), "Unusable pagination reply");
        })
    }
}

impl LinkExtractor for LlmExtractors {
    #[instrument(level = "info", skip_all, fields(bytes = content.len()))]
    async fn extract_links(&self, content: &str) -> Result<Vec<String>> {
        let reply = self.asker(&self.links).ask(&user_message(content)).await?;
        let links = parse_link_response(&reply).inspect_err(|e| {
            warn!(error = %e, reply = %truncate_for_log(&reply, 300), "Unusable link reply");
        })?;
        debug!(count = links.len(), "Model returned article links");
        Ok(links)
    }
}

impl ArticleBodyExtractor for LlmExtractors {
    #[instrument(level = "info", skip_all, fields(bytes = content.len()))]
    async fn extract_body(&self, content: &str) -> Result<String> {
        let reply = self.asker(&self.body).ask(&user_message(content)).await?;
        Ok(clean_body_response(&reply))
    }
}
