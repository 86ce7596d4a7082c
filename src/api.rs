//! LLM API interaction.
//!
//! - [`AskAsync`]: core trait for sending text to a model and getting text back
//! - [`AskFnWrapper`]: adapts `awful_aj::api::ask` with a given chat template
//!
//! Requests are made exactly once. A failed call surfaces as
//! [`ScrapeError::Llm`] and the orchestrator decides whether that is a skip
//! or a sentinel.

use crate::error::{Result, ScrapeError};
use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Trait for async LLM interaction.
pub trait AskAsync {
    /// Send text to the LLM and receive its reply.
    async fn ask(&self, text: &str) -> Result<String>;
}

/// Wrapper around `awful_aj::api::ask` that implements [`AskAsync`].
///
/// The template decides what the model is asked to do (pagination, link or
/// body extraction); the config carries endpoint, model and API key.
#[derive(Debug)]
pub struct AskFnWrapper<'a> {
    pub config: &'a AwfulJadeConfig,
    pub template: &'a ChatTemplate,
}

impl<'a> AskAsync for AskFnWrapper<'a> {
    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<String> {
        let t0 = Instant::now();
        let res = ask(self.config, text.to_string(), self.template, None, None).await;
        let dt = t0.elapsed();

        match res {
            Ok(reply) => {
                debug!(
                    elapsed_ms = dt.as_millis() as u128,
                    bytes = reply.len(),
                    "API call succeeded"
                );
                Ok(reply)
            }
            Err(e) => {
                warn!(elapsed_ms = dt.as_millis() as u128, error = %e, "API call failed");
                Err(ScrapeError::Llm {
                    message: e.to_string(),
                })
            }
        }
    }
}
