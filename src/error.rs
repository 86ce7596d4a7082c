//! Error taxonomy for the press-release pipeline.
//!
//! Only a handful of these ever terminate a run: a missing credential, an
//! invalid date range, an unwritable output location and a failed listing
//! fetch. Everything raised inside the per-page and per-article loops is
//! caught by the orchestrator and turned into a skip or a sentinel value.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Missing credential: {message}")]
    MissingCredential { message: String },

    #[error("Failed to fetch listing page {url}")]
    ListingFetchFailed { url: String },

    #[error("Extraction error: {message}")]
    Extraction { message: String },

    #[error("LLM request failed: {message}")]
    Llm { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ScrapeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
