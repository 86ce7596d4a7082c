//! Run configuration.
//!
//! [`Config`] is assembled once in `main` from the parsed [`Cli`] and handed
//! to the orchestrator by reference. The LLM settings stay in `awful_aj`'s own
//! `config.yaml`; [`load_llm_config`] reads it and applies the CLI/env API key.

use crate::cli::Cli;
use crate::error::{Result, ScrapeError};
use crate::models::DateRange;
use crate::scrapers::doj::{self, PRESS_ROOM_URL};
use awful_aj::config::{self as aj_config, AwfulJadeConfig};
use awful_aj::config_dir;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_CONCURRENCY: usize = 5;
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_OUTPUT: &str = "extracted_article_text.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub date_range: DateRange,
    pub listing_base_url: String,
    pub search_term: String,
    /// Upper bound on article fetch/extract operations in flight.
    pub concurrency: usize,
    /// Pause after each article while its slot is still held.
    pub request_delay: Duration,
    pub fetch_timeout: Duration,
    pub output_path: PathBuf,
    pub regex_fallback: bool,
}

impl Config {
    /// Defaults for everything except the date range.
    pub fn new(date_range: DateRange) -> Self {
        Self {
            date_range,
            listing_base_url: PRESS_ROOM_URL.to_string(),
            search_term: String::new(),
            concurrency: DEFAULT_CONCURRENCY,
            request_delay: DEFAULT_REQUEST_DELAY,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            regex_fallback: false,
        }
    }

    /// Validate the CLI's date pair and copy the remaining options.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let date_range = DateRange::new(cli.start_date, cli.end_date)?;
        Ok(Self {
            date_range,
            listing_base_url: cli.listing_url.clone(),
            search_term: cli.search_term.clone(),
            concurrency: cli.concurrency.max(1),
            request_delay: Duration::from_millis(cli.request_delay_ms),
            fetch_timeout: Duration::from_secs(cli.fetch_timeout_secs),
            output_path: cli.output.clone(),
            regex_fallback: cli.regex_fallback,
        })
    }

    pub fn listing_url(&self) -> String {
        doj::listing_url(&self.listing_base_url, &self.date_range, &self.search_term)
    }
}

/// Load `awful_aj`'s config.yaml (from `path` or the default config dir) and
/// apply `api_key` if one was supplied. Fails when no key is available.
pub fn load_llm_config(
    path: Option<&str>,
    api_key: Option<&str>,
) -> std::result::Result<AwfulJadeConfig, Box<dyn Error>> {
    let config_path = match path {
        Some(p) => PathBuf::from(p),
        None => config_dir()?.join("config.yaml"),
    };
    let config_path = config_path
        .to_str()
        .ok_or_else(|| ScrapeError::validation("config path is not valid UTF-8"))?
        .to_string();

    let mut config = aj_config::load_config(&config_path)?;
    info!(config_path, "Loaded LLM configuration");

    if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
        config.api_key = key.trim().to_string();
    }
    if config.api_key.trim().is_empty() {
        return Err(Box::new(ScrapeError::MissingCredential {
            message: "set OPENAI_API_KEY, pass --api-key, or add api_key to config.yaml"
                .to_string(),
        }));
    }
    Ok(config)
}
