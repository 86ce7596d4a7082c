//! Command-line interface definitions for DOJ Press Digest.
//!
//! Dates are parsed by clap itself, so a malformed `--start-date` or
//! `--end-date` ends the process with a usage error before anything runs.

use crate::models::parse_date;
use crate::scrapers::doj::PRESS_ROOM_URL;
use chrono::NaiveDate;
use clap::Parser;
use clap::builder::RangedU64ValueParser;
use std::path::PathBuf;

pub const DEFAULT_START_DATE: &str = "2025-07-31";
pub const DEFAULT_END_DATE: &str = "2025-08-01";

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Default range, output to ./extracted_article_text.json
/// doj_press_digest
///
/// # Explicit range and output file
/// doj_press_digest --start-date 2025-07-01 --end-date 2025-07-31 -o july.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// First publication date to include (YYYY-MM-DD)
    #[arg(long, default_value = DEFAULT_START_DATE, value_parser = parse_cli_date)]
    pub start_date: NaiveDate,

    /// Last publication date to include (YYYY-MM-DD)
    #[arg(long, default_value = DEFAULT_END_DATE, value_parser = parse_cli_date)]
    pub end_date: NaiveDate,

    /// Output JSON file mapping article URL to extracted text
    #[arg(short, long, default_value = "extracted_article_text.json")]
    pub output: PathBuf,

    /// Optional path to the awful_aj config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// API key for the LLM endpoint (overrides the key in config.yaml)
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Press room listing URL
    #[arg(long, default_value = PRESS_ROOM_URL)]
    pub listing_url: String,

    /// Optional full-text search term for the listing
    #[arg(long, default_value = "")]
    pub search_term: String,

    /// Maximum number of article fetch/extract operations in flight
    #[arg(long, default_value_t = 5, value_parser = RangedU64ValueParser::<usize>::new().range(1..))]
    pub concurrency: usize,

    /// Fixed pause after each article, in milliseconds (0 disables)
    #[arg(long, default_value_t = 3000)]
    pub request_delay_ms: u64,

    /// HTTP timeout for each page fetch, in seconds
    #[arg(long, default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// Fall back to regex pagination parsing when the LLM extraction fails
    #[arg(long)]
    pub regex_fallback: bool,
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["doj_press_digest"]);

        assert_eq!(cli.start_date, NaiveDate::from_ymd_opt(2025, 7, 31).unwrap());
        assert_eq!(cli.end_date, NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
        assert_eq!(cli.output, PathBuf::from("extracted_article_text.json"));
        assert_eq!(cli.concurrency, 5);
        assert_eq!(cli.request_delay_ms, 3000);
        assert!(!cli.regex_fallback);
    }

    #[test]
    fn test_cli_dates() {
        let cli = Cli::parse_from([
            "doj_press_digest",
            "--start-date",
            "2025-06-01",
            "--end-date",
            "2025-06-30",
            "-o",
            "/tmp/june.json",
        ]);

        assert_eq!(cli.start_date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(cli.end_date, NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
        assert_eq!(cli.output, PathBuf::from("/tmp/june.json"));
    }

    #[test]
    fn test_cli_rejects_bad_date() {
        let err = Cli::try_parse_from(["doj_press_digest", "--start-date", "07/31/2025"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_rejects_zero_concurrency() {
        assert!(Cli::try_parse_from(["doj_press_digest", "--concurrency", "0"]).is_err());
    }
}
