//! JSON output for extracted articles.
//!
//! The artifact is a single object mapping article URL to extracted text:
//!
//! ```text
//! {
//!   "https://www.justice.gov/psc/press-room/pr/a": "WASHINGTON - ...",
//!   "https://www.justice.gov/psc/press-room/pr/b": "Extraction failed"
//! }
//! ```
//!
//! Keys are written in sorted order and non-ASCII text is kept as UTF-8.

use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Serialize the URL → text mapping with indentation and write it once.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_articles(articles: &BTreeMap<String, String>, path: &Path) -> Result<()> {
    let mut json = serde_json::to_string_pretty(articles)?;
    json.push('\n');

    info!(count = articles.len(), "Writing JSON");
    fs::write(path, json).await?;
    info!("Wrote article JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_articles() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("extracted_article_text.json");

        let mut articles = BTreeMap::new();
        articles.insert("https://x/b".to_string(), "Extraction failed".to_string());
        articles.insert("https://x/a".to_string(), "Café owner sentenced".to_string());

        write_articles(&articles, &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Café owner sentenced"));
        assert!(written.contains("\n  \"https://x/a\""));
        assert!(written.find("https://x/a").unwrap() < written.find("https://x/b").unwrap());

        let parsed: BTreeMap<String, String> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, articles);
    }
}
