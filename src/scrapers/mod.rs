//! Page fetching for the DOJ press room.
//!
//! - [`PageFetcher`]: the collaborator trait the orchestrator depends on
//! - [`markdown`]: an HTTP implementation that renders pages to markdown
//! - [`doj`]: listing URL construction for the press room search
//!
//! Fetchers never fail loudly: an empty string means the page could not be
//! retrieved, and the reason has already been logged.

pub mod doj;
pub mod markdown;

/// Retrieve a page and return its rendered text content.
pub trait PageFetcher {
    /// Returns an empty string on any failure.
    async fn fetch(&self, url: &str) -> String;
}
