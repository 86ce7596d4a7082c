//! DOJ Public Safety and Crime press room.
//!
//! The listing is a search page filtered by date and sorted by publication
//! date, e.g.
//! `https://www.justice.gov/psc/press-room?search_api_fulltext=&start_date=2025-07-31&end_date=2025-08-01&sort_by=field_date`.

use crate::models::{DATE_FORMAT, DateRange};

pub const PRESS_ROOM_URL: &str = "https://www.justice.gov/psc/press-room";

/// Build the listing URL for a date range and optional full-text term.
pub fn listing_url(base_url: &str, range: &DateRange, search_term: &str) -> String {
    format!(
        "{}?search_api_fulltext={}&start_date={}&end_date={}&sort_by=field_date",
        base_url.trim_end_matches('/'),
        urlencoding::encode(search_term),
        range.start().format(DATE_FORMAT),
        range.end().format(DATE_FORMAT),
    )
}

/// True for strings that look like absolute web URLs.
pub fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
