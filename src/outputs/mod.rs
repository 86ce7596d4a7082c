//! Output generation.
//!
//! - [`json`]: writes the URL → text mapping as one pretty-printed JSON file

pub mod json;
