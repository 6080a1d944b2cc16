//! CSV input and output.

pub mod export;
pub mod import;

/// Timestamp layout written to every exported file.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
