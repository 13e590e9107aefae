//! The initialization script shipped with the function.
//!
//! It runs on every Create event, including redeliveries, so every
//! statement must be safe to execute against an already-initialized
//! database.

use std::path::Path;

/// Script compiled into the binary.
pub const BUNDLED_SCRIPT: &str = include_str!("../sql/script.sql");

/// Read the script from `path`, or fall back to the bundled one.
pub fn load(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => Ok(BUNDLED_SCRIPT.to_string()),
    }
}
