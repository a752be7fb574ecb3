//! Identifier validation.
//!
//! Skill, slot and type names share one grammar: lowercase ASCII letters and
//! digits, starting with a letter, with single hyphens allowed between
//! alphanumerics. Snap names are looser and may start with digits, but must
//! contain at least one letter.

use once_cell::sync::Lazy;
use regex::Regex;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z](?:-?[a-z0-9])*$").expect("name pattern compiles"));

static SNAP_NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z0-9]+-?)*[a-z](?:-?[a-z0-9])*$").expect("snap name pattern compiles")
});

/// Returns true if `name` is a valid skill, slot or type name.
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// Returns true if `name` is a valid snap name.
pub fn is_valid_snap_name(name: &str) -> bool {
    SNAP_NAME_PATTERN.is_match(name)
}

/// Check a skill, slot or type name, returning the reason it is rejected.
pub fn validate_name(name: &str) -> Result<(), String> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(describe(name))
    }
}

/// Check a snap name, returning the reason it is rejected.
pub fn validate_snap_name(name: &str) -> Result<(), String> {
    if is_valid_snap_name(name) {
        Ok(())
    } else {
        Err(describe(name))
    }
}

fn describe(name: &str) -> String {
    if name.is_empty() {
        "name must not be empty".to_string()
    } else if name.contains("--") {
        "name must not contain consecutive hyphens".to_string()
    } else if name.starts_with('-') || name.ends_with('-') {
        "name must not start or end with a hyphen".to_string()
    } else if name
        .chars()
        .any(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'))
    {
        "name may only contain lowercase letters, digits and hyphens".to_string()
    } else {
        "name must contain a letter before any digits".to_string()
    }
}
