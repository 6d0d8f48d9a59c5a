//! Terminal output cleanup

use once_cell::sync::Lazy;
use regex::Regex;

/// CSI sequences, OSC strings, and two-byte escapes
static ANSI_ESCAPE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]").ok()
});

/// Remove ANSI escape sequences from terminal output
pub fn strip_ansi_codes(text: &str) -> String {
    match ANSI_ESCAPE.as_ref() {
        Some(regex) if text.contains('\x1b') => regex.replace_all(text, "").into_owned(),
        _ => text.to_string(),
    }
}
