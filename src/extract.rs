//! Recovers the diagram JSON object out of free-form model text. Model
//! replies are not guaranteed to be pure JSON (prose, markdown fences), so
//! the span from the first `{` to the last `}` is taken greedily and parsed
//! as a document.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::Error;

static JSON_SPAN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

/// Extract and parse the first top-level JSON object in `raw`.
///
/// Strict JSON is tried first; a JSON5 pass catches the trailing commas and
/// unquoted keys models sometimes emit. Fails with [`Error::Extraction`]
/// when no `{`...`}` span exists and [`Error::Parse`] when the span is not
/// parseable either way.
pub fn extract_diagram(raw: &str) -> Result<Value, Error> {
    let span = JSON_SPAN_RE.find(raw).ok_or(Error::Extraction)?;
    let text = span.as_str();
    debug!("extracted {} byte JSON span from {} byte reply", text.len(), raw.len());

    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(strict_err) => {
            json5::from_str(text).map_err(|_| Error::Parse(strict_err.to_string()))
        }
    }
}
