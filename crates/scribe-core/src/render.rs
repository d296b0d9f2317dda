//! Content rendering.
//!
//! Maps a record's structured content to a single markdown-flavoured
//! line: `"{sender} ({local time}): {fragments joined by ", "}"`.
//! Rendering never fails; unrecognized or malformed content degrades to
//! its raw textual form.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde_json::Value;
use tracing::warn;

use crate::content::ContentPart;
use crate::event::ImageUrlResolver;
use crate::record::Record;

/// Rendering timezone, fixed regardless of host configuration.
const RENDER_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Timestamp format, locale-independent.
const TIME_FORMAT: &str = "%Y/%m/%d %H:%M";

/// Renders records to text.
pub struct ContentRenderer {
    resolver: Arc<dyn ImageUrlResolver>,
}

impl ContentRenderer {
    pub fn new(resolver: Arc<dyn ImageUrlResolver>) -> Self {
        Self { resolver }
    }

    /// Render a record's full text line.
    pub async fn render(&self, record: &Record) -> String {
        let mut fragments = Vec::with_capacity(record.content().len());
        for part in record.content() {
            fragments.push(self.render_part(part).await);
        }
        format!(
            "{} ({}): {}",
            record.sender(),
            format_timestamp(record.timestamp()),
            fragments.join(", ")
        )
    }

    async fn render_part(&self, part: &ContentPart) -> String {
        match part {
            ContentPart::Text { text } => text.clone(),
            ContentPart::Image { id } | ContentPart::FlashImage { id } => {
                let url = match self.resolver.resolve(id).await {
                    Ok(url) => url,
                    Err(err) => {
                        warn!(image_id = %id, error = %err, "image URL resolution failed");
                        String::new()
                    }
                };
                format!("![{id}]({url})")
            }
            ContentPart::Card { payload } => render_card(payload),
            ContentPart::Other { raw } => raw.clone(),
        }
    }
}

/// Format epoch seconds in the fixed rendering zone.
pub fn format_timestamp(secs: i64) -> String {
    let zone = FixedOffset::east_opt(RENDER_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(secs, 0)
        .unwrap_or_default()
        .with_timezone(&zone)
        .format(TIME_FORMAT)
        .to_string()
}

/// Render a rich card to `"[{prompt}]({link})"`.
///
/// `link` is the first non-empty string value anywhere in the payload
/// tree whose key contains "url" (case-insensitive); `prompt` is the
/// top-level `prompt` field. Arrays contribute nothing to the traversal.
/// A payload that is not a JSON object falls back to the raw string.
fn render_card(payload: &str) -> String {
    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(_) => return payload.to_string(),
    };
    if !value.is_object() {
        return payload.to_string();
    }

    let link = first_url_field(&value).unwrap_or_default();
    let prompt = value
        .get("prompt")
        .and_then(Value::as_str)
        .unwrap_or(payload);

    format!("[{prompt}]({link})")
}

/// Depth-first search over nested objects for the first non-empty string
/// whose key mentions "url".
fn first_url_field(value: &Value) -> Option<&str> {
    let map = value.as_object()?;
    for (key, child) in map {
        match child {
            Value::String(s) if !s.is_empty() && key.to_ascii_lowercase().contains("url") => {
                return Some(s)
            }
            Value::Object(_) => {
                if let Some(found) = first_url_field(child) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}
