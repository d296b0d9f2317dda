//! Typed message content parts.

use serde::{Deserialize, Serialize};

/// One part of a message's structured content.
///
/// Transports decompose each message into an ordered sequence of parts;
/// the renderer handles every variant exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text
    Text { text: String },
    /// Image reference, resolved to a URL at render time
    Image { id: String },
    /// View-once image; renders the same way as a plain image
    FlashImage { id: String },
    /// Rich card carrying a raw JSON payload
    Card { payload: String },
    /// Anything the transport does not classify further
    Other { raw: String },
}

impl ContentPart {
    /// Create a text part.
    pub fn text(s: impl Into<String>) -> Self {
        ContentPart::Text { text: s.into() }
    }

    /// Create an image part.
    pub fn image(id: impl Into<String>) -> Self {
        ContentPart::Image { id: id.into() }
    }

    /// Create a rich-card part from its raw payload.
    pub fn card(payload: impl Into<String>) -> Self {
        ContentPart::Card {
            payload: payload.into(),
        }
    }
}

/// Concatenate the plain-text parts of a message.
///
/// This is the view used for keyword dispatch; non-text parts contribute
/// nothing.
pub fn plain_text(parts: &[ContentPart]) -> String {
    parts
        .iter()
        .filter_map(|p| match p {
            ContentPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}
