//! Transport event types and contracts.
//!
//! The chat transport itself (delivery, identity resolution, mention
//! detection) lives outside this workspace; these types pin down the
//! contract it must satisfy.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::{self, ContentPart};

/// Channel (group/conversation) identifier assigned by the transport.
pub type ChannelId = u64;

/// User identifier assigned by the transport.
pub type UserId = u64;

/// One element of a message's id set. A single logical message may span
/// several transport ids.
pub type MessageId = i64;

/// A reference to an earlier message, embedded in a reply.
///
/// Carries enough of the original (ids, sender, content, time) to
/// synthesize a record when the referenced message has already been
/// evicted from history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub ids: Vec<MessageId>,
    pub sender_id: UserId,
    /// Transport-provided nickname of the quoted sender, when known.
    #[serde(default)]
    pub sender_name: Option<String>,
    pub content: Vec<ContentPart>,
    pub timestamp: i64,
}

/// One inbound channel message delivered by the transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub channel_id: ChannelId,
    pub sender_id: UserId,
    pub sender_name: String,
    pub ids: Vec<MessageId>,
    pub content: Vec<ContentPart>,
    /// Epoch seconds.
    pub timestamp: i64,
    /// Whether the message mentions the bot identity.
    #[serde(default)]
    pub mentions_bot: bool,
    #[serde(default)]
    pub quote: Option<Quote>,
}

impl InboundMessage {
    /// Plain-text view of the message, used for keyword dispatch.
    pub fn text(&self) -> String {
        content::plain_text(&self.content)
    }
}

/// Resolves a transport image id to a fetchable URL.
///
/// This is the one suspending step of rendering; implementations may hit
/// the network.
#[async_trait]
pub trait ImageUrlResolver: Send + Sync {
    async fn resolve(&self, image_id: &str) -> anyhow::Result<String>;
}

/// Outbound reply capability provided by the transport.
#[async_trait]
pub trait ReplyTransport: Send + Sync {
    /// Send `text` as a reply into `channel`.
    async fn reply(&self, channel: ChannelId, text: &str) -> anyhow::Result<()>;
}
