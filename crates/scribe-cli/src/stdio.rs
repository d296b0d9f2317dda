//! Newline-delimited JSON transport over stdin/stdout.
//!
//! The reference transport for local operation: one `InboundMessage` JSON
//! object per input line, one reply JSON object per output line.
//! Malformed lines are logged and skipped.

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use scribe_core::{ChannelId, ImageUrlResolver, InboundMessage, ReplyTransport};

/// Reads events from stdin until EOF, feeding the pipeline queue.
pub async fn read_events(tx: mpsc::Sender<InboundMessage>) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<InboundMessage>(&line) {
            Ok(event) => {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            Err(err) => warn!("skipping malformed event line: {}", err),
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct OutboundReply<'a> {
    channel_id: ChannelId,
    text: &'a str,
}

/// Writes replies as JSON lines on stdout.
pub struct StdoutReplies;

impl StdoutReplies {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StdoutReplies {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyTransport for StdoutReplies {
    async fn reply(&self, channel: ChannelId, text: &str) -> anyhow::Result<()> {
        let line = serde_json::to_string(&OutboundReply {
            channel_id: channel,
            text,
        })?;
        println!("{line}");
        Ok(())
    }
}

/// Resolver for transports that already deliver URLs as image ids.
///
/// An id that looks like a URL passes through; anything else fails and
/// renders with an empty link target.
pub struct PassthroughResolver;

#[async_trait]
impl ImageUrlResolver for PassthroughResolver {
    async fn resolve(&self, image_id: &str) -> anyhow::Result<String> {
        if image_id.starts_with("http://") || image_id.starts_with("https://") {
            Ok(image_id.to_string())
        } else {
            anyhow::bail!("image id '{image_id}' is not a URL")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passthrough_resolver_accepts_urls() {
        let resolver = PassthroughResolver;
        let url = resolver.resolve("https://img.example/a.png").await.unwrap();
        assert_eq!(url, "https://img.example/a.png");
        assert!(resolver.resolve("abc-123").await.is_err());
    }

    #[test]
    fn test_outbound_reply_shape() {
        let line = serde_json::to_string(&OutboundReply {
            channel_id: 42,
            text: "ok",
        })
        .unwrap();
        assert_eq!(line, r#"{"channel_id":42,"text":"ok"}"#);
    }
}
