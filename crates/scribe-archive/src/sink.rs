//! Archive sink contract.

use async_trait::async_trait;

use scribe_core::ChannelId;

/// Delivery target for rendered selections.
///
/// Implementations absorb their own failures: a sink call logs and skips
/// instead of surfacing an error into the event pipeline. Delivery is
/// at-most-once; nothing is retried.
#[async_trait]
pub trait ArchiveSink: Send + Sync {
    /// Append `text` as one entry to the channel's collection point, if
    /// one is configured and reachable.
    async fn archive(&self, text: &str, channel: ChannelId);
}
