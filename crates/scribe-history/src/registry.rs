//! Channel-keyed history registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use scribe_core::ChannelId;

use crate::ring::{ChannelHistory, DEFAULT_CAPACITY};

/// Lazily creates and hands out per-channel histories.
///
/// Each history sits behind its own mutex: one channel's events are
/// processed in arrival order, but access stays mutually exclusive even
/// if two events for the same channel ever race. Histories live for the
/// process lifetime; nothing removes them.
pub struct HistoryRegistry {
    channels: Mutex<HashMap<ChannelId, Arc<Mutex<ChannelHistory>>>>,
    capacity: usize,
}

impl HistoryRegistry {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Registry whose histories hold `capacity` records each.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// The history for `channel`, created on first access.
    pub fn history(&self, channel: ChannelId) -> Arc<Mutex<ChannelHistory>> {
        self.channels
            .lock()
            .entry(channel)
            .or_insert_with(|| Arc::new(Mutex::new(ChannelHistory::with_capacity(self.capacity))))
            .clone()
    }

    /// Number of channels seen so far.
    pub fn channel_count(&self) -> usize {
        self.channels.lock().len()
    }
}

impl Default for HistoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use scribe_core::Record;

    use super::*;

    #[test]
    fn test_lazy_creation() {
        let registry = HistoryRegistry::new();
        assert_eq!(registry.channel_count(), 0);
        registry.history(1);
        registry.history(2);
        registry.history(1);
        assert_eq!(registry.channel_count(), 2);
    }

    #[test]
    fn test_same_channel_same_buffer() {
        let registry = HistoryRegistry::new();
        registry
            .history(7)
            .lock()
            .append(Arc::new(Record::new(vec![1], "a", vec![], 0)));
        assert_eq!(registry.history(7).lock().len(), 1);
        assert_eq!(registry.history(8).lock().len(), 0);
    }

    #[test]
    fn test_custom_capacity_applies() {
        let registry = HistoryRegistry::with_capacity(2);
        let history = registry.history(1);
        let mut guard = history.lock();
        for id in 1..=3 {
            guard.append(Arc::new(Record::new(vec![id], "a", vec![], 0)));
        }
        assert_eq!(guard.len(), 2);
    }
}
