//! Fixed-capacity channel history.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use scribe_core::{MessageId, Record};

/// Records retained per channel before the oldest are evicted.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Insertion-ordered ring of records for one channel.
///
/// Appending beyond capacity silently drops the oldest entry. The buffer
/// never holds two records with intersecting id sets.
#[derive(Debug)]
pub struct ChannelHistory {
    buf: VecDeque<Arc<Record>>,
    capacity: usize,
}

impl ChannelHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append a record, evicting the oldest entry when full.
    ///
    /// A record whose ids intersect an existing entry is dropped to keep
    /// id sets disjoint; this is a no-op, never an error.
    pub fn append(&mut self, record: Arc<Record>) {
        if self.buf.iter().any(|r| r.intersects(record.ids())) {
            debug!(ids = ?record.ids(), "dropping record with duplicate ids");
            return;
        }
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(record);
    }

    /// First record in insertion order whose id set intersects `ids`.
    pub fn find_by_ids(&self, ids: &[MessageId]) -> Option<Arc<Record>> {
        self.buf.iter().find(|r| r.intersects(ids)).cloned()
    }

    /// Insertion-order index of the matching record.
    pub fn position_of(&self, ids: &[MessageId]) -> Option<usize> {
        self.buf.iter().position(|r| r.intersects(ids))
    }

    /// Every record from the match (inclusive) through the newest, or
    /// empty when nothing matches.
    pub fn suffix_from(&self, ids: &[MessageId]) -> Vec<Arc<Record>> {
        match self.position_of(ids) {
            Some(index) => self.buf.iter().skip(index).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Fresh snapshot of the current contents in insertion order.
    pub fn snapshot(&self) -> Vec<Arc<Record>> {
        self.buf.iter().cloned().collect()
    }
}

impl Default for ChannelHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: MessageId, sender: &str) -> Arc<Record> {
        Arc::new(Record::new(vec![id], sender, vec![], id))
    }

    #[test]
    fn test_append_and_snapshot_order() {
        let mut history = ChannelHistory::new();
        for id in 1..=5 {
            history.append(record(id, "a"));
        }
        let ids: Vec<_> = history.snapshot().iter().map(|r| r.ids()[0]).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_eviction_keeps_newest() {
        let mut history = ChannelHistory::with_capacity(4);
        for id in 1..=6 {
            history.append(record(id, "a"));
        }
        assert_eq!(history.len(), 4);
        let ids: Vec<_> = history.snapshot().iter().map(|r| r.ids()[0]).collect();
        assert_eq!(ids, vec![3, 4, 5, 6]);
        assert!(history.find_by_ids(&[1]).is_none());
        assert!(history.find_by_ids(&[2]).is_none());
    }

    #[test]
    fn test_duplicate_ids_dropped() {
        let mut history = ChannelHistory::new();
        history.append(Arc::new(Record::new(vec![1, 2], "a", vec![], 0)));
        history.append(Arc::new(Record::new(vec![2, 3], "b", vec![], 1)));
        assert_eq!(history.len(), 1);
        let found = history.find_by_ids(&[2]).expect("original still present");
        assert_eq!(found.sender(), "a");
    }

    #[test]
    fn test_find_by_intersection() {
        let mut history = ChannelHistory::new();
        history.append(Arc::new(Record::new(vec![10, 11], "a", vec![], 0)));
        history.append(Arc::new(Record::new(vec![20], "b", vec![], 1)));

        assert_eq!(history.find_by_ids(&[11]).map(|r| r.sender().to_string()), Some("a".into()));
        assert_eq!(history.position_of(&[20]), Some(1));
        assert!(history.find_by_ids(&[30]).is_none());
    }

    #[test]
    fn test_suffix_from_inclusive() {
        let mut history = ChannelHistory::new();
        for id in 1..=4 {
            history.append(record(id, "a"));
        }
        let suffix: Vec<_> = history
            .suffix_from(&[2])
            .iter()
            .map(|r| r.ids()[0])
            .collect();
        assert_eq!(suffix, vec![2, 3, 4]);
    }

    #[test]
    fn test_suffix_from_missing_is_empty() {
        let mut history = ChannelHistory::new();
        history.append(record(1, "a"));
        assert!(history.suffix_from(&[99]).is_empty());
    }

    #[test]
    fn test_snapshot_is_not_live() {
        let mut history = ChannelHistory::new();
        history.append(record(1, "a"));
        let snapshot = history.snapshot();
        history.append(record(2, "a"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(history.len(), 2);
    }
}
