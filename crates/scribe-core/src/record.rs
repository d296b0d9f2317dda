//! The captured-message record model.

use std::fmt;
use std::hash::{Hash, Hasher};

use tokio::sync::OnceCell;

use crate::content::ContentPart;
use crate::event::MessageId;
use crate::render::ContentRenderer;

/// An immutable capture of one logical message.
///
/// Identity is carried entirely by the transport-assigned id set: two
/// records with the same ids compare equal even if sender or content
/// differ. The rendered text is computed at most once and memoized;
/// concurrent first callers share a single computation.
pub struct Record {
    ids: Vec<MessageId>,
    sender: String,
    content: Vec<ContentPart>,
    timestamp: i64,
    rendered: OnceCell<String>,
}

impl Record {
    /// Create a record. Ids are normalized (sorted, deduplicated) so that
    /// identity is plain set equality.
    pub fn new(
        ids: Vec<MessageId>,
        sender: impl Into<String>,
        content: Vec<ContentPart>,
        timestamp: i64,
    ) -> Self {
        let mut ids = ids;
        ids.sort_unstable();
        ids.dedup();
        Self {
            ids,
            sender: sender.into(),
            content,
            timestamp,
            rendered: OnceCell::new(),
        }
    }

    /// The normalized message id set.
    pub fn ids(&self) -> &[MessageId] {
        &self.ids
    }

    /// Display label frozen at capture time.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Structured content parts in message order.
    pub fn content(&self) -> &[ContentPart] {
        &self.content
    }

    /// Epoch seconds.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Whether any id in `other` belongs to this record.
    pub fn intersects(&self, other: &[MessageId]) -> bool {
        other.iter().any(|id| self.ids.binary_search(id).is_ok())
    }

    /// The text form of this record, computed at most once.
    ///
    /// The first call drives any pending URL resolution; every later call
    /// (and any caller racing the first) observes the same cached string.
    pub async fn rendered_text(&self, renderer: &ContentRenderer) -> &str {
        self.rendered
            .get_or_init(|| async { renderer.render(self).await })
            .await
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids
    }
}

impl Eq for Record {}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ids.hash(state);
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("ids", &self.ids)
            .field("sender", &self.sender)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::event::ImageUrlResolver;

    fn hash_of(record: &Record) -> u64 {
        let mut hasher = DefaultHasher::new();
        record.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_identity_is_id_set_only() {
        let a = Record::new(vec![1, 2], "alice", vec![ContentPart::text("hi")], 100);
        let b = Record::new(vec![2, 1], "bob", vec![ContentPart::text("bye")], 999);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let c = Record::new(vec![1, 3], "alice", vec![ContentPart::text("hi")], 100);
        assert_ne!(a, c);
    }

    #[test]
    fn test_ids_normalized() {
        let record = Record::new(vec![3, 1, 3, 2], "x", vec![], 0);
        assert_eq!(record.ids(), &[1, 2, 3]);
    }

    #[test]
    fn test_intersects() {
        let record = Record::new(vec![10, 20], "x", vec![], 0);
        assert!(record.intersects(&[20, 99]));
        assert!(record.intersects(&[10]));
        assert!(!record.intersects(&[5, 15]));
        assert!(!record.intersects(&[]));
    }

    struct CountingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageUrlResolver for CountingResolver {
        async fn resolve(&self, image_id: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("https://img.example/{image_id}"))
        }
    }

    #[tokio::test]
    async fn test_render_memoized_once() {
        let resolver = Arc::new(CountingResolver {
            calls: AtomicUsize::new(0),
        });
        let renderer = ContentRenderer::new(resolver.clone());
        let record = Record::new(vec![1], "alice", vec![ContentPart::image("abc")], 0);

        let first = record.rendered_text(&renderer).await.to_string();
        let second = record.rendered_text(&renderer).await.to_string();
        assert_eq!(first, second);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_first_render_single_flight() {
        let resolver = Arc::new(CountingResolver {
            calls: AtomicUsize::new(0),
        });
        let renderer = ContentRenderer::new(resolver.clone());
        let record = Record::new(vec![1], "alice", vec![ContentPart::image("abc")], 0);

        let (a, b) = tokio::join!(
            record.rendered_text(&renderer),
            record.rendered_text(&renderer)
        );
        assert_eq!(a, b);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    }
}
