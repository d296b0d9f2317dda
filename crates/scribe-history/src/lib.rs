//! # scribe-history
//!
//! Bounded per-channel message history for Scribe.
//!
//! Each channel owns a fixed-capacity, insertion-ordered ring of records;
//! a process-wide registry creates rings lazily and hands them out behind
//! per-channel locks.

pub mod registry;
pub mod ring;

pub use registry::HistoryRegistry;
pub use ring::{ChannelHistory, DEFAULT_CAPACITY};
