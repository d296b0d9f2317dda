//! # scribe-archive
//!
//! Archive delivery for Scribe: the [`ArchiveSink`] contract and its
//! GitHub-issues implementation, which appends rendered selections as
//! comments on the newest open "collecting" issue of a channel's
//! configured repository.

pub mod github;
pub mod sink;

pub use github::GithubArchive;
pub use sink::ArchiveSink;
