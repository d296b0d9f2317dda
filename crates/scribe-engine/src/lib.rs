//! # scribe-engine
//!
//! The reply-driven selection protocol and the orchestrator that wires
//! transport events through history, rendering, and archival.

pub mod orchestrator;
pub mod selection;

pub use orchestrator::Orchestrator;
pub use selection::{Action, SelectionEngine, SelectionState};
