//! The Samovar agent: completion orchestration with tool resolution,
//! intent-based context reduction, and the pipeline that wires them to the
//! conversation store.
//!
//! One inbound message flows: store → reducer → orchestrator (consulting
//! the tool registry zero or more times) → store. Everything is strictly
//! sequential within a request; each provider call waits for the prior tool
//! result.

pub mod orchestrator;
pub mod pipeline;
pub mod reducer;

pub use orchestrator::CompletionOrchestrator;
pub use pipeline::MessagePipeline;
pub use reducer::ContextReducer;
