//! Analysis engine for log entries: built-in heuristics plus an optional
//! external workflow engine backend.

pub mod engine;
pub mod workflow_client;

pub use engine::{AnalysisConfig, AnalysisEngine};
pub use workflow_client::{WorkflowClient, WorkflowError};
