//! Pipeline execution: the engine and the per-stage executor

pub mod engine;
pub mod executor;

pub use engine::{EngineError, EventHandler, ExecutionEngine, ExecutionEvent};
pub use executor::{ExecutionResult, StageExecutor};
