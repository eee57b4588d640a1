/// Runtime Execution Engine
///
/// This module executes stored workflows against the action catalog:
/// - Topological ordering of steps over their dependency graph (petgraph)
/// - Per-step contract gating through the schema module
/// - A closed registry binding action keys to mock executors

// Schema-gated execution engine
pub mod engine;

// Action key enumeration, executor capability trait, and mock executors
pub mod executors;

// Re-export main types
pub use engine::{EngineConfig, ExecutionEngine, MissingExecutorPolicy, StepOutcome, StepStatus};
pub use executors::{ActionKey, ExecutorRegistry, StepExecutor};
