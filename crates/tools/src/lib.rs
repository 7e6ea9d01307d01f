//! ARMORY: Tool orchestration core
//!
//! A registry of named tools, a sequential chain composer with `{key}`
//! templating, and a concurrent executor that runs batches over a fixed
//! worker budget.

use thiserror::Error;

pub mod builtin;
pub mod chain;
pub mod executor;
pub mod registry;
pub mod tool;

pub use builtin::register_builtin_tools;
pub use chain::{ChainContext, ChainStep, ToolChain, INPUT_KEY};
pub use executor::{ConcurrentExecutor, Task, DEFAULT_MAX_WORKERS};
pub use registry::{RegistryEntry, ToolRegistry};
pub use tool::{FunctionDef, FunctionSchema, ParameterType, Tool, ToolError, ToolParameter};

/// Failure of a single registry lookup or invocation.
///
/// The `Display` text of each variant is the observation string handed back to
/// agent loops by [`ToolRegistry::execute`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("error: tool '{0}' not found")]
    ToolNotFound(String),

    #[error("error executing tool '{name}': {message}")]
    Execution { name: String, message: String },
}

/// Faults that abort a chain run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("◆ CHAIN STEP {step} ('{tool}'): unresolved placeholder '{{{key}}}'")]
    UnresolvedPlaceholder {
        step: usize,
        tool: String,
        key: String,
    },

    #[error("◆ CHAIN STEP {step} ('{tool}'): malformed template {template:?}")]
    MalformedTemplate {
        step: usize,
        tool: String,
        template: String,
    },

    #[error("◆ CHAIN STEP {step} ('{tool}'): output_key 'input' is reserved")]
    ReservedOutputKey { step: usize, tool: String },
}

/// Faults of the scheduling layer, never of an individual tool
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("◆ INVALID WORKER BUDGET: {0}")]
    InvalidWorkerBudget(usize),

    #[error("◆ EXECUTOR SHUT DOWN")]
    ShutDown,

    #[error("◆ SCHEDULING FAILED FOR TASK {index}: {message}")]
    Scheduling { index: usize, message: String },
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
