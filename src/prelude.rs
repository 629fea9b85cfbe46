//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the
//! garapa crate. Import this module to get access to the core functionality
//! without having to import each type individually.
//!
//! # Example
//!
//! ```rust,no_run
//! use garapa::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! // Load and compile a workflow description
//! let workflow_json = std::fs::read_to_string("path/to/workflow.json")?;
//! let workflow: WorkflowDefinition = serde_json::from_str(&workflow_json)?;
//!
//! let program = Compiler::builder(workflow).build().compile()?;
//! println!("{}", program.source());
//! # Ok(())
//! # }
//! ```

// Core compilation pipeline
pub use crate::compiler::{
    CodeFragment, CompiledWorkflow, Compiler, CompilerBuilder, CompilerConfig, GeneratedProgram,
    assemble, synthesized_identifier,
};
pub use crate::graph::{WorkflowGraph, sort, validate};

// Workflow description model
pub use crate::workflow::{FlowDefinition, IntoWorkflow, TaskDefinition, WorkflowDefinition};

// Operation contract
pub use crate::operation::{
    Arity, ExecutionFacts, InputPort, Operation, OperationContext, OperationFactory, OutputPort,
    PortSpec, ResultKind, contains_results, default_registry, execution_required,
};

// Error types
pub use crate::error::{
    AssemblyError, BuildError, CompileError, CycleError, OperationError, ValidationIssue,
};

// Map type commonly used with this crate
pub use indexmap::IndexMap;

// Result type alias for convenience
pub type Result<T, E = Box<dyn std::error::Error>> = std::result::Result<T, E>;
