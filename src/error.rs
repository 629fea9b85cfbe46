use itertools::Itertools;
use thiserror::Error;

/// Errors raised while converting a task/flow list into a `WorkflowGraph`.
///
/// These all mean the description itself is malformed; none of them can be
/// recovered from by relaxing cardinality rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error(
        "Flow references task '{missing_task_id}', which does not exist (other endpoint: '{other_task_id}')"
    )]
    DanglingTask {
        missing_task_id: String,
        other_task_id: String,
    },

    #[error("Task '{task_id}' has no declared {direction} port named '{port}'")]
    DanglingPort {
        task_id: String,
        port: String,
        direction: PortDirection,
    },

    #[error("Task '{task_id}' has an unregistered operation type: '{operation_type}'")]
    UnknownOperation {
        task_id: String,
        operation_type: String,
    },

    #[error("Task id '{task_id}' appears more than once in the task list")]
    DuplicateTask { task_id: String },
}

/// Which side of a task a port sits on. Used in diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

impl std::fmt::Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

/// A single structural violation found by the validator.
///
/// The validator accumulates every issue it finds instead of stopping at the
/// first one, so a caller can report all problems in one pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error(
        "Input port '{port}' of task '{task_id}' accepts a single connection but receives {in_degree}"
    )]
    Multiplicity {
        task_id: String,
        port: String,
        in_degree: usize,
    },

    #[error(
        "Output port '{port}' of task '{task_id}' has no consumers and the task produces no observable result"
    )]
    UnconsumedOutput { task_id: String, port: String },

    #[error("Task '{task_id}' is connected to nothing and produces no observable result")]
    IsolatedTask { task_id: String },
}

/// The workflow graph is not acyclic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Workflow graph contains a cycle through task '{task_id}'")]
pub struct CycleError {
    pub task_id: String,
}

/// Errors raised inside an individual operation's construction or code
/// generation. They carry no task identity of their own; the assembler tags
/// them with the offending task when it wraps them in an [`AssemblyError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Parameter '{name}' must be informed")]
    MissingParameter { name: String },

    #[error("Parameter '{name}' is invalid: {message}")]
    InvalidParameter { name: String, message: String },
}

/// Errors raised while resolving ports and assembling code fragments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("Required input port '{port}' of task '{task_id}' has no binding")]
    UnboundPort { task_id: String, port: String },

    #[error("Sorted task list references task '{task_id}', which is not in the graph")]
    UnknownTask { task_id: String },

    #[error("Task '{task_id}' has an unregistered operation type: '{operation_type}'")]
    UnknownOperation {
        task_id: String,
        operation_type: String,
    },

    #[error("Operation '{operation_type}' of task '{task_id}' failed: {source}")]
    Operation {
        task_id: String,
        operation_type: String,
        #[source]
        source: OperationError,
    },
}

/// Errors raised when converting a custom user format into a garapa
/// `WorkflowDefinition`.
#[derive(Error, Debug, Clone)]
pub enum WorkflowConversionError {
    #[error("Invalid pipeline description: {0}")]
    ValidationError(String),
}

/// Errors raised while persisting or loading a compiled workflow artifact.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("{0}")]
    Generic(String),
}

/// Umbrella error for the whole build → validate → sort → assemble pipeline.
#[derive(Error, Debug, Clone)]
pub enum CompileError {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(
        "Workflow failed structural validation with {} issue(s): {}",
        issues.len(),
        issues.iter().map(ToString::to_string).join("; ")
    )]
    Validation { issues: Vec<ValidationIssue> },

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}
