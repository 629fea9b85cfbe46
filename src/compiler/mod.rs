//! The compile pipeline facade.
//!
//! `Compiler::builder(workflow).build().compile()` runs the whole
//! build → validate → sort → assemble sequence and either returns a
//! [`GeneratedProgram`] or the first fatal error. Each compile constructs
//! its own graph; there is no shared mutable state between requests, so
//! independent compiles may run in parallel as long as the registry they
//! share is read-only.

use crate::error::CompileError;
use crate::graph::{WorkflowGraph, sort, validate};
use crate::operation::{OperationFactory, create_factory_by_name, register_default_factories};
use crate::workflow::WorkflowDefinition;
use ahash::AHashMap;
use tracing::{debug, info};

mod artifact;
mod assembler;

pub use artifact::CompiledWorkflow;
pub use assembler::{CodeFragment, GeneratedProgram, assemble, synthesized_identifier};

/// Explicit configuration handed to every operation constructor. This
/// replaces ambient process-wide settings: anything an operation needs from
/// the environment arrives here.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Base location joined onto relative `data_source` paths.
    pub storage_base_url: Option<String>,
    /// Prefix each emitted fragment with a `# Task <id> (<tag>)` header.
    pub emit_task_comments: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            storage_base_url: None,
            emit_task_comments: true,
        }
    }
}

pub struct Compiler {
    workflow: WorkflowDefinition,
    registry: AHashMap<String, Box<dyn OperationFactory>>,
    config: CompilerConfig,
}

pub struct CompilerBuilder {
    workflow: WorkflowDefinition,
    registry: AHashMap<String, Box<dyn OperationFactory>>,
    config: CompilerConfig,
}

impl CompilerBuilder {
    pub fn new(workflow: WorkflowDefinition) -> Self {
        let mut registry: AHashMap<String, Box<dyn OperationFactory>> = AHashMap::new();
        register_default_factories(&mut registry);
        Self {
            workflow,
            registry,
            config: CompilerConfig::default(),
        }
    }

    /// Registers a built-in operation under a caller-specific tag.
    pub fn with_type_mapping(mut self, user_type_name: &str, garapa_type_name: &str) -> Self {
        if let Some(factory) = create_factory_by_name(garapa_type_name) {
            self.registry.insert(user_type_name.to_string(), factory);
        }
        self
    }

    /// Registers a custom operation factory under its own tag.
    pub fn with_operation(mut self, factory: Box<dyn OperationFactory>) -> Self {
        self.registry
            .insert(factory.operation_type().to_string(), factory);
        self
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            workflow: self.workflow,
            registry: self.registry,
            config: self.config,
        }
    }
}

impl Compiler {
    pub fn builder(workflow: WorkflowDefinition) -> CompilerBuilder {
        CompilerBuilder::new(workflow)
    }

    /// Compiles the workflow into an ordered program.
    ///
    /// Structural errors abort the whole compile; a partial graph is never
    /// partially compiled.
    pub fn compile(self) -> Result<GeneratedProgram, CompileError> {
        info!(
            workflow = self.workflow.name.as_deref().unwrap_or("<unnamed>"),
            "compiling workflow"
        );

        let graph = WorkflowGraph::build(&self.workflow.tasks, &self.workflow.flows, &self.registry)?;

        let issues = validate(&graph);
        if !issues.is_empty() {
            return Err(CompileError::Validation { issues });
        }

        let sorted = sort(&graph)?;
        let program = assemble(&graph, &sorted, &self.registry, &self.config)?;

        debug!(
            fragments = program.fragments.len(),
            imports = program.imports.len(),
            "workflow compiled"
        );
        Ok(program)
    }
}
