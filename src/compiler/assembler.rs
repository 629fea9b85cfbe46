use super::CompilerConfig;
use crate::error::AssemblyError;
use crate::graph::WorkflowGraph;
use crate::operation::{ExecutionFacts, OperationContext, OperationFactory, contains_results};
use ahash::AHashMap;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// The code contributed by one task. Fragments keep their task identity so
/// the packaging layer can attribute failures and progress to tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFragment {
    pub task_id: String,
    pub operation_type: String,
    /// Empty for tasks that participate in ordering only.
    pub code: String,
}

/// The ordered output of a compile: import header, per-task fragments and
/// each task's resolved output identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratedProgram {
    /// Deduplicated, sorted import lines required by the fragments.
    pub imports: Vec<String>,
    /// One fragment per task, in topological order.
    pub fragments: Vec<CodeFragment>,
    /// Task id → output port → resolved identifier.
    pub outputs: AHashMap<String, IndexMap<String, String>>,
}

impl GeneratedProgram {
    /// Concatenates the import header and every non-empty fragment, in
    /// order. Task order is the sole ordering signal.
    pub fn source(&self) -> String {
        let mut sections = Vec::with_capacity(self.fragments.len() + 1);
        if !self.imports.is_empty() {
            sections.push(self.imports.iter().join("\n"));
        }
        sections.extend(
            self.fragments
                .iter()
                .filter(|fragment| !fragment.code.is_empty())
                .map(|fragment| fragment.code.clone()),
        );
        sections.join("\n\n")
    }
}

/// The documented default for output ports the user did not name:
/// `<port_slug>_task_<position>`, where `position` is the task's index in
/// the sorted order. The position is unique per compile, so synthesized
/// identifiers never collide even when user-supplied `order` values do.
pub fn synthesized_identifier(port: &str, position: usize) -> String {
    let slug: String = port
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{slug}_task_{position}")
}

/// Walks the sorted task list, resolves every port binding, invokes each
/// task's code-generation contract and concatenates the results in order.
pub fn assemble(
    graph: &WorkflowGraph,
    sorted_tasks: &[String],
    registry: &AHashMap<String, Box<dyn OperationFactory>>,
    config: &CompilerConfig,
) -> Result<GeneratedProgram, AssemblyError> {
    let mut resolved_outputs: AHashMap<String, IndexMap<String, String>> =
        AHashMap::with_capacity(sorted_tasks.len());
    let mut fragments = Vec::with_capacity(sorted_tasks.len());
    let mut imports = BTreeSet::new();

    for (position, task_id) in sorted_tasks.iter().enumerate() {
        let task = graph.task(task_id).ok_or_else(|| AssemblyError::UnknownTask {
            task_id: task_id.clone(),
        })?;

        // Every declared output resolves to the user-chosen identifier or
        // the synthesized default, before consumers ask for it.
        let outputs: IndexMap<String, String> = task
            .ports
            .outputs
            .iter()
            .map(|port| {
                let identifier = task
                    .named_outputs
                    .get(port.name)
                    .cloned()
                    .unwrap_or_else(|| synthesized_identifier(port.name, position));
                (port.name.to_string(), identifier)
            })
            .collect();

        // Inputs read the upstream task's resolved identifiers through the
        // reversed view. Fan-out needs no special case: every consumer of
        // one output port reads the same entry.
        let mut named_inputs: IndexMap<String, Vec<String>> = IndexMap::new();
        for (feeder, flow) in graph.feeders(task_id) {
            let identifier = resolved_outputs
                .get(&feeder.id)
                .and_then(|ports| ports.get(&flow.source_port))
                .cloned()
                .ok_or_else(|| AssemblyError::UnknownTask {
                    task_id: feeder.id.clone(),
                })?;
            named_inputs
                .entry(flow.target_port.clone())
                .or_default()
                .push(identifier);
        }

        for port in &task.ports.inputs {
            if port.required && !named_inputs.contains_key(port.name) {
                return Err(AssemblyError::UnboundPort {
                    task_id: task.id.clone(),
                    port: port.name.to_string(),
                });
            }
        }

        let factory =
            registry
                .get(&task.operation_type)
                .ok_or_else(|| AssemblyError::UnknownOperation {
                    task_id: task.id.clone(),
                    operation_type: task.operation_type.clone(),
                })?;

        let tag_error = |source| AssemblyError::Operation {
            task_id: task.id.clone(),
            operation_type: task.operation_type.clone(),
            source,
        };

        let ctx = OperationContext {
            task_id: &task.id,
            order: task.order,
            parameters: &task.parameters,
            named_inputs: &named_inputs,
            named_outputs: &outputs,
            output_degrees: &task.output_degrees,
            out_degree: task.out_degree,
            config,
        };
        let operation = factory.build(ctx).map_err(tag_error)?;

        let facts = ExecutionFacts {
            is_satisfied: true,
            ignore_out_degree: false,
            ignore_has_code: false,
            out_degree: task.out_degree,
            contains_results: contains_results(&task.parameters),
        };
        let code = if operation.has_code() || operation.must_be_executed(&facts) {
            let body = operation.generate_code().map_err(tag_error)?;
            for import in operation.imports() {
                imports.insert(import.to_string());
            }
            if body.is_empty() || !config.emit_task_comments {
                body
            } else {
                format!(
                    "# Task {id} ({operation_type})\n{body}",
                    id = task.id,
                    operation_type = task.operation_type
                )
            }
        } else {
            debug!(task = %task.id, "task emits no code");
            String::new()
        };

        fragments.push(CodeFragment {
            task_id: task.id.clone(),
            operation_type: task.operation_type.clone(),
            code,
        });
        resolved_outputs.insert(task.id.clone(), outputs);
    }

    Ok(GeneratedProgram {
        imports: imports.into_iter().collect(),
        fragments,
        outputs: resolved_outputs,
    })
}
