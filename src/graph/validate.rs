use super::WorkflowGraph;
use crate::error::ValidationIssue;
use crate::operation::{Arity, contains_results};
use tracing::debug;

/// Checks in-degree/out-degree constraints per port semantics.
///
/// Returns every violation found (empty = structurally valid); callers get
/// all problems in one pass instead of fixing them one compile at a time.
/// Dangling references never reach this stage; the builder rejects them
/// with a different error class.
pub fn validate(graph: &WorkflowGraph) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    // A workflow of exactly one task may be fully isolated.
    let single_task = graph.task_count() == 1;

    for task in graph.tasks() {
        for port in &task.ports.inputs {
            if port.arity == Arity::Single {
                let in_degree = task.input_degrees.get(port.name).copied().unwrap_or(0);
                if in_degree > 1 {
                    issues.push(ValidationIssue::Multiplicity {
                        task_id: task.id.clone(),
                        port: port.name.to_string(),
                        in_degree,
                    });
                }
            }
        }

        if single_task {
            continue;
        }

        // Terminal sinks escape the consumer checks when their effect is
        // observable without consumers: they display results directly or
        // produce a model/visualization artifact.
        let terminal_satisfied =
            task.result_kind.is_some() || contains_results(&task.parameters);

        for port in &task.ports.outputs {
            let out_degree = task.output_degrees.get(port.name).copied().unwrap_or(0);
            if port.required && out_degree == 0 && !terminal_satisfied {
                issues.push(ValidationIssue::UnconsumedOutput {
                    task_id: task.id.clone(),
                    port: port.name.to_string(),
                });
            }
        }

        let has_required_output = task.ports.outputs.iter().any(|p| p.required);
        if task.in_degree() == 0
            && task.out_degree == 0
            && !terminal_satisfied
            && !has_required_output
        {
            issues.push(ValidationIssue::IsolatedTask {
                task_id: task.id.clone(),
            });
        }
    }

    debug!(issues = issues.len(), "structural validation finished");
    issues
}
