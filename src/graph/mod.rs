//! The directed workflow graph and its construction.
//!
//! A [`WorkflowGraph`] is built fresh for every compile request from the flat
//! task/flow lists. Construction already rejects malformed descriptions
//! (dangling task or port references, duplicate ids, unknown operation
//! tags); cardinality rules are checked separately by [`validate`].

mod sort;
mod validate;

pub use sort::sort;
pub use validate::validate;

use crate::error::{BuildError, PortDirection};
use crate::operation::{OperationFactory, PortSpec, ResultKind};
use crate::workflow::{FlowDefinition, TaskDefinition};
use ahash::AHashMap;
use indexmap::IndexMap;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::debug;

/// A graph node: one task with its operation tag, parameter bag, declared
/// port set and the degree tallies populated during construction.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub operation_type: String,
    pub parameters: serde_json::Map<String, serde_json::Value>,
    /// Tie-break ordinal, never the authoritative order.
    pub order: i32,
    /// User-chosen identifiers per output port.
    pub named_outputs: IndexMap<String, String>,
    /// Snapshot of the operation's declared ports.
    pub ports: PortSpec,
    pub result_kind: Option<ResultKind>,
    /// Count of outbound flows.
    pub out_degree: usize,
    /// Inbound flow count per declared input port.
    pub input_degrees: IndexMap<String, usize>,
    /// Outbound flow count per declared output port.
    pub output_degrees: IndexMap<String, usize>,
}

impl Task {
    /// Total inbound flow count across all input ports.
    pub fn in_degree(&self) -> usize {
        self.input_degrees.values().sum()
    }
}

/// A graph edge: the port pair a flow binds together.
#[derive(Debug, Clone)]
pub struct Flow {
    pub source_port: String,
    pub target_port: String,
}

/// The directed graph over tasks with flows as edges.
pub struct WorkflowGraph {
    graph: DiGraph<Task, Flow>,
    index: AHashMap<String, NodeIndex>,
}

impl WorkflowGraph {
    /// Converts a task/flow list into an adjacency-based graph.
    ///
    /// The registry supplies each operation's declared port set. Input lists
    /// are only read, never mutated.
    pub fn build(
        tasks: &[TaskDefinition],
        flows: &[FlowDefinition],
        registry: &AHashMap<String, Box<dyn OperationFactory>>,
    ) -> Result<Self, BuildError> {
        debug!(
            tasks = tasks.len(),
            flows = flows.len(),
            "building workflow graph"
        );

        let mut graph = DiGraph::with_capacity(tasks.len(), flows.len());
        let mut index = AHashMap::with_capacity(tasks.len());

        for task in tasks {
            let factory =
                registry
                    .get(&task.operation)
                    .ok_or_else(|| BuildError::UnknownOperation {
                        task_id: task.id.clone(),
                        operation_type: task.operation.clone(),
                    })?;
            let ports = factory.ports();
            let input_degrees = ports.inputs.iter().map(|p| (p.name.to_string(), 0)).collect();
            let output_degrees = ports.outputs.iter().map(|p| (p.name.to_string(), 0)).collect();
            let node = graph.add_node(Task {
                id: task.id.clone(),
                operation_type: task.operation.clone(),
                parameters: task.parameters.clone(),
                order: task.order,
                named_outputs: task.named_outputs.clone(),
                ports,
                result_kind: factory.result_kind(),
                out_degree: 0,
                input_degrees,
                output_degrees,
            });
            if index.insert(task.id.clone(), node).is_some() {
                return Err(BuildError::DuplicateTask {
                    task_id: task.id.clone(),
                });
            }
        }

        for flow in flows {
            let source = *index
                .get(&flow.source_id)
                .ok_or_else(|| BuildError::DanglingTask {
                    missing_task_id: flow.source_id.clone(),
                    other_task_id: flow.target_id.clone(),
                })?;
            let target = *index
                .get(&flow.target_id)
                .ok_or_else(|| BuildError::DanglingTask {
                    missing_task_id: flow.target_id.clone(),
                    other_task_id: flow.source_id.clone(),
                })?;

            if graph[source].ports.output(&flow.source_port).is_none() {
                return Err(BuildError::DanglingPort {
                    task_id: flow.source_id.clone(),
                    port: flow.source_port.clone(),
                    direction: PortDirection::Output,
                });
            }
            if graph[target].ports.input(&flow.target_port).is_none() {
                return Err(BuildError::DanglingPort {
                    task_id: flow.target_id.clone(),
                    port: flow.target_port.clone(),
                    direction: PortDirection::Input,
                });
            }

            graph.add_edge(
                source,
                target,
                Flow {
                    source_port: flow.source_port.clone(),
                    target_port: flow.target_port.clone(),
                },
            );

            let source_task = &mut graph[source];
            source_task.out_degree += 1;
            if let Some(count) = source_task.output_degrees.get_mut(&flow.source_port) {
                *count += 1;
            }
            let target_task = &mut graph[target];
            if let Some(count) = target_task.input_degrees.get_mut(&flow.target_port) {
                *count += 1;
            }
        }

        Ok(Self { graph, index })
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn flow_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.index.get(id).map(|idx| &self.graph[*idx])
    }

    /// Tasks in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.graph.node_indices().map(|idx| &self.graph[idx])
    }

    /// What feeds this task: the reversed (consumer → producer) view of the
    /// adjacency structure, in flow-declaration order.
    pub fn feeders(&self, id: &str) -> Vec<(&Task, &Flow)> {
        self.directed(id, Direction::Incoming)
    }

    /// What this task feeds, in flow-declaration order.
    pub fn consumers(&self, id: &str) -> Vec<(&Task, &Flow)> {
        self.directed(id, Direction::Outgoing)
    }

    fn directed(&self, id: &str, direction: Direction) -> Vec<(&Task, &Flow)> {
        let Some(idx) = self.index.get(id) else {
            return Vec::new();
        };
        // petgraph iterates edges most-recently-added first.
        let mut links: Vec<(&Task, &Flow)> = self
            .graph
            .edges_directed(*idx, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                (&self.graph[other], edge.weight())
            })
            .collect();
        links.reverse();
        links
    }

    pub(crate) fn petgraph(&self) -> &DiGraph<Task, Flow> {
        &self.graph
    }
}
