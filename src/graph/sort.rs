use super::WorkflowGraph;
use crate::error::CycleError;
use itertools::Itertools;
use petgraph::Direction;
use petgraph::visit::EdgeRef;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Proves the graph acyclic and produces one deterministic linear extension.
///
/// Kahn's algorithm with a min-heap frontier: whenever several tasks are
/// ready, the one with the smallest `(order, id)` key is emitted next, so
/// the same input always yields the same output order. Parallel flows
/// between two tasks count individually.
pub fn sort(graph: &WorkflowGraph) -> Result<Vec<String>, CycleError> {
    let g = graph.petgraph();

    let mut in_degrees: Vec<usize> = g
        .node_indices()
        .map(|idx| g.edges_directed(idx, Direction::Incoming).count())
        .collect();

    let mut ready = BinaryHeap::new();
    for idx in g.node_indices() {
        if in_degrees[idx.index()] == 0 {
            let task = &g[idx];
            ready.push(Reverse((task.order, task.id.clone(), idx)));
        }
    }

    let mut sorted = Vec::with_capacity(g.node_count());
    while let Some(Reverse((_, id, idx))) = ready.pop() {
        sorted.push(id);
        for edge in g.edges_directed(idx, Direction::Outgoing) {
            let target = edge.target();
            in_degrees[target.index()] -= 1;
            if in_degrees[target.index()] == 0 {
                let task = &g[target];
                ready.push(Reverse((task.order, task.id.clone(), target)));
            }
        }
    }

    if sorted.len() < g.node_count() {
        // Some tasks never became ready: they sit on (or behind) a cycle.
        // Name the smallest one for a stable diagnostic.
        let task_id = g
            .node_indices()
            .filter(|idx| in_degrees[idx.index()] > 0)
            .map(|idx| (g[idx].order, g[idx].id.clone()))
            .min()
            .map(|(_, id)| id)
            .unwrap_or_default();
        return Err(CycleError { task_id });
    }

    tracing::debug!(order = %sorted.iter().join(" -> "), "topological sort finished");
    Ok(sorted)
}
