//! Common test utilities for building workflow definitions.
use garapa::prelude::*;
use serde_json::json;

/// A source task reading a CSV dataset.
#[allow(dead_code)]
pub fn reader(id: &str, order: i32) -> TaskDefinition {
    TaskDefinition::new(id, "data-reader")
        .with_param("data_source", json!("iris.csv"))
        .with_order(order)
}

/// A projection task keeping two attributes.
#[allow(dead_code)]
pub fn select(id: &str, order: i32) -> TaskDefinition {
    TaskDefinition::new(id, "select")
        .with_param("attributes", json!(["sepallength", "sepalwidth"]))
        .with_order(order)
}

/// A terminal report task.
#[allow(dead_code)]
pub fn report(id: &str, order: i32) -> TaskDefinition {
    TaskDefinition::new(id, "table-report").with_order(order)
}

#[allow(dead_code)]
pub fn flow(
    source_id: &str,
    source_port: &str,
    target_id: &str,
    target_port: &str,
) -> FlowDefinition {
    FlowDefinition::new(source_id, source_port, target_id, target_port)
}

/// Creates a simple, valid three-task workflow.
///
/// Chain: `read` (source) -> `narrow` (projection) -> `show` (report sink).
#[allow(dead_code)]
pub fn linear_workflow() -> WorkflowDefinition {
    WorkflowDefinition {
        name: Some("linear".to_string()),
        tasks: vec![
            reader("read", 1),
            select("narrow", 2),
            report("show", 3),
        ],
        flows: vec![
            flow("read", "output data", "narrow", "input data"),
            flow("narrow", "output data", "show", "input data"),
        ],
    }
}

/// Creates a clustering pipeline: a dataset and an unfitted estimator are
/// wired into a model-fitting task whose transformed frame feeds a report.
#[allow(dead_code)]
pub fn clustering_workflow() -> WorkflowDefinition {
    WorkflowDefinition {
        name: Some("clustering".to_string()),
        tasks: vec![
            reader("read", 1),
            TaskDefinition::new("algo", "kmeans-clustering")
                .with_param("n_clusters", json!(3))
                .with_order(2),
            TaskDefinition::new("fit", "clustering-model")
                .with_param("features", json!(["features"]))
                .with_order(3),
            report("show", 4),
        ],
        flows: vec![
            flow("read", "output data", "fit", "train input data"),
            flow("algo", "algorithm", "fit", "algorithm"),
            flow("fit", "output data", "show", "input data"),
        ],
    }
}

/// Compiles a workflow with the default registry and configuration.
#[allow(dead_code)]
pub fn compile(workflow: WorkflowDefinition) -> std::result::Result<GeneratedProgram, CompileError> {
    Compiler::builder(workflow).build().compile()
}

/// Builds the graph for a workflow with the default registry.
#[allow(dead_code)]
pub fn build_graph(workflow: &WorkflowDefinition) -> std::result::Result<WorkflowGraph, BuildError> {
    WorkflowGraph::build(&workflow.tasks, &workflow.flows, &default_registry())
}
