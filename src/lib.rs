//! # Garapa - Workflow Graph Compiler
//!
//! **Garapa** compiles declarative, node-based pipeline descriptions into an
//! ordered sequence of executable code fragments. Users assemble visual or
//! JSON-described workflows; each task wraps a typed operation (a classifier,
//! a feature transform, a report) with named input/output ports, and each
//! flow connects an output port of one task to an input port of another.
//!
//! ## Core Workflow
//!
//! The compiler is format-agnostic. It operates on a canonical internal
//! model of a workflow definition. The primary workflow is:
//!
//! 1.  **Load Your Description**: Parse your pipeline format (JSON from a
//!     visual editor, a service payload, etc.) into your own Rust structs,
//!     or deserialize straight into [`workflow::WorkflowDefinition`].
//! 2.  **Convert**: Implement the [`workflow::IntoWorkflow`] trait for your
//!     structs to provide a translation layer into garapa's model.
//! 3.  **Compile**: Use `Compiler::builder` to create a compiler. It builds
//!     the directed graph, validates port cardinalities, proves the graph
//!     acyclic, orders the tasks deterministically and resolves every port
//!     binding to a concrete identifier.
//! 4.  **Package**: Hand the resulting [`compiler::GeneratedProgram`] (the
//!     import header, ordered fragments and per-task output identifiers) to
//!     your packaging/execution layer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use garapa::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Describe the pipeline: read a dataset, cluster it, show a table.
//!     let workflow = WorkflowDefinition {
//!         name: Some("iris clustering".to_string()),
//!         tasks: vec![
//!             TaskDefinition::new("read", "data-reader")
//!                 .with_param("data_source", json!("iris.csv"))
//!                 .with_order(1),
//!             TaskDefinition::new("cluster", "agglomerative-clustering")
//!                 .with_param("attributes", json!(["sepal_length"]))
//!                 .with_order(2),
//!             TaskDefinition::new("show", "table-report").with_order(3),
//!         ],
//!         flows: vec![
//!             FlowDefinition::new("read", "output data", "cluster", "input data"),
//!             FlowDefinition::new("cluster", "output data", "show", "input data"),
//!         ],
//!     };
//!
//!     // Compile: build -> validate -> sort -> assemble.
//!     let program = Compiler::builder(workflow).build().compile()?;
//!
//!     // Producers always precede their consumers in the emitted source.
//!     println!("{}", program.source());
//!     Ok(())
//! }
//! ```

pub mod compiler;
pub mod error;
pub mod graph;
pub mod operation;
pub mod prelude;
pub mod workflow;
