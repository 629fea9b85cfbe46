//! The canonical workflow description model.
//!
//! A [`WorkflowDefinition`] is the input to the graph compiler: a flat list
//! of tasks plus the flows wiring their ports together. It is typically
//! deserialized from JSON, but any custom pipeline format can be translated
//! through the [`IntoWorkflow`] trait.

mod conversion;
mod definition;

pub use conversion::IntoWorkflow;
pub use definition::{FlowDefinition, TaskDefinition, WorkflowDefinition};
