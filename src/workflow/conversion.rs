use super::definition::WorkflowDefinition;
use crate::error::WorkflowConversionError;

/// A trait for custom data models that can be converted into a garapa
/// `WorkflowDefinition`.
///
/// This is the primary extension point for making garapa format-agnostic. By
/// implementing this trait on your own description structs, you provide a
/// translation layer that lets the compiler process any visual-editor or
/// service-specific pipeline format.
///
/// # Example
///
/// ```rust,no_run
/// use garapa::prelude::*;
/// use garapa::error::WorkflowConversionError;
///
/// struct MyStep { id: String, kind: String }
/// struct MyPipeline { steps: Vec<MyStep> }
///
/// impl IntoWorkflow for MyPipeline {
///     fn into_workflow(self) -> Result<WorkflowDefinition, WorkflowConversionError> {
///         let tasks = self
///             .steps
///             .into_iter()
///             .map(|step| TaskDefinition::new(step.id, step.kind))
///             .collect();
///
///         Ok(WorkflowDefinition {
///             name: None,
///             tasks,
///             flows: vec![], // convert your connections here as well
///         })
///     }
/// }
/// ```
pub trait IntoWorkflow {
    /// Consumes the object and converts it into a compilable workflow.
    fn into_workflow(self) -> Result<WorkflowDefinition, WorkflowConversionError>;
}

impl IntoWorkflow for WorkflowDefinition {
    fn into_workflow(self) -> Result<WorkflowDefinition, WorkflowConversionError> {
        Ok(self)
    }
}
