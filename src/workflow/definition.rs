use indexmap::IndexMap;
use serde::Deserialize;

/// The complete, canonical definition of a workflow, ready for compilation.
/// This is the target structure for any custom pipeline format conversion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub name: Option<String>,
    pub tasks: Vec<TaskDefinition>,
    #[serde(default)]
    pub flows: Vec<FlowDefinition>,
}

/// Defines a single task (one operation instance) in the workflow.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskDefinition {
    pub id: String,
    /// Tag selecting the pluggable operation implementation, e.g.
    /// `"kmeans-clustering"`.
    #[serde(alias = "operation_type")]
    pub operation: String,
    /// Operation-specific key/value configuration, passed through opaquely.
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
    /// Ordinal position used only as a tie-break during sorting, never as
    /// the authoritative order.
    #[serde(default)]
    pub order: i32,
    /// User-chosen identifiers per output port. Ports absent from this map
    /// get a synthesized identifier at assembly time.
    #[serde(default)]
    pub named_outputs: IndexMap<String, String>,
}

impl TaskDefinition {
    pub fn new(id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            operation: operation.into(),
            parameters: serde_json::Map::new(),
            order: 0,
            named_outputs: IndexMap::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_output(mut self, port: impl Into<String>, identifier: impl Into<String>) -> Self {
        self.named_outputs.insert(port.into(), identifier.into());
        self
    }
}

/// Defines a connection between an output port of one task and an input
/// port of another.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowDefinition {
    pub source_id: String,
    pub source_port: String,
    pub target_id: String,
    pub target_port: String,
}

impl FlowDefinition {
    pub fn new(
        source_id: impl Into<String>,
        source_port: impl Into<String>,
        target_id: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            source_port: source_port.into(),
            target_id: target_id.into(),
            target_port: target_port.into(),
        }
    }
}
