//! The pluggable operation contract and the built-in catalog.
//!
//! Every task in a workflow delegates to one [`Operation`] instance. The
//! compiler never inspects the body of [`Operation::generate_code`]; it only
//! sequences calls to it in topological order and concatenates the results.
//! Concrete operations are selected through an [`OperationFactory`] registry
//! keyed by operation-type tag, which also declares each operation's ports.

use crate::compiler::CompilerConfig;
use crate::error::OperationError;
use ahash::AHashMap;
use indexmap::IndexMap;
use itertools::Itertools;

pub mod clustering;
pub mod etl;
pub mod ml;
pub mod report;
pub mod statistic;

/// How many connections a port accepts or produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one connection.
    Single,
    /// One or more connections.
    Multiple,
}

/// An externally observable artifact kind produced by an operation.
///
/// A task producing one of these is a legitimate terminal sink: it may have
/// zero consumers and still be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Model,
    Visualization,
}

/// A declared input connection point on an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPort {
    pub name: &'static str,
    pub arity: Arity,
    /// Whether assembly must fail when this port has no binding.
    pub required: bool,
}

/// A declared output connection point on an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPort {
    pub name: &'static str,
    /// Whether at least one consumer is expected for the task's effect to be
    /// observable.
    pub required: bool,
}

/// The full port declaration of an operation, interpreted by the graph
/// builder and the structural validator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSpec {
    pub inputs: Vec<InputPort>,
    pub outputs: Vec<OutputPort>,
}

impl PortSpec {
    pub fn input(&self, name: &str) -> Option<&InputPort> {
        self.inputs.iter().find(|p| p.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputPort> {
        self.outputs.iter().find(|p| p.name == name)
    }
}

impl InputPort {
    pub const fn single(name: &'static str) -> Self {
        Self {
            name,
            arity: Arity::Single,
            required: true,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            arity: Arity::Single,
            required: false,
        }
    }

    pub const fn multiple(name: &'static str) -> Self {
        Self {
            name,
            arity: Arity::Multiple,
            required: true,
        }
    }
}

impl OutputPort {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
        }
    }
}

/// The facts the execution predicate is decided on.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionFacts {
    pub is_satisfied: bool,
    pub ignore_out_degree: bool,
    pub ignore_has_code: bool,
    pub out_degree: usize,
    pub contains_results: bool,
}

/// Decides whether a task must be emitted even without consumers.
///
/// A task is executed when it generates code, is requested, and sits at the
/// end of its chain (or the degree check is waived), or when it displays
/// results directly regardless of everything else.
pub fn execution_required(has_code: bool, facts: &ExecutionFacts) -> bool {
    let consider_degree = facts.out_degree == 0 || facts.ignore_out_degree;
    ((has_code || facts.ignore_has_code) && facts.is_satisfied && consider_degree)
        || facts.contains_results
}

/// Whether a task's parameters request a directly displayed result
/// (`display_sample` / `display_schema` set to `1`, `"1"` or `true`).
pub fn contains_results(parameters: &serde_json::Map<String, serde_json::Value>) -> bool {
    ["display_sample", "display_schema"]
        .iter()
        .any(|key| match parameters.get(*key) {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::Number(n)) => n.as_i64() == Some(1),
            Some(serde_json::Value::String(s)) => s == "1" || s == "true",
            _ => false,
        })
}

/// Everything an operation constructor may read: the task's parameter bag,
/// its resolved port bindings, and the explicit compiler configuration
/// (there is no ambient global state).
pub struct OperationContext<'a> {
    pub task_id: &'a str,
    pub order: i32,
    pub parameters: &'a serde_json::Map<String, serde_json::Value>,
    /// Resolved upstream identifiers per input port, in flow-declaration
    /// order. `multiple`-arity ports may carry more than one entry.
    pub named_inputs: &'a IndexMap<String, Vec<String>>,
    /// Resolved identifiers for every declared output port (user-supplied or
    /// synthesized; always present).
    pub named_outputs: &'a IndexMap<String, String>,
    /// Outbound flow count per output port.
    pub output_degrees: &'a IndexMap<String, usize>,
    pub out_degree: usize,
    pub config: &'a CompilerConfig,
}

impl<'a> OperationContext<'a> {
    /// The first binding of an input port, if any.
    pub fn input(&self, port: &str) -> Option<&str> {
        self.named_inputs
            .get(port)
            .and_then(|idents| idents.first())
            .map(String::as_str)
    }

    /// The first binding of an input port, reported as a missing parameter
    /// when absent (the catalog's convention for unwired inputs).
    pub fn require_input(&self, port: &str) -> Result<&str, OperationError> {
        self.input(port).ok_or_else(|| OperationError::MissingParameter {
            name: port.to_string(),
        })
    }

    /// All bindings of an input port, in flow-declaration order.
    pub fn inputs(&self, port: &str) -> &[String] {
        self.named_inputs.get(port).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn input_count(&self) -> usize {
        self.named_inputs.values().map(Vec::len).sum()
    }

    /// The resolved identifier of an output port. Every declared output is
    /// resolved before construction, so a miss means the port name is not
    /// declared by this operation.
    pub fn output(&self, port: &str) -> Result<&str, OperationError> {
        self.named_outputs
            .get(port)
            .map(String::as_str)
            .ok_or_else(|| OperationError::InvalidParameter {
                name: port.to_string(),
                message: "not a declared output port".to_string(),
            })
    }

    /// Whether an output port feeds at least one consumer.
    pub fn output_connected(&self, port: &str) -> bool {
        self.output_degrees.get(port).copied().unwrap_or(0) > 0
    }

    pub fn require_param(&self, name: &str) -> Result<&serde_json::Value, OperationError> {
        self.parameters
            .get(name)
            .filter(|v| !v.is_null())
            .ok_or_else(|| OperationError::MissingParameter {
                name: name.to_string(),
            })
    }

    /// A required list-of-strings parameter (e.g. attribute selections).
    pub fn require_str_list(&self, name: &str) -> Result<Vec<String>, OperationError> {
        let value = self.require_param(name)?;
        match value {
            serde_json::Value::Array(items) => items
                .iter()
                .map(|v| {
                    v.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| OperationError::InvalidParameter {
                            name: name.to_string(),
                            message: "expected a list of attribute names".to_string(),
                        })
                })
                .collect(),
            serde_json::Value::String(s) => Ok(vec![s.clone()]),
            _ => Err(OperationError::InvalidParameter {
                name: name.to_string(),
                message: "expected a list of attribute names".to_string(),
            }),
        }
    }

    pub fn require_str(&self, name: &str) -> Result<String, OperationError> {
        self.require_param(name)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| OperationError::InvalidParameter {
                name: name.to_string(),
                message: "expected a string".to_string(),
            })
    }

    /// A string parameter with a default for absent or empty values.
    pub fn param_str(&self, name: &str, default: &str) -> String {
        match self.parameters.get(name).and_then(|v| v.as_str()) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => default.to_string(),
        }
    }

    /// An integer parameter with a default, rejected unless strictly
    /// positive.
    pub fn positive_i64(&self, name: &str, default: i64) -> Result<i64, OperationError> {
        let value = match self.parameters.get(name) {
            Some(v) if !v.is_null() => {
                v.as_i64().ok_or_else(|| OperationError::InvalidParameter {
                    name: name.to_string(),
                    message: "expected an integer".to_string(),
                })?
            }
            _ => default,
        };
        if value <= 0 {
            return Err(OperationError::InvalidParameter {
                name: name.to_string(),
                message: format!("must be x>0, got {value}"),
            });
        }
        Ok(value)
    }

    /// A float parameter with a default, rejected unless strictly positive.
    pub fn positive_f64(&self, name: &str, default: f64) -> Result<f64, OperationError> {
        let value = match self.parameters.get(name) {
            Some(v) if !v.is_null() => {
                v.as_f64().ok_or_else(|| OperationError::InvalidParameter {
                    name: name.to_string(),
                    message: "expected a number".to_string(),
                })?
            }
            _ => default,
        };
        if value <= 0.0 {
            return Err(OperationError::InvalidParameter {
                name: name.to_string(),
                message: format!("must be x>0, got {value}"),
            });
        }
        Ok(value)
    }

    /// A float parameter with a default, taken as an absolute value.
    pub fn abs_f64(&self, name: &str, default: f64) -> f64 {
        self.parameters
            .get(name)
            .and_then(|v| v.as_f64())
            .unwrap_or(default)
            .abs()
    }
}

/// A constructed, per-task operation instance.
pub trait Operation: Send + Sync {
    /// Whether this task contributes emitted code. Pass-through tasks return
    /// `false` and participate in ordering only.
    fn has_code(&self) -> bool {
        true
    }

    /// Whether a task with zero consumers must still be emitted because it
    /// produces an externally observable artifact.
    fn must_be_executed(&self, facts: &ExecutionFacts) -> bool {
        execution_required(self.has_code(), facts)
    }

    /// Import lines the generated fragment depends on, collected into the
    /// program header.
    fn imports(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Produces the code fragment for this task.
    fn generate_code(&self) -> Result<String, OperationError>;
}

/// Defines the contract for instantiating a specific operation type.
pub trait OperationFactory: Send + Sync {
    /// The tag this factory is registered under.
    fn operation_type(&self) -> &str;

    /// The ports every task of this type declares.
    fn ports(&self) -> PortSpec;

    /// The observable artifact kind this operation produces, if any.
    fn result_kind(&self) -> Option<ResultKind> {
        None
    }

    fn build(&self, ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError>;
}

/// A registry preloaded with every built-in operation, for callers driving
/// the build/validate/sort/assemble stages individually.
pub fn default_registry() -> AHashMap<String, Box<dyn OperationFactory>> {
    let mut registry = AHashMap::new();
    register_default_factories(&mut registry);
    registry
}

/// Registers every built-in operation under its canonical tag.
pub(crate) fn register_default_factories(
    registry: &mut AHashMap<String, Box<dyn OperationFactory>>,
) {
    for factory in default_factories() {
        registry.insert(factory.operation_type().to_string(), factory);
    }
}

/// Creates a built-in factory by its canonical tag, for aliasing a
/// user-specific tag onto a built-in operation.
pub(crate) fn create_factory_by_name(name: &str) -> Option<Box<dyn OperationFactory>> {
    default_factories()
        .into_iter()
        .find(|f| f.operation_type() == name)
}

/// Renders attribute names as a Python list literal.
pub(crate) fn python_list(items: &[String]) -> String {
    format!("[{}]", items.iter().map(|item| format!("'{item}'")).join(", "))
}

fn default_factories() -> Vec<Box<dyn OperationFactory>> {
    vec![
        Box::new(etl::DataReaderFactory),
        Box::new(etl::SelectFactory),
        Box::new(etl::UnionFactory),
        Box::new(etl::NoOpFactory),
        Box::new(ml::FeatureAssemblerFactory),
        Box::new(ml::ApplyModelFactory),
        Box::new(ml::EvaluateModelFactory),
        Box::new(clustering::KMeansClusteringFactory),
        Box::new(clustering::GaussianMixtureClusteringFactory),
        Box::new(clustering::AgglomerativeClusteringFactory),
        Box::new(clustering::DbscanClusteringFactory),
        Box::new(clustering::ClusteringModelFactory),
        Box::new(statistic::PearsonCorrelationFactory),
        Box::new(report::TableReportFactory),
    ]
}
