//! Data ingestion and frame-shaping operations.

use super::{InputPort, Operation, OperationContext, OperationFactory, OutputPort, PortSpec};
use crate::error::OperationError;
use itertools::Itertools;

/// Reads a tabular dataset into a dataframe. The `data_source` parameter is
/// an opaque path or URL; relative paths are joined onto the configured
/// storage base.
pub struct DataReader {
    output: String,
    path: String,
    separator: String,
}

pub struct DataReaderFactory;

impl OperationFactory for DataReaderFactory {
    fn operation_type(&self) -> &str {
        "data-reader"
    }

    fn ports(&self) -> PortSpec {
        PortSpec {
            inputs: vec![],
            outputs: vec![OutputPort::required("output data")],
        }
    }

    fn build(&self, ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError> {
        let source = ctx.require_str("data_source")?;
        let path = match &ctx.config.storage_base_url {
            Some(base) if !source.contains("://") && !source.starts_with('/') => {
                format!("{}/{}", base.trim_end_matches('/'), source)
            }
            _ => source,
        };
        Ok(Box::new(DataReader {
            output: ctx.output("output data")?.to_string(),
            path,
            separator: ctx.param_str("separator", ","),
        }))
    }
}

impl Operation for DataReader {
    fn imports(&self) -> Vec<&'static str> {
        vec!["import pandas as pd"]
    }

    fn generate_code(&self) -> Result<String, OperationError> {
        Ok(format!(
            "{output} = pd.read_csv('{path}', sep='{sep}')",
            output = self.output,
            path = self.path,
            sep = self.separator
        ))
    }
}

/// Projects a dataframe onto a subset of its attributes.
pub struct Select {
    has_code: bool,
    input: String,
    output: String,
    attributes: Vec<String>,
}

pub struct SelectFactory;

impl OperationFactory for SelectFactory {
    fn operation_type(&self) -> &str {
        "select"
    }

    fn ports(&self) -> PortSpec {
        PortSpec {
            inputs: vec![InputPort::single("input data")],
            outputs: vec![OutputPort::required("output data")],
        }
    }

    fn build(&self, ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError> {
        Ok(Box::new(Select {
            has_code: ctx.input("input data").is_some(),
            input: ctx.require_input("input data")?.to_string(),
            output: ctx.output("output data")?.to_string(),
            attributes: ctx.require_str_list("attributes")?,
        }))
    }
}

impl Operation for Select {
    fn has_code(&self) -> bool {
        self.has_code
    }

    fn generate_code(&self) -> Result<String, OperationError> {
        Ok(format!(
            "{output} = {input}[{cols}]",
            output = self.output,
            input = self.input,
            cols = super::python_list(&self.attributes)
        ))
    }
}

/// Concatenates any number of upstream dataframes into one.
pub struct Union {
    inputs: Vec<String>,
    output: String,
}

pub struct UnionFactory;

impl OperationFactory for UnionFactory {
    fn operation_type(&self) -> &str {
        "union"
    }

    fn ports(&self) -> PortSpec {
        PortSpec {
            inputs: vec![InputPort::multiple("input data")],
            outputs: vec![OutputPort::required("output data")],
        }
    }

    fn build(&self, ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError> {
        let inputs = ctx.inputs("input data").to_vec();
        if inputs.is_empty() {
            return Err(OperationError::MissingParameter {
                name: "input data".to_string(),
            });
        }
        Ok(Box::new(Union {
            inputs,
            output: ctx.output("output data")?.to_string(),
        }))
    }
}

impl Operation for Union {
    fn imports(&self) -> Vec<&'static str> {
        vec!["import pandas as pd"]
    }

    fn generate_code(&self) -> Result<String, OperationError> {
        Ok(format!(
            "{output} = pd.concat([{inputs}], sort=False, ignore_index=True)",
            output = self.output,
            inputs = self.inputs.iter().join(", ")
        ))
    }
}

/// Null operation: participates in ordering but emits nothing.
pub struct NoOp;

pub struct NoOpFactory;

impl OperationFactory for NoOpFactory {
    fn operation_type(&self) -> &str {
        "no-op"
    }

    fn ports(&self) -> PortSpec {
        PortSpec {
            inputs: vec![InputPort::optional("input data")],
            outputs: vec![],
        }
    }

    fn build(&self, _ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError> {
        Ok(Box::new(NoOp))
    }
}

impl Operation for NoOp {
    fn has_code(&self) -> bool {
        false
    }

    fn generate_code(&self) -> Result<String, OperationError> {
        Ok(String::new())
    }
}
