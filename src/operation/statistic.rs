//! Statistic operations.

use super::{InputPort, Operation, OperationContext, OperationFactory, OutputPort, PortSpec};
use crate::error::OperationError;

/// Calculates the correlation of two columns of a dataframe as a double
/// value.
pub struct PearsonCorrelation {
    has_code: bool,
    input: String,
    output: String,
    first: String,
    second: String,
}

pub struct PearsonCorrelationFactory;

impl OperationFactory for PearsonCorrelationFactory {
    fn operation_type(&self) -> &str {
        "pearson-correlation"
    }

    fn ports(&self) -> PortSpec {
        PortSpec {
            inputs: vec![InputPort::single("input data")],
            outputs: vec![OutputPort::optional("correlation")],
        }
    }

    fn build(&self, ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError> {
        let attributes = ctx.require_str_list("attributes")?;
        let [first, second]: [String; 2] =
            attributes
                .try_into()
                .map_err(|_| OperationError::InvalidParameter {
                    name: "attributes".to_string(),
                    message: "exactly two attribute names are required".to_string(),
                })?;
        Ok(Box::new(PearsonCorrelation {
            has_code: ctx.input("input data").is_some(),
            input: ctx.require_input("input data")?.to_string(),
            output: ctx.output("correlation")?.to_string(),
            first,
            second,
        }))
    }
}

impl Operation for PearsonCorrelation {
    fn has_code(&self) -> bool {
        self.has_code
    }

    fn generate_code(&self) -> Result<String, OperationError> {
        Ok(format!(
            "{output} = {input}['{first}'].corr({input}['{second}'])",
            output = self.output,
            input = self.input,
            first = self.first,
            second = self.second
        ))
    }
}
