//! Reporting sinks. These have no output ports; they are emitted because
//! their effect is directly observable, not because anything consumes them.

use super::{
    ExecutionFacts, InputPort, Operation, OperationContext, OperationFactory, PortSpec, ResultKind,
};
use crate::error::OperationError;

/// Prints a dataframe as a textual table.
pub struct TableReport {
    has_code: bool,
    input: String,
    title: String,
}

pub struct TableReportFactory;

impl OperationFactory for TableReportFactory {
    fn operation_type(&self) -> &str {
        "table-report"
    }

    fn ports(&self) -> PortSpec {
        PortSpec {
            inputs: vec![InputPort::single("input data")],
            outputs: vec![],
        }
    }

    fn result_kind(&self) -> Option<ResultKind> {
        Some(ResultKind::Visualization)
    }

    fn build(&self, ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError> {
        Ok(Box::new(TableReport {
            has_code: ctx.input("input data").is_some(),
            input: ctx.require_input("input data")?.to_string(),
            title: ctx.param_str("title", "Table"),
        }))
    }
}

impl Operation for TableReport {
    fn has_code(&self) -> bool {
        self.has_code
    }

    fn must_be_executed(&self, _facts: &ExecutionFacts) -> bool {
        true
    }

    fn generate_code(&self) -> Result<String, OperationError> {
        Ok(format!(
            "print('=== {title} ===')
print({input}.to_string())",
            title = self.title,
            input = self.input
        ))
    }
}
