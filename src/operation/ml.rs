//! Feature engineering and model application operations.

use super::{InputPort, Operation, OperationContext, OperationFactory, OutputPort, PortSpec};
use crate::error::OperationError;

/// Merges multiple attributes into a single list-valued feature column.
pub struct FeatureAssembler {
    has_code: bool,
    input: String,
    output: String,
    attributes: Vec<String>,
    alias: String,
}

pub struct FeatureAssemblerFactory;

impl OperationFactory for FeatureAssemblerFactory {
    fn operation_type(&self) -> &str {
        "feature-assembler"
    }

    fn ports(&self) -> PortSpec {
        PortSpec {
            inputs: vec![InputPort::single("input data")],
            outputs: vec![OutputPort::required("output data")],
        }
    }

    fn build(&self, ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError> {
        Ok(Box::new(FeatureAssembler {
            has_code: ctx.input("input data").is_some(),
            input: ctx.require_input("input data")?.to_string(),
            output: ctx.output("output data")?.to_string(),
            attributes: ctx.require_str_list("attributes")?,
            alias: ctx.param_str("alias", "features"),
        }))
    }
}

impl Operation for FeatureAssembler {
    fn has_code(&self) -> bool {
        self.has_code
    }

    fn generate_code(&self) -> Result<String, OperationError> {
        Ok(format!(
            "cols = {cols}
{output} = {input}.dropna(subset=cols)
{output}['{alias}'] = {output}[cols].values.tolist()",
            cols = super::python_list(&self.attributes),
            output = self.output,
            input = self.input,
            alias = self.alias
        ))
    }
}

/// Applies a previously fitted model to a dataframe, appending a prediction
/// column.
pub struct ApplyModel {
    has_code: bool,
    input: String,
    model: String,
    output: String,
    features: String,
    alias: String,
}

pub struct ApplyModelFactory;

impl OperationFactory for ApplyModelFactory {
    fn operation_type(&self) -> &str {
        "apply-model"
    }

    fn ports(&self) -> PortSpec {
        PortSpec {
            inputs: vec![InputPort::single("input data"), InputPort::single("model")],
            outputs: vec![OutputPort::required("output data")],
        }
    }

    fn build(&self, ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError> {
        Ok(Box::new(ApplyModel {
            has_code: ctx.input_count() == 2,
            input: ctx.require_input("input data")?.to_string(),
            model: ctx.require_input("model")?.to_string(),
            output: ctx.output("output data")?.to_string(),
            features: first_attribute(&ctx, "features")?,
            alias: ctx.param_str("prediction", "prediction"),
        }))
    }
}

impl Operation for ApplyModel {
    fn has_code(&self) -> bool {
        self.has_code
    }

    fn generate_code(&self) -> Result<String, OperationError> {
        Ok(format!(
            "X = {input}['{features}'].values.tolist()
{output} = {input}.copy()
{output}['{alias}'] = {model}.predict(X)",
            input = self.input,
            features = self.features,
            output = self.output,
            alias = self.alias,
            model = self.model
        ))
    }
}

const METRIC_TO_SCORER: &[(&str, &str)] = &[
    ("accuracy", "metrics.accuracy_score"),
    ("f1", "metrics.f1_score"),
    ("precision", "metrics.precision_score"),
    ("recall", "metrics.recall_score"),
];

/// Scores a prediction column against a label column with a named metric.
pub struct EvaluateModel {
    has_code: bool,
    input: String,
    output: String,
    scorer: &'static str,
    label: String,
    prediction: String,
}

pub struct EvaluateModelFactory;

impl OperationFactory for EvaluateModelFactory {
    fn operation_type(&self) -> &str {
        "evaluate-model"
    }

    fn ports(&self) -> PortSpec {
        PortSpec {
            inputs: vec![InputPort::single("input data")],
            outputs: vec![OutputPort::optional("metric")],
        }
    }

    fn build(&self, ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError> {
        let metric = ctx.require_str("metric")?;
        let scorer = METRIC_TO_SCORER
            .iter()
            .find(|(name, _)| *name == metric)
            .map(|(_, scorer)| *scorer)
            .ok_or_else(|| OperationError::InvalidParameter {
                name: "metric".to_string(),
                message: format!("unknown metric '{metric}'"),
            })?;
        Ok(Box::new(EvaluateModel {
            has_code: ctx.input("input data").is_some(),
            input: ctx.require_input("input data")?.to_string(),
            output: ctx.output("metric")?.to_string(),
            scorer,
            label: ctx.param_str("label_attribute", "label"),
            prediction: ctx.param_str("prediction_attribute", "prediction"),
        }))
    }
}

impl Operation for EvaluateModel {
    fn has_code(&self) -> bool {
        self.has_code
    }

    fn imports(&self) -> Vec<&'static str> {
        vec!["from sklearn import metrics"]
    }

    fn generate_code(&self) -> Result<String, OperationError> {
        Ok(format!(
            "{output} = {scorer}({input}['{label}'], {input}['{prediction}'])",
            output = self.output,
            scorer = self.scorer,
            input = self.input,
            label = self.label,
            prediction = self.prediction
        ))
    }
}

/// The first entry of a list-valued attribute parameter.
pub(super) fn first_attribute(
    ctx: &OperationContext<'_>,
    name: &str,
) -> Result<String, OperationError> {
    ctx.require_str_list(name)?
        .into_iter()
        .next()
        .ok_or_else(|| OperationError::InvalidParameter {
            name: name.to_string(),
            message: "expected at least one attribute name".to_string(),
        })
}
