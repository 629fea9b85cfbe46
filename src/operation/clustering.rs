//! Clustering estimators and the model-fitting operation.
//!
//! The estimator operations (`kmeans-clustering`, `gaussian-mixture-...`)
//! only emit an unfitted estimator on their `algorithm` port;
//! `clustering-model` fits whatever estimator it is wired to. The direct
//! operations (`agglomerative-clustering`, `dbscan-clustering`) fit and
//! predict in one fragment.

use super::ml::first_attribute;
use super::{
    InputPort, Operation, OperationContext, OperationFactory, OutputPort, PortSpec, ResultKind,
};
use crate::error::OperationError;

/// Emits a K-Means (or Mini-Batch K-Means) estimator.
pub struct KMeansClustering {
    output: String,
    n_clusters: i64,
    max_iter: i64,
    init_mode: String,
    tolerance: f64,
    seed: String,
    mini_batch: bool,
}

pub struct KMeansClusteringFactory;

impl OperationFactory for KMeansClusteringFactory {
    fn operation_type(&self) -> &str {
        "kmeans-clustering"
    }

    fn ports(&self) -> PortSpec {
        PortSpec {
            inputs: vec![],
            outputs: vec![OutputPort::required("algorithm")],
        }
    }

    fn build(&self, ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError> {
        let kind = ctx.param_str("type", "K-Means");
        let seed = match ctx.parameters.get("seed").and_then(|v| v.as_i64()) {
            Some(seed) => seed.to_string(),
            None => "None".to_string(),
        };
        Ok(Box::new(KMeansClustering {
            output: ctx.output("algorithm")?.to_string(),
            n_clusters: ctx.positive_i64("n_clusters", 8)?,
            max_iter: ctx.positive_i64("max_iter", 300)?,
            init_mode: ctx.param_str("init", "K-Means++").to_lowercase(),
            tolerance: ctx.abs_f64("tolerance", 0.001),
            seed,
            mini_batch: !kind.eq_ignore_ascii_case("k-means"),
        }))
    }
}

impl Operation for KMeansClustering {
    fn imports(&self) -> Vec<&'static str> {
        if self.mini_batch {
            vec!["from sklearn.cluster import MiniBatchKMeans"]
        } else {
            vec!["from sklearn.cluster import KMeans"]
        }
    }

    fn generate_code(&self) -> Result<String, OperationError> {
        let estimator = if self.mini_batch {
            "MiniBatchKMeans"
        } else {
            "KMeans"
        };
        Ok(format!(
            "{output} = {estimator}(n_clusters={k}, init='{init}',
    max_iter={max_iter}, tol={tol}, random_state={seed})",
            output = self.output,
            estimator = estimator,
            k = self.n_clusters,
            init = self.init_mode,
            max_iter = self.max_iter,
            tol = self.tolerance,
            seed = self.seed
        ))
    }
}

/// Emits a Gaussian mixture estimator.
pub struct GaussianMixtureClustering {
    output: String,
    number_of_clusters: i64,
    max_iterations: i64,
    tolerance: f64,
}

pub struct GaussianMixtureClusteringFactory;

impl OperationFactory for GaussianMixtureClusteringFactory {
    fn operation_type(&self) -> &str {
        "gaussian-mixture-clustering"
    }

    fn ports(&self) -> PortSpec {
        PortSpec {
            inputs: vec![],
            outputs: vec![OutputPort::required("algorithm")],
        }
    }

    fn build(&self, ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError> {
        Ok(Box::new(GaussianMixtureClustering {
            output: ctx.output("algorithm")?.to_string(),
            number_of_clusters: ctx.positive_i64("number_of_clusters", 1)?,
            max_iterations: ctx.positive_i64("max_iterations", 100)?,
            tolerance: ctx.abs_f64("tolerance", 0.001),
        }))
    }
}

impl Operation for GaussianMixtureClustering {
    fn imports(&self) -> Vec<&'static str> {
        vec!["from sklearn.mixture import GaussianMixture"]
    }

    fn generate_code(&self) -> Result<String, OperationError> {
        Ok(format!(
            "{output} = GaussianMixture(n_components={k}, max_iter={iter}, tol={tol})",
            output = self.output,
            k = self.number_of_clusters,
            iter = self.max_iterations,
            tol = self.tolerance
        ))
    }
}

/// Agglomerative clustering applied directly to a dataframe.
pub struct AgglomerativeClustering {
    has_code: bool,
    input: String,
    output: String,
    features: String,
    alias: String,
    n_clusters: i64,
    linkage: String,
    affinity: String,
}

pub struct AgglomerativeClusteringFactory;

impl OperationFactory for AgglomerativeClusteringFactory {
    fn operation_type(&self) -> &str {
        "agglomerative-clustering"
    }

    fn ports(&self) -> PortSpec {
        PortSpec {
            inputs: vec![InputPort::single("input data")],
            outputs: vec![OutputPort::required("output data")],
        }
    }

    fn build(&self, ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError> {
        Ok(Box::new(AgglomerativeClustering {
            has_code: ctx.input("input data").is_some(),
            input: ctx.require_input("input data")?.to_string(),
            output: ctx.output("output data")?.to_string(),
            features: first_attribute(&ctx, "attributes")?,
            alias: ctx.param_str("alias", "cluster"),
            n_clusters: ctx.positive_i64("number_of_clusters", 2)?,
            linkage: ctx.param_str("linkage", "ward"),
            affinity: ctx.param_str("affinity", "euclidean"),
        }))
    }
}

impl Operation for AgglomerativeClustering {
    fn has_code(&self) -> bool {
        self.has_code
    }

    fn imports(&self) -> Vec<&'static str> {
        vec!["from sklearn.cluster import AgglomerativeClustering"]
    }

    fn generate_code(&self) -> Result<String, OperationError> {
        Ok(format!(
            "{output} = {input}.copy()

X = {output}['{features}'].values.tolist()
clt = AgglomerativeClustering(n_clusters={n_clusters},
    linkage='{linkage}', affinity='{affinity}')
{output}['{alias}'] = clt.fit_predict(X)",
            output = self.output,
            input = self.input,
            features = self.features,
            n_clusters = self.n_clusters,
            linkage = self.linkage,
            affinity = self.affinity,
            alias = self.alias
        ))
    }
}

/// Density-based clustering applied directly to a dataframe.
pub struct DbscanClustering {
    has_code: bool,
    input: String,
    output: String,
    features: String,
    alias: String,
    eps: f64,
    min_samples: i64,
}

pub struct DbscanClusteringFactory;

impl OperationFactory for DbscanClusteringFactory {
    fn operation_type(&self) -> &str {
        "dbscan-clustering"
    }

    fn ports(&self) -> PortSpec {
        PortSpec {
            inputs: vec![InputPort::single("input data")],
            outputs: vec![OutputPort::required("output data")],
        }
    }

    fn build(&self, ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError> {
        Ok(Box::new(DbscanClustering {
            has_code: ctx.input("input data").is_some(),
            input: ctx.require_input("input data")?.to_string(),
            output: ctx.output("output data")?.to_string(),
            features: first_attribute(&ctx, "attributes")?,
            alias: ctx.param_str("alias", "cluster"),
            eps: ctx.positive_f64("eps", 0.5)?,
            min_samples: ctx.positive_i64("min_samples", 5)?,
        }))
    }
}

impl Operation for DbscanClustering {
    fn has_code(&self) -> bool {
        self.has_code
    }

    fn imports(&self) -> Vec<&'static str> {
        vec!["from sklearn.cluster import DBSCAN"]
    }

    fn generate_code(&self) -> Result<String, OperationError> {
        Ok(format!(
            "{output} = {input}.copy()

X = {output}['{features}'].values.tolist()
clt = DBSCAN(eps={eps}, min_samples={min_samples})
{output}['{alias}'] = clt.fit_predict(X)",
            output = self.output,
            input = self.input,
            features = self.features,
            eps = self.eps,
            min_samples = self.min_samples,
            alias = self.alias
        ))
    }
}

/// Fits an upstream estimator to training data, producing a model and,
/// when the `output data` port is wired, the transformed frame.
pub struct ClusteringModel {
    has_code: bool,
    input: String,
    algorithm: String,
    model: String,
    output: String,
    features: String,
    alias: String,
    perform_transformation: bool,
}

pub struct ClusteringModelFactory;

impl OperationFactory for ClusteringModelFactory {
    fn operation_type(&self) -> &str {
        "clustering-model"
    }

    fn ports(&self) -> PortSpec {
        PortSpec {
            inputs: vec![
                InputPort::single("train input data"),
                InputPort::single("algorithm"),
            ],
            outputs: vec![
                OutputPort::optional("output data"),
                OutputPort::optional("model"),
            ],
        }
    }

    fn result_kind(&self) -> Option<ResultKind> {
        Some(ResultKind::Model)
    }

    fn build(&self, ctx: OperationContext<'_>) -> Result<Box<dyn Operation>, OperationError> {
        Ok(Box::new(ClusteringModel {
            has_code: ctx.input_count() == 2,
            input: ctx.require_input("train input data")?.to_string(),
            algorithm: ctx.require_input("algorithm")?.to_string(),
            model: ctx.output("model")?.to_string(),
            output: ctx.output("output data")?.to_string(),
            features: first_attribute(&ctx, "features")?,
            alias: ctx.param_str("prediction", "prediction"),
            perform_transformation: ctx.output_connected("output data"),
        }))
    }
}

impl Operation for ClusteringModel {
    fn has_code(&self) -> bool {
        self.has_code
    }

    fn generate_code(&self) -> Result<String, OperationError> {
        let mut code = format!(
            "X = {input}['{features}'].values.tolist()
{model} = {algorithm}.fit(X)",
            input = self.input,
            features = self.features,
            model = self.model,
            algorithm = self.algorithm
        );
        if self.perform_transformation {
            code.push_str(&format!(
                "
y = {algorithm}.predict(X)
{output} = {input}.copy()
{output}['{alias}'] = y",
                algorithm = self.algorithm,
                output = self.output,
                input = self.input,
                alias = self.alias
            ));
        } else {
            code.push_str(&format!("\n{output} = None", output = self.output));
        }
        Ok(code)
    }
}
