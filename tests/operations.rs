//! Tests for the built-in operation catalog: construction, parameter
//! validation and generated fragments.
use garapa::operation::clustering::{
    ClusteringModelFactory, DbscanClusteringFactory, GaussianMixtureClusteringFactory,
    KMeansClusteringFactory,
};
use garapa::operation::etl::{DataReaderFactory, NoOpFactory, SelectFactory, UnionFactory};
use garapa::operation::ml::{ApplyModelFactory, EvaluateModelFactory, FeatureAssemblerFactory};
use garapa::operation::report::TableReportFactory;
use garapa::operation::statistic::PearsonCorrelationFactory;
use garapa::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

/// Builds `OperationContext` values the way the assembler does, without a
/// full workflow around them.
struct Fixture {
    parameters: serde_json::Map<String, serde_json::Value>,
    named_inputs: IndexMap<String, Vec<String>>,
    named_outputs: IndexMap<String, String>,
    output_degrees: IndexMap<String, usize>,
    config: CompilerConfig,
}

impl Fixture {
    fn new() -> Self {
        Self {
            parameters: serde_json::Map::new(),
            named_inputs: IndexMap::new(),
            named_outputs: IndexMap::new(),
            output_degrees: IndexMap::new(),
            config: CompilerConfig::default(),
        }
    }

    fn param(mut self, name: &str, value: serde_json::Value) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }

    fn input(mut self, port: &str, identifier: &str) -> Self {
        self.named_inputs
            .entry(port.to_string())
            .or_default()
            .push(identifier.to_string());
        self
    }

    fn output(mut self, port: &str, identifier: &str) -> Self {
        self.named_outputs
            .insert(port.to_string(), identifier.to_string());
        self
    }

    fn connected(mut self, port: &str) -> Self {
        self.output_degrees.insert(port.to_string(), 1);
        self
    }

    fn ctx(&self) -> OperationContext<'_> {
        OperationContext {
            task_id: "task",
            order: 1,
            parameters: &self.parameters,
            named_inputs: &self.named_inputs,
            named_outputs: &self.named_outputs,
            output_degrees: &self.output_degrees,
            out_degree: self.output_degrees.values().sum(),
            config: &self.config,
        }
    }

    fn build(
        &self,
        factory: &dyn OperationFactory,
    ) -> std::result::Result<Box<dyn Operation>, OperationError> {
        factory.build(self.ctx())
    }

    fn generate(&self, factory: &dyn OperationFactory) -> String {
        self.build(factory)
            .expect("Failed to build operation")
            .generate_code()
            .expect("Failed to generate code")
    }
}

#[test]
fn test_data_reader_success() {
    let fixture = Fixture::new()
        .param("data_source", json!("iris.csv"))
        .output("output data", "df");
    let code = fixture.generate(&DataReaderFactory);
    assert_eq!(code, "df = pd.read_csv('iris.csv', sep=',')");
}

#[test]
fn test_data_reader_joins_storage_base() {
    let mut fixture = Fixture::new()
        .param("data_source", json!("datasets/iris.csv"))
        .output("output data", "df");
    fixture.config.storage_base_url = Some("hdfs://storage:9000/".to_string());
    let code = fixture.generate(&DataReaderFactory);
    assert!(code.contains("'hdfs://storage:9000/datasets/iris.csv'"));
}

#[test]
fn test_data_reader_keeps_absolute_sources() {
    let mut fixture = Fixture::new()
        .param("data_source", json!("s3://bucket/iris.csv"))
        .output("output data", "df");
    fixture.config.storage_base_url = Some("hdfs://storage:9000".to_string());
    let code = fixture.generate(&DataReaderFactory);
    assert!(code.contains("'s3://bucket/iris.csv'"));
}

#[test]
fn test_data_reader_missing_source_failure() {
    let fixture = Fixture::new().output("output data", "df");
    let err = fixture
        .build(&DataReaderFactory)
        .err()
        .expect("expected an error");
    assert_eq!(
        err,
        OperationError::MissingParameter {
            name: "data_source".to_string(),
        }
    );
}

#[test]
fn test_select_success() {
    let fixture = Fixture::new()
        .param("attributes", json!(["sepallength", "sepalwidth"]))
        .input("input data", "df")
        .output("output data", "out");
    let code = fixture.generate(&SelectFactory);
    assert_eq!(code, "out = df[['sepallength', 'sepalwidth']]");
}

#[test]
fn test_union_joins_all_inputs() {
    let fixture = Fixture::new()
        .input("input data", "df1")
        .input("input data", "df2")
        .input("input data", "df3")
        .output("output data", "out");
    let code = fixture.generate(&UnionFactory);
    assert_eq!(
        code,
        "out = pd.concat([df1, df2, df3], sort=False, ignore_index=True)"
    );
}

#[test]
fn test_noop_has_no_code() {
    let fixture = Fixture::new();
    let op = fixture.build(&NoOpFactory).expect("Failed to build");
    assert!(!op.has_code());
    assert_eq!(op.generate_code().expect("Failed to generate"), "");
}

#[test]
fn test_feature_assembler_success() {
    let fixture = Fixture::new()
        .param("attributes", json!(["sepallength", "petallength"]))
        .input("input data", "df")
        .output("output data", "out");
    let code = fixture.generate(&FeatureAssemblerFactory);
    assert!(code.contains("cols = ['sepallength', 'petallength']"));
    assert!(code.contains("out = df.dropna(subset=cols)"));
    assert!(code.contains("out['features'] = out[cols].values.tolist()"));
}

#[test]
fn test_apply_model_success() {
    let fixture = Fixture::new()
        .param("features", json!(["features"]))
        .input("input data", "df")
        .input("model", "model_1")
        .output("output data", "out");
    let code = fixture.generate(&ApplyModelFactory);
    assert!(code.contains("X = df['features'].values.tolist()"));
    assert!(code.contains("out['prediction'] = model_1.predict(X)"));
}

#[test]
fn test_evaluate_model_success() {
    let fixture = Fixture::new()
        .param("metric", json!("accuracy"))
        .input("input data", "df")
        .output("metric", "score");
    let op = fixture.build(&EvaluateModelFactory).expect("Failed to build");
    assert_eq!(op.imports(), vec!["from sklearn import metrics"]);
    assert_eq!(
        op.generate_code().expect("Failed to generate"),
        "score = metrics.accuracy_score(df['label'], df['prediction'])"
    );
}

#[test]
fn test_evaluate_model_unknown_metric_failure() {
    let fixture = Fixture::new()
        .param("metric", json!("brier"))
        .input("input data", "df")
        .output("metric", "score");
    let err = fixture
        .build(&EvaluateModelFactory)
        .err()
        .expect("expected an error");
    assert!(matches!(
        err,
        OperationError::InvalidParameter { name, .. } if name == "metric"
    ));
}

#[test]
fn test_kmeans_defaults() {
    let fixture = Fixture::new().output("algorithm", "clustering_algorithm_1");
    let op = fixture
        .build(&KMeansClusteringFactory)
        .expect("Failed to build");
    assert_eq!(op.imports(), vec!["from sklearn.cluster import KMeans"]);

    let code = op.generate_code().expect("Failed to generate");
    assert!(code.contains("clustering_algorithm_1 = KMeans(n_clusters=8, init='k-means++',"));
    assert!(code.contains("max_iter=300, tol=0.001, random_state=None)"));
}

#[test]
fn test_kmeans_mini_batch_variant() {
    let fixture = Fixture::new()
        .param("type", json!("Mini-Batch K-Means"))
        .param("seed", json!(42))
        .output("algorithm", "algo");
    let op = fixture
        .build(&KMeansClusteringFactory)
        .expect("Failed to build");
    assert_eq!(
        op.imports(),
        vec!["from sklearn.cluster import MiniBatchKMeans"]
    );

    let code = op.generate_code().expect("Failed to generate");
    assert!(code.contains("algo = MiniBatchKMeans(n_clusters=8,"));
    assert!(code.contains("random_state=42)"));
}

#[test]
fn test_kmeans_rejects_nonpositive_clusters() {
    let fixture = Fixture::new()
        .param("n_clusters", json!(0))
        .output("algorithm", "algo");
    let err = fixture
        .build(&KMeansClusteringFactory)
        .err()
        .expect("expected an error");
    assert!(matches!(
        err,
        OperationError::InvalidParameter { name, .. } if name == "n_clusters"
    ));
}

#[test]
fn test_gaussian_mixture_success() {
    let fixture = Fixture::new()
        .param("number_of_clusters", json!(4))
        .output("algorithm", "algo");
    let code = fixture.generate(&GaussianMixtureClusteringFactory);
    assert_eq!(
        code,
        "algo = GaussianMixture(n_components=4, max_iter=100, tol=0.001)"
    );
}

#[test]
fn test_dbscan_rejects_nonpositive_eps() {
    let fixture = Fixture::new()
        .param("eps", json!(-0.5))
        .param("attributes", json!(["features"]))
        .input("input data", "df")
        .output("output data", "out");
    let err = fixture
        .build(&DbscanClusteringFactory)
        .err()
        .expect("expected an error");
    assert!(matches!(
        err,
        OperationError::InvalidParameter { name, .. } if name == "eps"
    ));
}

#[test]
fn test_clustering_model_with_transformation() {
    let fixture = Fixture::new()
        .param("features", json!(["features"]))
        .input("train input data", "df")
        .input("algorithm", "algo")
        .output("model", "model_1")
        .output("output data", "out")
        .connected("output data");
    let code = fixture.generate(&ClusteringModelFactory);
    assert!(code.contains("model_1 = algo.fit(X)"));
    assert!(code.contains("y = algo.predict(X)"));
    assert!(code.contains("out['prediction'] = y"));
}

#[test]
fn test_clustering_model_without_transformation() {
    let fixture = Fixture::new()
        .param("features", json!(["features"]))
        .input("train input data", "df")
        .input("algorithm", "algo")
        .output("model", "model_1")
        .output("output data", "out");
    let code = fixture.generate(&ClusteringModelFactory);
    assert!(code.contains("model_1 = algo.fit(X)"));
    assert!(code.contains("out = None"));
    assert!(!code.contains("predict"));
}

#[test]
fn test_pearson_correlation_success() {
    let fixture = Fixture::new()
        .param("attributes", json!(["sepallength", "sepalwidth"]))
        .input("input data", "df")
        .output("correlation", "corr");
    let code = fixture.generate(&PearsonCorrelationFactory);
    assert_eq!(code, "corr = df['sepallength'].corr(df['sepalwidth'])");
}

#[test]
fn test_pearson_correlation_requires_two_attributes() {
    let fixture = Fixture::new()
        .param("attributes", json!(["sepallength"]))
        .input("input data", "df")
        .output("correlation", "corr");
    let err = fixture
        .build(&PearsonCorrelationFactory)
        .err()
        .expect("expected an error");
    assert!(matches!(
        err,
        OperationError::InvalidParameter { name, .. } if name == "attributes"
    ));
}

#[test]
fn test_table_report_is_always_executed() {
    let fixture = Fixture::new().input("input data", "df");
    let op = fixture.build(&TableReportFactory).expect("Failed to build");

    let facts = ExecutionFacts {
        is_satisfied: false,
        ignore_out_degree: false,
        ignore_has_code: false,
        out_degree: 3,
        contains_results: false,
    };
    assert!(op.must_be_executed(&facts));
    assert!(op.generate_code().expect("Failed to generate").contains("df.to_string()"));
}

#[test]
fn test_execution_predicate_truth_table() {
    let base = ExecutionFacts {
        is_satisfied: true,
        ignore_out_degree: false,
        ignore_has_code: false,
        out_degree: 0,
        contains_results: false,
    };

    // A code-bearing terminal task runs.
    assert!(execution_required(true, &base));
    // Consumers downstream take over: nothing forces this task.
    assert!(!execution_required(true, &ExecutionFacts { out_degree: 2, ..base }));
    // Unless the degree check is waived,
    assert!(execution_required(
        true,
        &ExecutionFacts {
            out_degree: 2,
            ignore_out_degree: true,
            ..base
        }
    ));
    // or the task displays results directly.
    assert!(execution_required(
        false,
        &ExecutionFacts {
            out_degree: 2,
            contains_results: true,
            ..base
        }
    ));
    // Codeless tasks stay silent,
    assert!(!execution_required(false, &base));
    // unless the caller waives the code check too.
    assert!(execution_required(
        false,
        &ExecutionFacts {
            ignore_has_code: true,
            ..base
        }
    ));
    // Unsatisfied tasks never run on their own merits.
    assert!(!execution_required(
        true,
        &ExecutionFacts {
            is_satisfied: false,
            ..base
        }
    ));
}

#[test]
fn test_contains_results_flag_forms() {
    let truthy = [json!(1), json!("1"), json!(true)];
    for value in truthy {
        let mut parameters = serde_json::Map::new();
        parameters.insert("display_sample".to_string(), value.clone());
        assert!(contains_results(&parameters), "value {value} should count");
    }

    let mut parameters = serde_json::Map::new();
    parameters.insert("display_schema".to_string(), json!("1"));
    assert!(contains_results(&parameters));

    let mut parameters = serde_json::Map::new();
    parameters.insert("display_sample".to_string(), json!(0));
    assert!(!contains_results(&parameters));
    assert!(!contains_results(&serde_json::Map::new()));
}
