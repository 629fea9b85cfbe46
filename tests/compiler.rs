//! Tests for port resolution, code assembly and the compile facade.
mod common;
use common::*;
use garapa::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_end_to_end_chain_references_upstream_identifiers() {
    let program = compile(linear_workflow()).expect("Failed to compile");

    let ids: Vec<&str> = program
        .fragments
        .iter()
        .map(|f| f.task_id.as_str())
        .collect();
    assert_eq!(ids, vec!["read", "narrow", "show"]);

    let read_out = program.outputs["read"]["output data"].clone();
    let narrow_out = program.outputs["narrow"]["output data"].clone();

    // Each fragment reads the identifier its producer resolved to.
    assert!(program.fragments[1].code.contains(&read_out));
    assert!(program.fragments[2].code.contains(&narrow_out));

    // The concatenated source preserves fragment order.
    let source = program.source();
    let read_at = source.find(&read_out).expect("read identifier missing");
    let narrow_at = source.find(&narrow_out).expect("narrow identifier missing");
    assert!(read_at < narrow_at);
}

#[test]
fn test_fan_out_resolves_to_one_identifier() {
    let workflow = WorkflowDefinition {
        name: None,
        tasks: vec![
            reader("read", 1),
            report("first", 2),
            report("second", 3),
            report("third", 4),
        ],
        flows: vec![
            flow("read", "output data", "first", "input data"),
            flow("read", "output data", "second", "input data"),
            flow("read", "output data", "third", "input data"),
        ],
    };
    let program = compile(workflow).expect("Failed to compile");

    let read_out = program.outputs["read"]["output data"].clone();
    for fragment in program.fragments.iter().skip(1) {
        assert!(
            fragment.code.contains(&read_out),
            "consumer '{}' should reference '{}'",
            fragment.task_id,
            read_out
        );
    }
}

#[test]
fn test_unbound_required_input_fails_at_assembly() {
    let workflow = WorkflowDefinition {
        name: None,
        tasks: vec![select("narrow", 1), report("show", 2)],
        flows: vec![flow("narrow", "output data", "show", "input data")],
    };

    match compile(workflow).err().expect("expected a compile error") {
        CompileError::Assembly(AssemblyError::UnboundPort { task_id, port }) => {
            assert_eq!(task_id, "narrow");
            assert_eq!(port, "input data");
        }
        other => panic!("Expected UnboundPort, got {other:?}"),
    }
}

#[test]
fn test_noop_contributes_empty_fragment_but_keeps_its_place() {
    let workflow = WorkflowDefinition {
        name: None,
        tasks: vec![
            reader("read", 1),
            TaskDefinition::new("pass", "no-op").with_order(2),
            report("show", 3),
        ],
        flows: vec![
            flow("read", "output data", "pass", "input data"),
            flow("read", "output data", "show", "input data"),
        ],
    };
    let program = compile(workflow).expect("Failed to compile");

    let pass = program
        .fragments
        .iter()
        .find(|f| f.task_id == "pass")
        .expect("no-op fragment missing");
    assert_eq!(pass.code, "");
    assert!(!program.source().contains("no-op"));
}

#[test]
fn test_missing_parameter_is_tagged_with_task() {
    let mut workflow = linear_workflow();
    workflow.tasks[0].parameters.remove("data_source");

    match compile(workflow).err().expect("expected a compile error") {
        CompileError::Assembly(AssemblyError::Operation {
            task_id,
            operation_type,
            source,
        }) => {
            assert_eq!(task_id, "read");
            assert_eq!(operation_type, "data-reader");
            assert_eq!(
                source,
                OperationError::MissingParameter {
                    name: "data_source".to_string(),
                }
            );
        }
        other => panic!("Expected a tagged operation error, got {other:?}"),
    }
}

#[test]
fn test_invalid_parameter_is_tagged_with_task() {
    let mut workflow = clustering_workflow();
    workflow.tasks[1] = TaskDefinition::new("algo", "kmeans-clustering")
        .with_param("n_clusters", json!(0))
        .with_order(2);

    match compile(workflow).err().expect("expected a compile error") {
        CompileError::Assembly(AssemblyError::Operation {
            task_id, source, ..
        }) => {
            assert_eq!(task_id, "algo");
            assert!(matches!(
                source,
                OperationError::InvalidParameter { name, .. } if name == "n_clusters"
            ));
        }
        other => panic!("Expected a tagged operation error, got {other:?}"),
    }
}

#[test]
fn test_repeated_compilation_is_byte_identical() {
    let first = compile(clustering_workflow()).expect("Failed to compile");
    let second = compile(clustering_workflow()).expect("Failed to compile");

    assert_eq!(first.source(), second.source());
    assert_eq!(first.fragments, second.fragments);
    assert_eq!(first.imports, second.imports);
}

#[test]
fn test_user_named_outputs_are_respected() {
    let mut workflow = linear_workflow();
    workflow.tasks[0] = reader("read", 1).with_output("output data", "df");

    let program = compile(workflow).expect("Failed to compile");
    assert_eq!(program.outputs["read"]["output data"], "df");
    assert!(program.fragments[0].code.contains("df = pd.read_csv"));
    assert!(program.fragments[1].code.contains("df"));
}

#[test]
fn test_synthesized_identifier_defaulting() {
    assert_eq!(synthesized_identifier("output data", 3), "output_data_task_3");
    assert_eq!(synthesized_identifier("model", 0), "model_task_0");

    // An unnamed output falls back to the synthesized form, derived from the
    // task's position in the sorted order.
    let program = compile(linear_workflow()).expect("Failed to compile");
    assert_eq!(program.outputs["read"]["output data"], "output_data_task_0");
    assert_eq!(program.outputs["narrow"]["output data"], "output_data_task_1");
}

#[test]
fn test_task_comment_headers_are_configurable() {
    let with_comments = compile(linear_workflow()).expect("Failed to compile");
    assert!(with_comments.source().contains("# Task read (data-reader)"));

    let config = CompilerConfig {
        storage_base_url: None,
        emit_task_comments: false,
    };
    let without_comments = Compiler::builder(linear_workflow())
        .with_config(config)
        .build()
        .compile()
        .expect("Failed to compile");
    assert!(!without_comments.source().contains("# Task"));
}

#[test]
fn test_compile_aborts_on_validation_issues() {
    let mut workflow = linear_workflow();
    workflow.tasks.push(reader("stray", 9));

    match compile(workflow).err().expect("expected a compile error") {
        CompileError::Validation { issues } => {
            assert_eq!(issues.len(), 1);
            assert!(matches!(
                &issues[0],
                ValidationIssue::UnconsumedOutput { task_id, .. } if task_id == "stray"
            ));
        }
        other => panic!("Expected a validation failure, got {other:?}"),
    }
}

#[test]
fn test_compile_reports_cycles() {
    let workflow = WorkflowDefinition {
        name: None,
        tasks: vec![select("a", 1), select("b", 2)],
        flows: vec![
            flow("a", "output data", "b", "input data"),
            flow("b", "output data", "a", "input data"),
        ],
    };

    match compile(workflow).err().expect("expected a compile error") {
        CompileError::Cycle(err) => {
            assert!(err.task_id == "a" || err.task_id == "b");
        }
        other => panic!("Expected a cycle error, got {other:?}"),
    }
}

#[test]
fn test_artifact_round_trip() {
    let program = compile(clustering_workflow()).expect("Failed to compile");
    let source = program.source();

    let artifact = CompiledWorkflow::new(Some("clustering".to_string()), program);
    let bytes = artifact.to_bytes().expect("Failed to serialize artifact");
    let restored = CompiledWorkflow::from_bytes(&bytes).expect("Failed to deserialize artifact");

    assert_eq!(restored.name.as_deref(), Some("clustering"));
    assert_eq!(restored.program.source(), source);
}
