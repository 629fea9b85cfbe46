use clap::Parser;
use garapa::error::WorkflowConversionError;
use garapa::prelude::*;
use serde::Deserialize;
use std::fs;
use std::time::Instant;

// --- JSON Deserialization Structs (Input Format Specific) ---
// These structs match the editor's `pipeline.json` export and are only used
// here for conversion.

#[derive(Deserialize)]
struct RawPipeline {
    #[serde(default)]
    name: Option<String>,
    tasks: Vec<RawTask>,
    #[serde(default)]
    connections: Vec<RawConnection>,
}

#[derive(Deserialize)]
struct RawTask {
    id: String,
    #[serde(alias = "slug")]
    operation: String,
    #[serde(default)]
    parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    order: i32,
    #[serde(default)]
    outputs: IndexMap<String, String>,
}

#[derive(Deserialize)]
struct RawConnection {
    #[serde(alias = "sourceId")]
    source: String,
    #[serde(alias = "sourcePort")]
    source_port: String,
    #[serde(alias = "targetId")]
    target: String,
    #[serde(alias = "targetPort")]
    target_port: String,
}

// --- Converter Implementation ---
// Translates the raw editor export into garapa's canonical model.

impl IntoWorkflow for RawPipeline {
    fn into_workflow(self) -> std::result::Result<WorkflowDefinition, WorkflowConversionError> {
        if self.tasks.is_empty() {
            return Err(WorkflowConversionError::ValidationError(
                "pipeline has no tasks".to_string(),
            ));
        }

        let tasks = self
            .tasks
            .into_iter()
            .map(|task| {
                let mut definition = TaskDefinition::new(task.id, task.operation)
                    .with_order(task.order);
                definition.parameters = task.parameters;
                definition.named_outputs = task.outputs;
                definition
            })
            .collect();

        let flows = self
            .connections
            .into_iter()
            .map(|conn| {
                FlowDefinition::new(conn.source, conn.source_port, conn.target, conn.target_port)
            })
            .collect();

        Ok(WorkflowDefinition {
            name: self.name,
            tasks,
            flows,
        })
    }
}

#[derive(Parser)]
#[command(
    name = "garapa-cli",
    about = "Compile a node-based pipeline description into ordered code fragments"
)]
struct Cli {
    /// Path to the pipeline JSON export
    pipeline: String,

    /// Write the compiled artifact (bincode) to this path
    #[arg(short, long)]
    artifact: Option<String>,

    /// Base location joined onto relative data sources
    #[arg(long)]
    storage: Option<String>,

    /// Do not prefix emitted fragments with task headers
    #[arg(long)]
    no_comments: bool,
}

fn main() {
    let cli = Cli::parse();

    println!("Loading pipeline from: {}", cli.pipeline);
    let pipeline_json = match fs::read_to_string(&cli.pipeline) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Failed to read pipeline file '{}': {}", cli.pipeline, e);
            std::process::exit(1);
        }
    };

    let raw: RawPipeline = match serde_json::from_str(&pipeline_json) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Failed to parse pipeline JSON: {}", e);
            std::process::exit(1);
        }
    };

    let workflow = match raw.into_workflow() {
        Ok(workflow) => workflow,
        Err(e) => {
            eprintln!("Failed to convert pipeline: {}", e);
            std::process::exit(1);
        }
    };
    let name = workflow.name.clone();

    println!("\nStarting Workflow Compilation...");
    let start = Instant::now();

    let config = CompilerConfig {
        storage_base_url: cli.storage,
        emit_task_comments: !cli.no_comments,
    };
    let program = match Compiler::builder(workflow).with_config(config).build().compile() {
        Ok(program) => program,
        Err(e) => {
            eprintln!("Compilation failed: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Compilation Successful! {} fragment(s) generated in {:.2?}.",
        program.fragments.len(),
        start.elapsed()
    );
    for fragment in &program.fragments {
        let status = if fragment.code.is_empty() {
            "ordering only"
        } else {
            "emitted"
        };
        println!(
            "  -> Task '{}' ({}) {}",
            fragment.task_id, fragment.operation_type, status
        );
    }

    println!("\n--- Generated Source ---\n{}", program.source());

    if let Some(path) = cli.artifact {
        let artifact = CompiledWorkflow::new(name, program);
        match artifact.save(&path) {
            Ok(()) => println!("\nWrote compiled artifact to '{}'", path),
            Err(e) => {
                eprintln!("Failed to write artifact '{}': {}", path, e);
                std::process::exit(1);
            }
        }
    }
}
