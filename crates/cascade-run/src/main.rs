// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Cascade Run - compiles and computes a graph description.
//!
//! Loads a JSON graph description, compiles it into a level schedule,
//! runs the incremental evaluator, and prints every node's outputs along
//! with the elapsed time and process id.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cascade_graph::{CancelToken, ComputationResult, NodeIndex, compile, compute};
use cascade_value::TypeRegistry;

mod describe;
mod nodes;

#[derive(Parser, Debug)]
#[command(name = "cascade-run")]
#[command(about = "Compile and compute a Cascade graph description")]
struct Cli {
    /// Path to a JSON graph description
    graph: PathBuf,

    /// Number of compute passes (repeats are incremental and cheap)
    #[arg(long, default_value = "1")]
    repeat: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cascade_run=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let started = Instant::now();

    info!("loading graph from: {}", cli.graph.display());
    let text = std::fs::read_to_string(&cli.graph)?;
    let types = TypeRegistry::new();
    let loaded = describe::load_graph(&text, &types)?;

    let (instructions, source_inputs) =
        compile(&loaded.nodes, &loaded.edges, &loaded.inputs, &types)?;
    info!(
        nodes = loaded.nodes.len(),
        levels = instructions.levels().len(),
        "graph compiled"
    );

    let mut result = ComputationResult::new(&instructions);
    let cancel = CancelToken::new();
    for pass in 0..cli.repeat {
        let finished = compute(
            &instructions,
            &loaded.nodes,
            &source_inputs,
            &mut result,
            &types,
            &cancel,
            None,
        )?;
        if !finished {
            info!(pass, "computation cancelled");
            break;
        }
    }

    for (index, name) in loaded.node_names.iter().enumerate() {
        let outputs = result.outputs(NodeIndex(index));
        let rendered: Vec<String> = outputs.iter().map(ToString::to_string).collect();
        println!("{name}: [{}]", rendered.join(", "));
    }
    println!("elapsed: {:?}", started.elapsed());
    println!("pid: {}", std::process::id());
    Ok(())
}
