// src/lib.rs

pub mod assertions;
pub mod backend;
pub mod cli;
pub mod config;
pub mod dag;
pub mod errors;
pub mod executor;
pub mod logging;
pub mod model;
pub mod scheduler;
pub mod types;
pub mod workflow;

use std::path::PathBuf;

use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::errors::Result;

/// High-level entry point used by `main.rs`.
///
/// Wires together: config loading, backend registration, and handing the
/// resulting [`workflow::Workflow`] to the scheduler via
/// [`workflow::Workflow::run`].
pub async fn run(args: CliArgs) -> Result<()> {
    backend::register_default_backends();

    let config_path = PathBuf::from(&args.config);
    let workflow = load_and_validate(&config_path)?;

    if args.dry_run {
        print_dry_run(&workflow);
        return Ok(());
    }

    info!(config = %config_path.display(), "loaded workflow");
    workflow.run().await
}

/// Structural-only dry run: print the workflow's tasks and dependencies
/// without registering a backend or executing anything.
fn print_dry_run(workflow: &workflow::Workflow) {
    println!("iapetus dry-run");
    println!("  workflow.name = {}", workflow.name);
    println!("  workflow.backend = {}", workflow.backend);
    println!();

    println!("steps ({}):", workflow.steps.len());
    for task in &workflow.steps {
        println!("  - {}", task.name);
        println!("      command: {} {}", task.command, task.args.join(" "));
        if !task.depends.is_empty() {
            println!("      depends: {:?}", task.depends);
        }
        if !task.backend.is_empty() {
            println!("      backend: {}", task.backend);
        }
        if task.retries > 0 {
            println!("      retries: {}", task.retries);
        }
    }
}
