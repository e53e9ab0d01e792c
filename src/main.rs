// src/main.rs

use iapetus::{cli, logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("iapetus error: {err:?}");
        std::process::exit(exit_code_for(&err));
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await.map_err(anyhow::Error::from)
}

/// 1 for a workflow-level failure, 2 would be used for argument/usage
/// errors, but those are already handled by `clap` exiting the process
/// itself before `main` runs.
fn exit_code_for(_err: &anyhow::Error) -> i32 {
    1
}
