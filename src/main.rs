//! autotest - regression harness for the movie queue program
//!
//! Runs each scenario against the compiled target and exits with the
//! aggregated verdict.

use autotest::{cli, commands::RunArgs, common::logging};
use clap::Parser;

#[derive(Parser)]
#[command(name = "autotest", about = "Black-box regression tests for the movie queue program")]
#[command(version, long_about = None)]
struct Cli {
    #[command(flatten)]
    args: RunArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let guard = logging::init(cli.args.debug, cli.args.log_file.as_deref());

    let code = match cli::dispatch(cli.args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    };

    // process::exit skips destructors; flush the log file first
    drop(guard);
    std::process::exit(code);
}
