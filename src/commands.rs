//! CLI argument definitions
//!
//! Defines the clap flags for a harness run.

use clap::Args;
use std::path::PathBuf;

use crate::testing::AggregatePolicy;

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Print banners, executed commands and diagnostics
    #[arg(short, long, default_value_t = true)]
    pub verbose: bool,

    /// Only report failures and the final summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Run in the current directory instead of entering the build directory
    #[arg(long)]
    pub nosetup: bool,

    /// Stay in the build directory when the run ends
    #[arg(long)]
    pub nocleanup: bool,

    /// Dry run: write scripts and expected files but never start the target
    #[arg(long)]
    pub debug: bool,

    /// Scenarios to run, in order (default: the standard set)
    #[arg(short, long = "test", value_name = "KEY", num_args = 1..)]
    pub tests: Vec<String>,

    /// Config file (default: ./autotest.toml, then the user config dir)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// How scenario results fold into the exit status
    #[arg(long, value_enum)]
    pub policy: Option<AggregatePolicy>,

    /// Seconds before a hung target is killed
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// List registered scenarios and exit
    #[arg(long)]
    pub list: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}
