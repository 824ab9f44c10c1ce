//! Scenario harness
//!
//! Drives the target program once per scenario through a scripted stdin,
//! then checks the list files and transcript it leaves behind. Scenarios run
//! sequentially against one work directory.

pub mod driver;
pub mod fixtures;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod script;
pub mod verdict;

pub use driver::{DryRunDriver, Driver, Invocation, ShellDriver};
pub use report::Reporter;
pub use runner::{AggregatePolicy, Outcome, RunConfig, RunSummary, Runner, ScenarioVerdict};
pub use scenario::{Registry, ScenarioKind};
