//! Scenario runner
//!
//! Executes the selected scenarios one after another against a single work
//! directory. Scenario order matters: each one restages the baselines but
//! shares the working-copy file names with every other scenario.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::driver::{Driver, Invocation};
use super::fixtures::{self, Derivation, Expected};
use super::report::Reporter;
use super::scenario::{Lookup, Registry, ScenarioKind};
use super::script::Script;
use super::verdict::{self, Check, ExitClass};
use crate::common::{HarnessConfig, Result, Workspace};

/// How per-scenario codes fold into the process exit status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum AggregatePolicy {
    /// Run everything, exit with the first nonzero code
    #[default]
    FirstFailure,
    /// Exit with whatever the last scenario returned
    Last,
    /// Stop at the first nonzero code and exit with it
    FailFast,
}

impl AggregatePolicy {
    pub fn aggregate(self, codes: &[i32]) -> i32 {
        match self {
            AggregatePolicy::Last => codes.last().copied().unwrap_or(0),
            AggregatePolicy::FirstFailure | AggregatePolicy::FailFast => {
                codes.iter().copied().find(|&c| c != 0).unwrap_or(0)
            }
        }
    }
}

/// Per-run settings coming from the command line
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Print banners, executed commands and diagnostics
    pub verbose: bool,
    /// Build scripts and fixtures without running the target
    pub dry_run: bool,
    /// Scenario keys to run; empty means the default set
    pub tests: Vec<String>,
    pub policy: AggregatePolicy,
    pub timeout: Duration,
}

impl RunConfig {
    /// Run settings from the config file alone
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            verbose: true,
            dry_run: false,
            tests: Vec::new(),
            policy: config.run.policy,
            timeout: Duration::from_secs(config.run.timeout_secs),
        }
    }
}

/// Classified result of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
    Pass,
    Mismatch,
    Crash,
    Fault,
    Timeout,
    ExitCode,
    Precondition,
    Unregistered,
    DryRun,
}

impl Outcome {
    pub fn is_failure(self) -> bool {
        !matches!(
            self,
            Outcome::Pass | Outcome::Unregistered | Outcome::DryRun
        )
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Pass => "pass",
            Outcome::Mismatch => "mismatch",
            Outcome::Crash => "crash",
            Outcome::Fault => "fault",
            Outcome::Timeout => "timeout",
            Outcome::ExitCode => "exit-code",
            Outcome::Precondition => "precondition",
            Outcome::Unregistered => "unregistered",
            Outcome::DryRun => "dry-run",
        };
        f.write_str(s)
    }
}

impl From<ExitClass> for Outcome {
    fn from(class: ExitClass) -> Self {
        match class {
            ExitClass::Success(_) => Outcome::Pass,
            ExitClass::Crash(_) => Outcome::Crash,
            ExitClass::Fault(_) => Outcome::Fault,
            ExitClass::Timeout(_) => Outcome::Timeout,
            ExitClass::Failure(_) => Outcome::ExitCode,
        }
    }
}

/// Verdict for one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioVerdict {
    pub key: String,
    pub outcome: Outcome,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ScenarioVerdict {
    fn new(key: &str, outcome: Outcome, code: i32, detail: Option<String>) -> Self {
        Self {
            key: key.to_string(),
            outcome,
            code,
            detail,
        }
    }

    fn pass(key: &str) -> Self {
        Self::new(key, Outcome::Pass, 0, None)
    }

    fn from_check(key: &str, check: Check) -> Self {
        Self::new(key, Outcome::Mismatch, check.code, Some(check.message))
    }
}

/// Everything a run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub policy: AggregatePolicy,
    pub exit_code: i32,
    pub verdicts: Vec<ScenarioVerdict>,
}

impl RunSummary {
    fn new(policy: AggregatePolicy, verdicts: Vec<ScenarioVerdict>) -> Self {
        let codes: Vec<i32> = verdicts.iter().map(|v| v.code).collect();
        Self {
            policy,
            exit_code: policy.aggregate(&codes),
            verdicts,
        }
    }

    pub fn passed(&self) -> usize {
        self.verdicts
            .iter()
            .filter(|v| matches!(v.outcome, Outcome::Pass | Outcome::DryRun))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.verdicts.iter().filter(|v| v.outcome.is_failure()).count()
    }

    pub fn unregistered(&self) -> usize {
        self.verdicts
            .iter()
            .filter(|v| v.outcome == Outcome::Unregistered)
            .count()
    }
}

/// Path as the target sees it from inside the work directory
fn local(ws: &Workspace, path: &Path) -> PathBuf {
    path.strip_prefix(ws.root())
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

pub struct Runner<'a> {
    config: &'a HarnessConfig,
    run: &'a RunConfig,
    workspace: &'a Workspace,
    driver: &'a dyn Driver,
    reporter: Reporter,
}

impl<'a> Runner<'a> {
    pub fn new(
        config: &'a HarnessConfig,
        run: &'a RunConfig,
        workspace: &'a Workspace,
        driver: &'a dyn Driver,
    ) -> Self {
        Self {
            config,
            run,
            workspace,
            driver,
            reporter: Reporter::new(run.verbose),
        }
    }

    /// Replace the console reporter
    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn reporter(&self) -> Reporter {
        self.reporter
    }

    /// Run the selection and aggregate the verdicts
    ///
    /// Returns `Err` only for environment errors, which abort the run.
    pub async fn run(&self, registry: &Registry) -> Result<RunSummary> {
        let mut verdicts = Vec::new();

        for lookup in registry.select(&self.run.tests) {
            let verdict = match lookup {
                Lookup::Found(scenario) => {
                    self.reporter.banner(scenario.key());
                    let verdict = self.run_scenario(scenario).await?;
                    self.reporter.footer(scenario.key(), verdict.code);
                    verdict
                }
                Lookup::Unregistered(key) => {
                    self.reporter.banner(&key);
                    self.reporter
                        .failure(&format!("Test function {} not found.", key));
                    tracing::warn!(scenario = %key, "unregistered scenario skipped");
                    self.reporter.footer(&key, 0);
                    ScenarioVerdict::new(&key, Outcome::Unregistered, 0, None)
                }
            };

            tracing::info!(
                scenario = %verdict.key,
                outcome = %verdict.outcome,
                code = verdict.code,
                "scenario finished"
            );

            let stop = self.run.policy == AggregatePolicy::FailFast && verdict.code != 0;
            verdicts.push(verdict);
            if stop {
                tracing::info!("fail-fast: stopping after first failure");
                break;
            }
        }

        Ok(RunSummary::new(self.run.policy, verdicts))
    }

    /// Run one scenario, turning scenario-level errors into a failing verdict
    pub async fn run_scenario(&self, scenario: &ScenarioKind) -> Result<ScenarioVerdict> {
        match self.execute(scenario).await {
            Ok(verdict) => Ok(verdict),
            Err(e) if e.is_environment() => Err(e),
            Err(e) => {
                self.reporter.failure(&e.to_string());
                Ok(ScenarioVerdict::new(
                    scenario.key(),
                    Outcome::Precondition,
                    1,
                    Some(e.to_string()),
                ))
            }
        }
    }

    async fn execute(&self, scenario: &ScenarioKind) -> Result<ScenarioVerdict> {
        let ws = self.workspace;
        let key = scenario.key();
        let derivation = scenario.derivation();

        if derivation == Derivation::MissingFiles {
            fixtures::remove_working_copies(ws)?;
        } else {
            fixtures::stage_baseline(ws)?;
        }

        let input = match scenario.operation() {
            Some(operation) => {
                let path = ws.input_script(key);
                Script::build(operation, scenario.operand())?.write_to(&path)?;
                Some(path)
            }
            None => None,
        };

        let expected = fixtures::derive_expected(derivation, key, scenario.operand(), ws)?;

        let capture = match &expected {
            Expected::Transcript { actual, .. } => actual.clone(),
            _ => ws.capture(key),
        };

        let invocation = Invocation {
            program: ws.executable().to_path_buf(),
            input: input.as_deref().map(|p| local(ws, p)),
            capture: local(ws, &capture),
            work_dir: ws.root().to_path_buf(),
        };

        self.reporter.execute(&invocation);
        let code = self.driver.run(&invocation).await?;

        if !self.driver.executes() {
            self.reporter.info("Dry run: verification skipped");
            return Ok(ScenarioVerdict::new(key, Outcome::DryRun, 0, None));
        }

        let class = ExitClass::classify(code, &self.config.exit);
        self.reporter.exit_class(class);
        // Without its list files the target is expected to exit with an error
        let tolerated =
            derivation == Derivation::MissingFiles && matches!(class, ExitClass::Failure(_));
        if !class.is_success() && !tolerated {
            return Ok(ScenarioVerdict::new(
                key,
                class.into(),
                code,
                Some(class.to_string()),
            ));
        }

        if let Some(failed) = self.verify(&expected, &capture, key) {
            return Ok(failed);
        }

        if let Some(failed) = self.extra_checks(key, &capture)? {
            return Ok(failed);
        }

        Ok(ScenarioVerdict::pass(key))
    }

    /// Apply the scenario's own predicate(s); `Some` on the first failure
    fn verify(&self, expected: &Expected, capture: &Path, key: &str) -> Option<ScenarioVerdict> {
        match expected {
            Expected::Lists { record, lists } => {
                for list in lists {
                    self.reporter.info(&format!(
                        "Checking {} list after '{}' against {}",
                        list.label,
                        record,
                        list.actual.display()
                    ));
                    let check = verdict::diff_files(&list.expected, &list.actual);
                    self.reporter.check(&check);
                    if !check.passed {
                        return Some(ScenarioVerdict::from_check(key, check));
                    }
                }
                None
            }

            Expected::ContainsFile(needle) => {
                self.reporter.info(&format!(
                    "Checking if {} is in {}",
                    needle.display(),
                    capture.display()
                ));
                self.conclude(key, verdict::file_contains_file(capture, needle))
            }

            Expected::ContainsText(text) => {
                self.reporter
                    .info(&format!("Checking if {} is in {}", text, capture.display()));
                self.conclude(key, verdict::file_contains_str(capture, text))
            }

            Expected::Transcript { expected, actual } => {
                if !expected.exists() {
                    let message = format!("{} not found", expected.display());
                    self.reporter.failure(&message);
                    return Some(ScenarioVerdict::new(key, Outcome::Mismatch, 1, Some(message)));
                }
                self.conclude(key, verdict::diff_files(expected, actual))
            }

            Expected::ExitOnly => None,
        }
    }

    fn conclude(&self, key: &str, check: Check) -> Option<ScenarioVerdict> {
        self.reporter.check(&check);
        if check.passed {
            None
        } else {
            Some(ScenarioVerdict::from_check(key, check))
        }
    }

    /// Output checks attached to this scenario in the config file
    fn extra_checks(&self, key: &str, capture: &Path) -> Result<Option<ScenarioVerdict>> {
        for extra in self.config.checks_for(key) {
            if let Some(text) = &extra.contains {
                if let Some(failed) = self.conclude(key, verdict::file_contains_str(capture, text))
                {
                    return Ok(Some(failed));
                }
            }
            if let Some(pattern) = &extra.pattern {
                let regex = verdict::compile_pattern(pattern)?;
                if let Some(failed) = self.conclude(key, verdict::file_matches(capture, &regex)) {
                    return Ok(Some(failed));
                }
            }
            if extra.contains.is_none() && extra.pattern.is_none() {
                tracing::warn!(scenario = key, "output check has neither 'contains' nor 'pattern'");
            }
        }
        Ok(None)
    }
}
