//! Console reporting
//!
//! gtest-style banners on stdout. Nothing is printed on pass unless verbose;
//! failures always print their headline, and the expected/actual dump only
//! when verbose. A silent reporter prints nothing at all.

use colored::{Color, Colorize};

use super::driver::Invocation;
use super::runner::{RunSummary, ScenarioVerdict};
use super::verdict::{Check, ExitClass};

const RULE: &str = "[==========]";
const THIN_RULE: &str = "[----------]";

#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    verbose: bool,
    enabled: bool,
}

impl Reporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            enabled: true,
        }
    }

    /// Reporter that prints nothing, for machine-readable output
    pub fn silent() -> Self {
        Self {
            verbose: false,
            enabled: false,
        }
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    fn framed(&self, rule: &str, tag: &str, msg: &str, color: Color) {
        if !self.enabled {
            return;
        }
        println!("{}", rule.color(color));
        println!("{}", format!("[{:^10}] {}", tag, msg).color(color));
        println!("{}", rule.color(color));
    }

    pub fn banner(&self, key: &str) {
        if self.verbose {
            self.framed(RULE, "TEST", key, Color::Blue);
        }
    }

    pub fn footer(&self, key: &str, code: i32) {
        if self.verbose {
            self.framed(RULE, "END", &format!("{} rc: {}", key, code), Color::Blue);
        }
    }

    pub fn execute(&self, invocation: &Invocation) {
        if self.verbose {
            self.framed(RULE, "EXECUTE", &invocation.command_line(), Color::Green);
        }
    }

    pub fn exit_class(&self, class: ExitClass) {
        if !self.verbose {
            return;
        }
        if class.is_success() {
            self.success(&class.to_string());
        } else {
            self.failure(&class.to_string());
        }
    }

    pub fn success(&self, msg: &str) {
        self.framed(THIN_RULE, "PASSED", msg, Color::Green);
    }

    pub fn failure(&self, msg: &str) {
        self.framed(THIN_RULE, "FAILED", msg, Color::Red);
    }

    pub fn info(&self, msg: &str) {
        if self.verbose {
            println!("{}", msg);
        }
    }

    /// Report one predicate outcome
    pub fn check(&self, check: &Check) {
        if check.passed {
            if self.verbose {
                self.success(&check.message);
            }
            return;
        }

        self.failure(&check.message);
        if self.verbose {
            if let Some(diagnostic) = &check.diagnostic {
                println!("{}", diagnostic);
            }
        }
    }

    /// End-of-run table
    pub fn summary(&self, summary: &RunSummary) {
        if !self.enabled {
            return;
        }
        println!("\n{}", "Summary:".cyan());
        for verdict in &summary.verdicts {
            println!("  {}", summary_line(verdict));
        }
        let line = format!(
            "{} passed, {} failed, {} unregistered; exit status {}",
            summary.passed(),
            summary.failed(),
            summary.unregistered(),
            summary.exit_code
        );
        if summary.failed() == 0 {
            println!("\n{}", line.green().bold());
        } else {
            println!("\n{}", line.red().bold());
        }
    }
}

fn summary_line(verdict: &ScenarioVerdict) -> String {
    let mark = if verdict.outcome.is_failure() {
        "✗".red()
    } else {
        "✓".green()
    };
    match &verdict.detail {
        Some(detail) => format!(
            "{} {} ({}, rc {}): {}",
            mark,
            verdict.key,
            verdict.outcome,
            verdict.code,
            detail.dimmed()
        ),
        None => format!("{} {} ({}, rc {})", mark, verdict.key, verdict.outcome, verdict.code),
    }
}
