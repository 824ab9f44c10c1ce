//! Scenario registry
//!
//! Scenarios are a closed set of variants registered once at startup. A key
//! that is not registered resolves to [`Lookup::Unregistered`] rather than
//! failing the lookup.

use std::fmt;

use serde::Serialize;

use super::fixtures::Derivation;
use super::script::Operation;
use crate::common::HarnessConfig;

/// Prefix accepted in front of scenario keys (`test_add` == `add`)
const KEY_PREFIX: &str = "test_";

/// Scenario key with the optional `test_` prefix removed
pub fn canonical_key(key: &str) -> &str {
    key.strip_prefix(KEY_PREFIX).unwrap_or(key)
}

/// A single registered scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioKind {
    Exit,
    Add { record: String },
    Watch,
    Delete,
    History,
    Recent,
    Queue,
    Next,
    /// Run with no working copies and compare the full transcript
    MissingFile,
}

impl ScenarioKind {
    pub fn key(&self) -> &'static str {
        match self {
            ScenarioKind::MissingFile => "missing_file",
            other => other.operation().map(Operation::key).unwrap_or("unknown"),
        }
    }

    /// Menu operation driven through stdin; `None` when stdin is not scripted
    pub fn operation(&self) -> Option<Operation> {
        match self {
            ScenarioKind::Exit => Some(Operation::Exit),
            ScenarioKind::Add { .. } => Some(Operation::Add),
            ScenarioKind::Watch => Some(Operation::Watch),
            ScenarioKind::Delete => Some(Operation::Delete),
            ScenarioKind::History => Some(Operation::History),
            ScenarioKind::Recent => Some(Operation::Recent),
            ScenarioKind::Queue => Some(Operation::Queue),
            ScenarioKind::Next => Some(Operation::Next),
            ScenarioKind::MissingFile => None,
        }
    }

    pub fn operand(&self) -> Option<&str> {
        match self {
            ScenarioKind::Add { record } => Some(record),
            _ => None,
        }
    }

    pub fn derivation(&self) -> Derivation {
        match self {
            ScenarioKind::Exit => Derivation::ExitStatus,
            ScenarioKind::Add { .. } => Derivation::AppendPending,
            ScenarioKind::Watch => Derivation::MovePendingToProcessed,
            ScenarioKind::Delete => Derivation::DropPending,
            ScenarioKind::History => Derivation::ProcessedFile,
            ScenarioKind::Recent => Derivation::FirstProcessed,
            ScenarioKind::Queue => Derivation::PendingFile,
            ScenarioKind::Next => Derivation::FirstPending,
            ScenarioKind::MissingFile => Derivation::MissingFiles,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScenarioKind::Exit => "quit immediately; only the exit status is checked",
            ScenarioKind::Add { .. } => "append a record to the pending list",
            ScenarioKind::Watch => "move the first pending record to the processed list",
            ScenarioKind::Delete => "drop the first pending record",
            ScenarioKind::History => "print the processed list",
            ScenarioKind::Recent => "print the most recent processed record",
            ScenarioKind::Queue => "print the pending list",
            ScenarioKind::Next => "print the next pending record",
            ScenarioKind::MissingFile => "start without list files and compare the transcript",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Result of resolving a requested key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<'a> {
    Found(&'a ScenarioKind),
    Unregistered(String),
}

/// Registry entry as listed by `--list`
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioInfo {
    pub key: &'static str,
    pub description: &'static str,
    pub default: bool,
}

/// All known scenarios and the default run order
#[derive(Debug, Clone)]
pub struct Registry {
    scenarios: Vec<ScenarioKind>,
    default_order: Vec<&'static str>,
}

impl Registry {
    pub fn new(config: &HarnessConfig) -> Self {
        let scenarios = vec![
            ScenarioKind::Exit,
            ScenarioKind::Add {
                record: config.scenario.add_record.clone(),
            },
            ScenarioKind::Watch,
            ScenarioKind::Delete,
            ScenarioKind::History,
            ScenarioKind::Recent,
            ScenarioKind::Queue,
            ScenarioKind::Next,
            ScenarioKind::MissingFile,
        ];
        let default_order = vec![
            "exit", "add", "watch", "delete", "history", "recent", "queue", "next",
        ];
        Self {
            scenarios,
            default_order,
        }
    }

    pub fn get(&self, key: &str) -> Option<&ScenarioKind> {
        let key = canonical_key(key);
        self.scenarios.iter().find(|s| s.key() == key)
    }

    pub fn lookup(&self, key: &str) -> Lookup<'_> {
        match self.get(key) {
            Some(scenario) => Lookup::Found(scenario),
            None => Lookup::Unregistered(key.to_string()),
        }
    }

    /// Resolve the requested keys in order, or the default set when none given
    pub fn select(&self, requested: &[String]) -> Vec<Lookup<'_>> {
        if requested.is_empty() {
            self.default_order.iter().map(|key| self.lookup(key)).collect()
        } else {
            requested.iter().map(|key| self.lookup(key)).collect()
        }
    }

    pub fn list(&self) -> Vec<ScenarioInfo> {
        self.scenarios
            .iter()
            .map(|s| ScenarioInfo {
                key: s.key(),
                description: s.description(),
                default: self.default_order.contains(&s.key()),
            })
            .collect()
    }
}
