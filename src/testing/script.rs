//! Input script construction
//!
//! Turns an operation plus operand into exactly what a user would type at the
//! target's menu. Every script ends with the quit directive so the target
//! cannot sit waiting on stdin.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::common::{Error, Result};

/// A menu operation understood by the target program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Watch,
    Delete,
    History,
    Recent,
    Queue,
    Next,
    Exit,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::Add,
        Operation::Watch,
        Operation::Delete,
        Operation::History,
        Operation::Recent,
        Operation::Queue,
        Operation::Next,
        Operation::Exit,
    ];

    /// Single-character menu directive
    pub fn directive(self) -> char {
        match self {
            Operation::Add => 'a',
            Operation::Watch => 'w',
            Operation::Delete => 'd',
            Operation::History => 'h',
            Operation::Recent => 'r',
            Operation::Queue => 'q',
            Operation::Next => 'n',
            Operation::Exit => 'x',
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Watch => "watch",
            Operation::Delete => "delete",
            Operation::History => "history",
            Operation::Recent => "recent",
            Operation::Queue => "queue",
            Operation::Next => "next",
            Operation::Exit => "exit",
        }
    }

    /// Whether the target prompts for a record after the directive
    pub fn takes_operand(self) -> bool {
        matches!(self, Operation::Add)
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.key() == s)
            .ok_or_else(|| Error::UnknownOperation(s.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The literal stdin contents for one scenario run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    lines: Vec<String>,
}

impl Script {
    /// Build the script for `operation`
    pub fn build(operation: Operation, operand: Option<&str>) -> Result<Self> {
        let mut lines = Vec::with_capacity(3);

        if operation != Operation::Exit {
            lines.push(operation.directive().to_string());
            if operation.takes_operand() {
                let operand =
                    operand.ok_or_else(|| Error::MissingOperand(operation.key().to_string()))?;
                lines.push(operand.to_string());
            }
        }
        lines.push(Operation::Exit.directive().to_string());

        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Script text, one line-break-terminated line per entry
    pub fn text(&self) -> String {
        self.lines.iter().map(|line| format!("{}\n", line)).collect()
    }

    /// Write the script where the driver will redirect stdin from
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.text())?;
        Ok(())
    }
}
