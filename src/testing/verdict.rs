//! Verdict engine
//!
//! Four comparison predicates over files the target produced, plus exit code
//! classification. Every predicate works on observable output only.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use regex::Regex;
use serde::Serialize;
use similar::TextDiff;

use crate::common::config::ExitCodes;
use crate::common::{Error, Result};

/// Exit code the driver reports when it had to kill a hung target
pub const TIMEOUT_CODE: i32 = 124;

/// Status `diff` uses when it could not compare at all
const TROUBLE_CODE: i32 = 2;

/// Expected/actual pair rendered on failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub summary: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary)?;
        writeln!(f, "\nExpected:\n{}", self.expected)?;
        write!(f, "\nActual:\n{}", self.actual)
    }
}

/// Outcome of a single predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub passed: bool,
    pub code: i32,
    pub message: String,
    pub diagnostic: Option<Diagnostic>,
}

impl Check {
    fn pass(message: String) -> Self {
        Self {
            passed: true,
            code: 0,
            message,
            diagnostic: None,
        }
    }

    fn fail(message: String, diagnostic: Diagnostic) -> Self {
        Self {
            passed: false,
            code: 1,
            message,
            diagnostic: Some(diagnostic),
        }
    }

    fn trouble(message: String) -> Self {
        Self {
            passed: false,
            code: TROUBLE_CODE,
            message,
            diagnostic: None,
        }
    }
}

/// Read a file for comparison; a missing file is a failed check, not an error
fn read_for_check(path: &Path) -> std::result::Result<String, Check> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(Check::trouble(format!("{} not found", path.display())))
        }
        Err(e) => Err(Check::trouble(format!(
            "{} could not be read: {}",
            path.display(),
            e
        ))),
    }
}

/// Lowercase, collapse whitespace runs, drop blank lines
///
/// Same rules as `diff -b`: trailing whitespace is ignored and runs shrink to
/// one space, but a line that starts with whitespace still differs from one
/// that does not.
fn normalize(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let body = line
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            if line.starts_with(char::is_whitespace) {
                format!(" {}", body)
            } else {
                body
            }
        })
        .collect()
}

/// Compare two texts ignoring case, blank lines and whitespace changes
pub fn texts_equivalent(expected: &str, actual: &str) -> bool {
    normalize(expected) == normalize(actual)
}

/// Equivalence diff between an expected and an actual file
pub fn diff_files(expected: &Path, actual: &Path) -> Check {
    let expected_text = match read_for_check(expected) {
        Ok(text) => text,
        Err(check) => return check,
    };
    let actual_text = match read_for_check(actual) {
        Ok(text) => text,
        Err(check) => return check,
    };

    if texts_equivalent(&expected_text, &actual_text) {
        return Check::pass(format!(
            "{} matches {}",
            actual.display(),
            expected.display()
        ));
    }

    let left = normalize(&expected_text).join("\n") + "\n";
    let right = normalize(&actual_text).join("\n") + "\n";
    let expected_name = expected.display().to_string();
    let actual_name = actual.display().to_string();
    let unified = TextDiff::from_lines(&left, &right)
        .unified_diff()
        .context_radius(3)
        .header(&expected_name, &actual_name)
        .to_string();

    Check::fail(
        format!("{} differs from {}", actual.display(), expected.display()),
        Diagnostic {
            summary: unified,
            expected: expected_text,
            actual: actual_text,
        },
    )
}

/// Pass iff the whole contents of `needle` appear verbatim in `haystack`
pub fn file_contains_file(haystack: &Path, needle: &Path) -> Check {
    let haystack_text = match read_for_check(haystack) {
        Ok(text) => text,
        Err(check) => return check,
    };
    let needle_text = match read_for_check(needle) {
        Ok(text) => text,
        Err(check) => return check,
    };

    if haystack_text.contains(&needle_text) {
        Check::pass(format!("{} found in {}", needle.display(), haystack.display()))
    } else {
        Check::fail(
            format!("{} not found in {}", needle.display(), haystack.display()),
            Diagnostic {
                summary: format!("contents of {}", needle.display()),
                expected: needle_text,
                actual: haystack_text,
            },
        )
    }
}

/// Pass iff `needle` is a substring of the file
pub fn file_contains_str(haystack: &Path, needle: &str) -> Check {
    let haystack_text = match read_for_check(haystack) {
        Ok(text) => text,
        Err(check) => return check,
    };

    if haystack_text.contains(needle) {
        Check::pass(format!("{} found in {}", needle, haystack.display()))
    } else {
        Check::fail(
            format!("\"{}\" not found in {}", needle, haystack.display()),
            Diagnostic {
                summary: format!("substring \"{}\"", needle),
                expected: needle.to_string(),
                actual: haystack_text,
            },
        )
    }
}

/// Compile a pattern for [`file_matches`]
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Pass iff `pattern` matches somewhere in the file
pub fn file_matches(haystack: &Path, pattern: &Regex) -> Check {
    let haystack_text = match read_for_check(haystack) {
        Ok(text) => text,
        Err(check) => return check,
    };

    if pattern.is_match(&haystack_text) {
        Check::pass(format!(
            "Regex \"{}\" found in {}",
            pattern.as_str(),
            haystack.display()
        ))
    } else {
        Check::fail(
            format!(
                "Regex \"{}\" not found in {}",
                pattern.as_str(),
                haystack.display()
            ),
            Diagnostic {
                summary: format!("pattern \"{}\"", pattern.as_str()),
                expected: format!("Regex {}", pattern.as_str()),
                actual: haystack_text,
            },
        )
    }
}

/// How the target's exit code is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "class", content = "code", rename_all = "snake_case")]
pub enum ExitClass {
    Success(i32),
    /// Killed by a fatal signal (segmentation fault)
    Crash(i32),
    /// Uncaught runtime fault (abort)
    Fault(i32),
    /// Killed by the harness after the timeout
    Timeout(i32),
    Failure(i32),
}

impl ExitClass {
    pub fn classify(code: i32, codes: &ExitCodes) -> Self {
        if code == codes.crash_code {
            ExitClass::Crash(code)
        } else if code == codes.fault_code {
            ExitClass::Fault(code)
        } else if code == TIMEOUT_CODE {
            ExitClass::Timeout(code)
        } else if codes.accepted.contains(&code) {
            ExitClass::Success(code)
        } else {
            ExitClass::Failure(code)
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitClass::Success(_))
    }

    pub fn code(self) -> i32 {
        match self {
            ExitClass::Success(c)
            | ExitClass::Crash(c)
            | ExitClass::Fault(c)
            | ExitClass::Timeout(c)
            | ExitClass::Failure(c) => c,
        }
    }
}

impl fmt::Display for ExitClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitClass::Success(c) => write!(f, "rc = {}", c),
            ExitClass::Crash(_) => write!(f, "Segmentation Fault"),
            ExitClass::Fault(_) => write!(f, "Uncaught Exception"),
            ExitClass::Timeout(_) => write!(f, "Timed out"),
            ExitClass::Failure(c) => write!(f, "rc = {}", c),
        }
    }
}
