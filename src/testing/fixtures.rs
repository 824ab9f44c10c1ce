//! Fixture staging and expected-state derivation
//!
//! Baselines are copied into the work directory before every scenario.
//! Expected state is computed from those copies before the target runs, so a
//! verdict never compares the target's output against itself.

use std::fs;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result, Workspace};

/// An ordered list of records backed by a line-oriented text file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFile {
    records: Vec<String>,
}

impl ListFile {
    /// Split text into records, one per line, line breaks removed
    pub fn parse(text: &str) -> Self {
        Self {
            records: text.lines().map(str::to_string).collect(),
        }
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Ok(Self::parse(&text))
    }

    /// Serialize with every record terminated by `\n`
    pub fn text(&self) -> String {
        self.records.iter().map(|r| format!("{}\n", r)).collect()
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.text())?;
        Ok(())
    }

    pub fn records(&self) -> &[String] {
        &self.records
    }

    pub fn first(&self) -> Option<&str> {
        self.records.first().map(String::as_str)
    }

    pub fn push_back(&mut self, record: impl Into<String>) {
        self.records.push(record.into());
    }

    pub fn push_front(&mut self, record: impl Into<String>) {
        self.records.insert(0, record.into());
    }

    pub fn pop_front(&mut self) -> Option<String> {
        if self.records.is_empty() {
            None
        } else {
            Some(self.records.remove(0))
        }
    }
}

/// How a scenario's expected state follows from the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Operand appended to the pending list
    AppendPending,
    /// First pending record moves to the front of the processed list
    MovePendingToProcessed,
    /// First pending record removed, processed list unchanged
    DropPending,
    /// Whole processed list must appear in the output
    ProcessedFile,
    /// Whole pending list must appear in the output
    PendingFile,
    /// First processed record must appear in the output
    FirstProcessed,
    /// First pending record must appear in the output
    FirstPending,
    /// Working copies removed; output must match the canonical transcript
    MissingFiles,
    /// Only the exit status matters
    ExitStatus,
}

/// One derived list file and the file the target is expected to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListExpectation {
    pub label: &'static str,
    pub expected: PathBuf,
    pub actual: PathBuf,
}

/// Post-condition computed ahead of the target run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    /// Derived list files, each diffed against the target's updated file
    Lists {
        record: String,
        lists: Vec<ListExpectation>,
    },
    /// File whose whole contents must appear in the capture
    ContainsFile(PathBuf),
    /// Record text that must appear in the capture
    ContainsText(String),
    /// Canonical transcript diffed against the given capture
    Transcript { expected: PathBuf, actual: PathBuf },
    ExitOnly,
}

/// Copy the canonical baselines over the working copies
///
/// Fails if a baseline is missing; that is an environment problem, not a
/// scenario failure.
pub fn stage_baseline(ws: &Workspace) -> Result<()> {
    for (source, target) in ws.staging_pairs() {
        if !source.exists() {
            return Err(Error::missing_fixture(&source));
        }
        fs::copy(&source, &target).map_err(|e| Error::copy(&source, &target, e))?;
        tracing::debug!(from = %source.display(), to = %target.display(), "staged baseline");
    }
    Ok(())
}

/// Delete the working copies so the target starts without any state
pub fn remove_working_copies(ws: &Workspace) -> Result<()> {
    for path in [ws.pending(), ws.processed()] {
        if path.exists() {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// First record of a list; a blank first line counts as no record
fn first_record(list: &ListFile, path: &Path) -> Result<String> {
    match list.first() {
        Some(record) if !record.trim().is_empty() => Ok(record.to_string()),
        _ => Err(Error::empty_list(path)),
    }
}

/// Compute the expected artifact for a scenario from the staged working copies
///
/// Derived list files are written next to the working copies as
/// `<base>_<key>.txt`; the working copies themselves are only read.
pub fn derive_expected(
    derivation: Derivation,
    key: &str,
    operand: Option<&str>,
    ws: &Workspace,
) -> Result<Expected> {
    match derivation {
        Derivation::AppendPending => {
            let record = operand
                .ok_or_else(|| Error::MissingOperand(key.to_string()))?
                .to_string();
            let mut pending = ListFile::read(&ws.pending())?;
            pending.push_back(record.clone());

            let expected = ws.expected_pending(key);
            pending.write(&expected)?;

            Ok(Expected::Lists {
                record,
                lists: vec![ListExpectation {
                    label: "pending",
                    expected,
                    actual: ws.pending_updated(),
                }],
            })
        }

        Derivation::MovePendingToProcessed | Derivation::DropPending => {
            let pending_path = ws.pending();
            let mut pending = ListFile::read(&pending_path)?;
            let record = first_record(&pending, &pending_path)?;
            pending.pop_front();

            let mut processed = ListFile::read(&ws.processed())?;
            if derivation == Derivation::MovePendingToProcessed {
                processed.push_front(record.clone());
            }

            let expected_pending = ws.expected_pending(key);
            let expected_processed = ws.expected_processed(key);
            pending.write(&expected_pending)?;
            processed.write(&expected_processed)?;

            Ok(Expected::Lists {
                record,
                lists: vec![
                    ListExpectation {
                        label: "pending",
                        expected: expected_pending,
                        actual: ws.pending_updated(),
                    },
                    ListExpectation {
                        label: "processed",
                        expected: expected_processed,
                        actual: ws.processed_updated(),
                    },
                ],
            })
        }

        Derivation::ProcessedFile => Ok(Expected::ContainsFile(ws.processed())),
        Derivation::PendingFile => Ok(Expected::ContainsFile(ws.pending())),

        Derivation::FirstProcessed => {
            let path = ws.processed();
            first_record(&ListFile::read(&path)?, &path).map(Expected::ContainsText)
        }
        Derivation::FirstPending => {
            let path = ws.pending();
            first_record(&ListFile::read(&path)?, &path).map(Expected::ContainsText)
        }

        Derivation::MissingFiles => Ok(Expected::Transcript {
            expected: ws.missing_transcript(),
            actual: ws.missing_capture(),
        }),

        Derivation::ExitStatus => Ok(Expected::ExitOnly),
    }
}
