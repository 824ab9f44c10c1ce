//! Configuration file handling
//!
//! Every value has a default matching the stock project layout, so running
//! without a config file is the normal case.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::{config_path, LOCAL_CONFIG_FILE};
use super::{Error, Result};
use crate::testing::scenario::canonical_key;
use crate::testing::AggregatePolicy;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct HarnessConfig {
    /// Directory layout and target executable
    #[serde(default)]
    pub paths: PathsConfig,

    /// Fixture and working-copy file names
    #[serde(default)]
    pub files: FilesConfig,

    /// Scenario operands
    #[serde(default)]
    pub scenario: ScenarioConfig,

    /// Exit code classification
    #[serde(default)]
    pub exit: ExitCodes,

    /// Run behaviour
    #[serde(default)]
    pub run: RunSettings,

    /// Extra output checks attached to scenarios
    #[serde(default)]
    pub checks: Vec<OutputCheck>,
}

/// Directory layout
#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    /// Project directory containing the build output
    #[serde(default = "default_project")]
    pub project: PathBuf,

    /// Build output directory inside the project
    #[serde(default = "default_build")]
    pub build: PathBuf,

    /// Where cleanup returns to, relative to the build directory
    #[serde(default = "default_parent")]
    pub parent: PathBuf,

    /// Baseline fixture directory, relative to the work directory
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Target program, relative to the work directory
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            project: default_project(),
            build: default_build(),
            parent: default_parent(),
            data_dir: default_data_dir(),
            executable: default_executable(),
        }
    }
}

impl PathsConfig {
    /// `<project>/<build>`, the directory setup enters
    pub fn test_dir(&self) -> PathBuf {
        self.project.join(&self.build)
    }
}

fn default_project() -> PathBuf {
    PathBuf::from("Stack_Project_AutoTest")
}
fn default_build() -> PathBuf {
    PathBuf::from("build")
}
fn default_parent() -> PathBuf {
    PathBuf::from("../..")
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("..")
}
fn default_executable() -> PathBuf {
    PathBuf::from("./main")
}

/// File names the target program is hard-coded to read and write
#[derive(Debug, Deserialize, Clone)]
pub struct FilesConfig {
    /// Canonical pending baseline in `data_dir`
    #[serde(default = "default_baseline_pending")]
    pub baseline_pending: String,

    /// Canonical processed baseline in `data_dir`
    #[serde(default = "default_baseline_processed")]
    pub baseline_processed: String,

    /// Working pending list read by the target
    #[serde(default = "default_pending")]
    pub pending: String,

    /// Working processed list read by the target
    #[serde(default = "default_processed")]
    pub processed: String,

    /// Pending list written by the target on exit
    #[serde(default = "default_pending_updated")]
    pub pending_updated: String,

    /// Processed list written by the target on exit
    #[serde(default = "default_processed_updated")]
    pub processed_updated: String,

    /// Canonical transcript for the missing-file scenario, in `data_dir`
    #[serde(default = "default_missing_transcript")]
    pub missing_transcript: String,

    /// Capture file for the missing-file scenario
    #[serde(default = "default_missing_capture")]
    pub missing_capture: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            baseline_pending: default_baseline_pending(),
            baseline_processed: default_baseline_processed(),
            pending: default_pending(),
            processed: default_processed(),
            pending_updated: default_pending_updated(),
            processed_updated: default_processed_updated(),
            missing_transcript: default_missing_transcript(),
            missing_capture: default_missing_capture(),
        }
    }
}

fn default_baseline_pending() -> String {
    "AutoTest_movie_queue.txt".to_string()
}
fn default_baseline_processed() -> String {
    "AutoTest_movie_history.txt".to_string()
}
fn default_pending() -> String {
    "movie_queue.txt".to_string()
}
fn default_processed() -> String {
    "movie_history.txt".to_string()
}
fn default_pending_updated() -> String {
    "movie_queue_updated.txt".to_string()
}
fn default_processed_updated() -> String {
    "movie_history_updated.txt".to_string()
}
fn default_missing_transcript() -> String {
    "AutoTest_main_missing_file.txt".to_string()
}
fn default_missing_capture() -> String {
    "test_main_missing_file.txt".to_string()
}

/// Scenario operands
#[derive(Debug, Deserialize, Clone)]
pub struct ScenarioConfig {
    /// Record appended by the add scenario
    #[serde(default = "default_add_record")]
    pub add_record: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            add_record: default_add_record(),
        }
    }
}

fn default_add_record() -> String {
    "Black Widow".to_string()
}

/// Exit code classification settings
#[derive(Debug, Deserialize, Clone)]
pub struct ExitCodes {
    /// Codes counted as a successful run of the target
    #[serde(default = "default_accepted")]
    pub accepted: Vec<i32>,

    /// Code reported for signal termination (SIGSEGV under a shell)
    #[serde(default = "default_crash_code")]
    pub crash_code: i32,

    /// Code reported for an uncaught runtime fault (SIGABRT under a shell)
    #[serde(default = "default_fault_code")]
    pub fault_code: i32,
}

impl Default for ExitCodes {
    fn default() -> Self {
        Self {
            accepted: default_accepted(),
            crash_code: default_crash_code(),
            fault_code: default_fault_code(),
        }
    }
}

fn default_accepted() -> Vec<i32> {
    vec![0]
}
fn default_crash_code() -> i32 {
    139
}
fn default_fault_code() -> i32 {
    134
}

/// Run behaviour
#[derive(Debug, Deserialize, Clone)]
pub struct RunSettings {
    /// Per-scenario limit on the target's run time
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How scenario verdicts fold into the process exit status
    #[serde(default)]
    pub policy: AggregatePolicy,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            policy: AggregatePolicy::default(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// An extra assertion on a scenario's captured output
#[derive(Debug, Deserialize, Clone)]
pub struct OutputCheck {
    /// Scenario key the check belongs to
    pub scenario: String,
    /// Expected substring in output
    pub contains: Option<String>,
    /// Expected regular expression match in output
    pub pattern: Option<String>,
}

impl HarnessConfig {
    /// Load configuration
    ///
    /// An explicit path must exist. Otherwise `./autotest.toml` and then the
    /// user config file are tried, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file '{}' does not exist",
                    path.display()
                )));
            }
            return Self::from_file(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(&local);
        }

        if let Some(path) = config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Parse a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Self::from_toml(&content)
    }

    /// Parse config from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Output checks registered for a scenario key, `test_` prefix optional
    pub fn checks_for<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a OutputCheck> + 'a {
        let key = canonical_key(key);
        self.checks
            .iter()
            .filter(move |c| canonical_key(&c.scenario) == key)
    }
}
