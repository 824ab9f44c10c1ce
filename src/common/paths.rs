//! Work directory layout and configuration paths
//!
//! The target program reads and writes fixed file names relative to its
//! working directory. [`Workspace`] owns that naming contract so nothing else
//! builds file names by hand.

use std::path::{Path, PathBuf};

use super::config::HarnessConfig;

/// Name used for the configuration directory
const APP_NAME: &str = "autotest";

/// Config file looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = "autotest.toml";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/autotest/`
/// - macOS: `~/Library/Application Support/autotest/`
/// - Windows: `%APPDATA%\autotest\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the user configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// `<stem>_<key>.<ext>` for a derived artifact, e.g. `movie_queue_add.txt`
pub fn derived_name(base: &str, key: &str) -> String {
    let path = Path::new(base);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| base.to_string());
    match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, key, ext.to_string_lossy()),
        None => format!("{}_{}", stem, key),
    }
}

/// The directory a run operates in, plus every file name the harness touches
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    data_dir: PathBuf,
    executable: PathBuf,
    pending: String,
    processed: String,
    pending_updated: String,
    processed_updated: String,
    baseline_pending: String,
    baseline_processed: String,
    missing_transcript: String,
    missing_capture: String,
}

impl Workspace {
    /// Build a workspace rooted at `root` using the configured file names
    pub fn new(root: impl Into<PathBuf>, config: &HarnessConfig) -> Self {
        let root = root.into();
        let files = &config.files;
        Self {
            data_dir: root.join(&config.paths.data_dir),
            executable: config.paths.executable.clone(),
            root,
            pending: files.pending.clone(),
            processed: files.processed.clone(),
            pending_updated: files.pending_updated.clone(),
            processed_updated: files.processed_updated.clone(),
            baseline_pending: files.baseline_pending.clone(),
            baseline_processed: files.baseline_processed.clone(),
            missing_transcript: files.missing_transcript.clone(),
            missing_capture: files.missing_capture.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Target program as given in the config (relative to the root)
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Resolve a name inside the work directory
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn pending(&self) -> PathBuf {
        self.path(&self.pending)
    }

    pub fn processed(&self) -> PathBuf {
        self.path(&self.processed)
    }

    pub fn pending_updated(&self) -> PathBuf {
        self.path(&self.pending_updated)
    }

    pub fn processed_updated(&self) -> PathBuf {
        self.path(&self.processed_updated)
    }

    pub fn baseline_pending(&self) -> PathBuf {
        self.data_dir.join(&self.baseline_pending)
    }

    pub fn baseline_processed(&self) -> PathBuf {
        self.data_dir.join(&self.baseline_processed)
    }

    pub fn missing_transcript(&self) -> PathBuf {
        self.data_dir.join(&self.missing_transcript)
    }

    pub fn missing_capture(&self) -> PathBuf {
        self.path(&self.missing_capture)
    }

    /// Baseline/working pairs in staging order
    pub fn staging_pairs(&self) -> [(PathBuf, PathBuf); 2] {
        [
            (self.baseline_pending(), self.pending()),
            (self.baseline_processed(), self.processed()),
        ]
    }

    /// Expected pending list for a scenario, e.g. `movie_queue_watch.txt`
    pub fn expected_pending(&self, key: &str) -> PathBuf {
        self.path(&derived_name(&self.pending, key))
    }

    /// Expected processed list for a scenario, e.g. `movie_history_watch.txt`
    pub fn expected_processed(&self, key: &str) -> PathBuf {
        self.path(&derived_name(&self.processed, key))
    }

    /// Input script for a scenario
    pub fn input_script(&self, key: &str) -> PathBuf {
        self.path(&format!("test_input_{}.txt", key))
    }

    /// Captured stdout/stderr for a scenario
    pub fn capture(&self, key: &str) -> PathBuf {
        self.path(&format!("test_output_{}.txt", key))
    }
}
