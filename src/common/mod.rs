//! Common utilities shared by the CLI and the scenario engine

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use config::HarnessConfig;
pub use error::{Error, Result};
pub use paths::Workspace;
