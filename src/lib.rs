//! autotest - black-box regression harness
//!
//! This library drives a stdin-menu program that keeps a pending list and a
//! processed list on disk, and checks the files and transcript it produces.

pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, HarnessConfig, Result, Workspace};
pub use testing::{AggregatePolicy, Registry, RunConfig, RunSummary, Runner};
