//! Error types for the cleanup run
//!
//! Only the conditions that stop a run before any mutation are errors.
//! Failed deletions are recorded as step outcomes instead.

use std::io;
use thiserror::Error;

/// Conditions that abort the run before any cleanup step executes
#[derive(Debug, Error)]
pub enum CleanupError {
    /// The process does not hold administrative rights
    #[error("administrator rights are required; re-run from an elevated prompt")]
    NotElevated,

    /// The operator did not confirm the cleanup
    #[error("cleanup cancelled by operator")]
    Declined,

    /// Reading the operator's answer failed
    #[error("failed to read operator input: {0}")]
    Prompt(#[from] io::Error),
}

/// A registry key string that cannot be mapped onto a hive and subkey
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryPathError {
    #[error("unknown registry hive in '{0}'")]
    UnknownHive(String),

    #[error("registry path '{0}' has no subkey")]
    MissingSubkey(String),
}
