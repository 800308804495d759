//! Run configuration
//!
//! Everything the runner would otherwise read ad hoc from the process
//! (elevation, environment-derived paths, operator flags) lives here.

use serde::{Deserialize, Serialize};
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::targets::{BaseDirs, Targets};

/// What to do when a per-entry deletion fails during a purge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LockedFilePolicy {
    /// Skip the entry without telling the operator
    #[default]
    Silent,
    /// Skip the entry and print a warning line
    Warn,
}

/// Configuration handed to the cleanup runner
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Whether the process holds administrative rights
    pub elevated: bool,
    /// Report only, mutate nothing
    pub dry_run: bool,
    /// Treat the confirmation prompt as answered "yes"
    pub assume_yes: bool,
    /// Reporting policy for locked entries during purges
    pub locked_files: LockedFilePolicy,
    /// Resolved target lists
    pub targets: Targets,
}

impl CleanupConfig {
    /// Creates a configuration over explicit targets with every flag off
    pub fn new(targets: Targets) -> Self {
        CleanupConfig {
            elevated: false,
            dry_run: false,
            assume_yes: false,
            locked_files: LockedFilePolicy::default(),
            targets,
        }
    }

    /// Resolves the Autodesk targets from the current environment
    pub fn from_env() -> Self {
        Self::new(Targets::autodesk(&base_dirs_from_env()))
    }

    #[must_use]
    pub fn with_elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn with_assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    #[must_use]
    pub fn with_locked_files(mut self, policy: LockedFilePolicy) -> Self {
        self.locked_files = policy;
        self
    }
}

/// Reads the base directories from the environment, falling back to the
/// stock Windows locations when a variable is missing
pub fn base_dirs_from_env() -> BaseDirs {
    resolve_base_dirs(|name| env::var_os(name))
}

fn resolve_base_dirs<F>(lookup: F) -> BaseDirs
where
    F: Fn(&str) -> Option<OsString>,
{
    let var_or = |name: &str, fallback: &str| -> PathBuf {
        lookup(name)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(fallback))
    };

    let user_profile = var_or("USERPROFILE", r"C:\Users\Default");

    BaseDirs {
        program_files: var_or("ProgramFiles", r"C:\Program Files"),
        program_files_x86: var_or("ProgramFiles(x86)", r"C:\Program Files (x86)"),
        program_data: var_or("ProgramData", r"C:\ProgramData"),
        local_app_data: lookup("LOCALAPPDATA")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| user_profile.join(r"AppData\Local")),
        roaming_app_data: lookup("APPDATA")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(dirs::data_dir)
            .unwrap_or_else(|| user_profile.join(r"AppData\Roaming")),
        temp: env::temp_dir(),
    }
}
