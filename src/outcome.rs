//! Step outcomes and the run report they are collected into

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::LockedFilePolicy;

/// Step of the cleanup sequence a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ExternalTool,
    Uninstaller,
    TempPurge,
    PrefixPurge,
    Directory,
    RegistryKey,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::ExternalTool => "External uninstall tool",
            Step::Uninstaller => "Uninstaller",
            Step::TempPurge => "Temp purge",
            Step::PrefixPurge => "FLEXnet purge",
            Step::Directory => "Directory",
            Step::RegistryKey => "Registry key",
        };
        write!(f, "{}", name)
    }
}

/// Result of acting on a single target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Target existed and was removed (or launched, for executables)
    Removed,
    /// Target did not exist
    NotFound,
    /// Target existed but the action failed
    Failed(String),
    /// Target exists and would be acted on outside dry-run mode
    WouldRemove,
    /// Entry inside a purge that could not be deleted and was left behind
    Skipped(String),
}

impl StepOutcome {
    /// Maps the result of a removal attempt onto an outcome
    pub fn from_attempt<E: fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => StepOutcome::Removed,
            Err(e) => StepOutcome::Failed(e.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }

    /// Bracketed console tag
    pub fn tag(&self) -> &'static str {
        match self {
            StepOutcome::Removed => "[REMOVED]",
            StepOutcome::NotFound => "[NOT FOUND]",
            StepOutcome::Failed(_) => "[FAILED]",
            StepOutcome::WouldRemove => "[DRY RUN]",
            StepOutcome::Skipped(_) => "[SKIPPED]",
        }
    }
}

/// One reported target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Step,
    pub target: String,
    pub outcome: StepOutcome,
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            StepOutcome::Failed(reason) | StepOutcome::Skipped(reason) => {
                write!(f, "{} {}: {} ({})", self.outcome.tag(), self.step, self.target, reason)
            }
            StepOutcome::WouldRemove => {
                write!(f, "{} Would remove {}: {}", self.outcome.tag(), self.step, self.target)
            }
            _ => write!(f, "{} {}: {}", self.outcome.tag(), self.step, self.target),
        }
    }
}

/// Everything a single run reported, in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Whether the run mutated nothing by request
    pub dry_run: bool,
    /// Whether skipped purge entries reach the summary
    pub locked_files: LockedFilePolicy,
    /// Per-target records in execution order
    pub records: Vec<StepRecord>,
}

impl RunReport {
    pub fn new(dry_run: bool, locked_files: LockedFilePolicy) -> Self {
        RunReport {
            started_at: Utc::now(),
            dry_run,
            locked_files,
            records: Vec::new(),
        }
    }

    /// Appends a record and returns a reference to it for printing
    pub fn record(&mut self, step: Step, target: impl Into<String>, outcome: StepOutcome) -> &StepRecord {
        self.records.push(StepRecord {
            step,
            target: target.into(),
            outcome,
        });
        &self.records[self.records.len() - 1]
    }

    /// Records belonging to one step
    #[cfg(test)]
    pub fn for_step(&self, step: Step) -> impl Iterator<Item = &StepRecord> {
        self.records.iter().filter(move |r| r.step == step)
    }

    /// Counts records with the given outcome kind
    pub fn count(&self, pred: impl Fn(&StepOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| pred(&r.outcome)).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cleanup Summary")?;
        writeln!(f, "===============")?;
        writeln!(f, "Started: {}", self.started_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        if self.dry_run {
            writeln!(f, "Mode: dry run")?;
        }
        writeln!(f, "Removed: {}", self.count(|o| *o == StepOutcome::Removed))?;
        writeln!(f, "Not found: {}", self.count(|o| *o == StepOutcome::NotFound))?;
        writeln!(f, "Failed: {}", self.count(StepOutcome::is_failure))?;
        let show_skipped = self.locked_files == LockedFilePolicy::Warn;
        if show_skipped {
            writeln!(f, "Skipped: {}", self.count(|o| matches!(o, StepOutcome::Skipped(_))))?;
        }
        if self.dry_run {
            writeln!(f, "Would remove: {}", self.count(|o| *o == StepOutcome::WouldRemove))?;
        }

        let failures: Vec<&StepRecord> = self.records.iter().filter(|r| r.outcome.is_failure()).collect();
        write_list(f, "Failures:", &failures)?;

        if show_skipped {
            let skipped: Vec<&StepRecord> = self
                .records
                .iter()
                .filter(|r| matches!(r.outcome, StepOutcome::Skipped(_)))
                .collect();
            write_list(f, "Left in place:", &skipped)?;
        }
        Ok(())
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, title: &str, records: &[&StepRecord]) -> fmt::Result {
    if records.is_empty() {
        return Ok(());
    }
    writeln!(f)?;
    writeln!(f, "{}", title)?;
    for record in records.iter().take(20) {
        writeln!(f, "  - {}", record)?;
    }
    if records.len() > 20 {
        writeln!(f, "  ... and {} more", records.len() - 20)?;
    }
    Ok(())
}
