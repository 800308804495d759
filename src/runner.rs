//! Sequential cleanup runner
//!
//! Runs the fixed step sequence top to bottom. The privilege check and the
//! confirmation prompt are the only places a run can stop; after them every
//! step runs no matter how the previous ones went.

use std::io::Write;
use std::path::Path;

use crate::config::{CleanupConfig, LockedFilePolicy};
use crate::error::CleanupError;
use crate::launcher::ProgramLauncher;
use crate::operator::Operator;
use crate::outcome::{RunReport, Step, StepOutcome};
use crate::purge::{self, Deleter, PurgeStats};
use crate::registry::{RegistryKeyPath, RegistryStore};

const CONFIRM_QUESTION: &str =
    "This removes Autodesk programs, leftover folders and registry keys from this machine. Continue?";

const TOOL_WAIT_MESSAGE: &str = "Finish the uninstall tool, then press Enter to continue...";

/// Drives one cleanup run against injected system access
pub struct CleanupRunner<'a> {
    config: CleanupConfig,
    operator: &'a mut dyn Operator,
    launcher: &'a dyn ProgramLauncher,
    registry: &'a dyn RegistryStore,
    deleter: &'a dyn Deleter,
    console: &'a mut dyn Write,
}

impl<'a> CleanupRunner<'a> {
    pub fn new(
        config: CleanupConfig,
        operator: &'a mut dyn Operator,
        launcher: &'a dyn ProgramLauncher,
        registry: &'a dyn RegistryStore,
        deleter: &'a dyn Deleter,
        console: &'a mut dyn Write,
    ) -> Self {
        CleanupRunner {
            config,
            operator,
            launcher,
            registry,
            deleter,
            console,
        }
    }

    /// Runs every step and returns what each one reported
    pub fn run(&mut self) -> Result<RunReport, CleanupError> {
        let mut report = RunReport::new(self.config.dry_run, self.config.locked_files);

        self.say("=== Autodesk Cleanup ===");

        if !self.config.elevated {
            self.say("[ERROR] Administrator rights are required. Re-run from an elevated prompt.");
            return Err(CleanupError::NotElevated);
        }

        self.confirm()?;

        if self.config.dry_run {
            self.say("[DRY RUN] Nothing will be launched or deleted.");
        }

        self.launch_external_tool(&mut report);
        self.run_uninstallers(&mut report);
        self.purge_temp(&mut report);
        self.purge_flexnet(&mut report);
        self.remove_directories(&mut report);
        self.remove_registry_keys(&mut report);
        self.print_reminders();

        Ok(report)
    }

    fn confirm(&mut self) -> Result<(), CleanupError> {
        if self.config.assume_yes {
            log::info!("confirmation prompt skipped by --yes");
            return Ok(());
        }

        if self.operator.confirm(CONFIRM_QUESTION)? {
            Ok(())
        } else {
            self.say("Cleanup cancelled. Nothing was changed.");
            Err(CleanupError::Declined)
        }
    }

    fn launch_external_tool(&mut self, report: &mut RunReport) {
        self.say("\n=== External Uninstall Tool ===");

        let name = self.config.targets.external_tool.clone();
        let Some(path) = self.launcher.find_on_path(&name) else {
            self.say(format!("{} not found on PATH, skipping.", name));
            report.record(Step::ExternalTool, name, StepOutcome::NotFound);
            return;
        };

        let target = path.display().to_string();
        if self.config.dry_run {
            self.say(format!("[DRY RUN] Would launch {}", target));
            report.record(Step::ExternalTool, target, StepOutcome::WouldRemove);
            return;
        }

        match self.launcher.spawn(&path) {
            Ok(()) => {
                self.say(format!("Launched {}", target));
                if let Err(e) = self.operator.wait_for_enter(TOOL_WAIT_MESSAGE) {
                    log::warn!("could not wait for operator after launching {}: {}", target, e);
                }
                report.record(Step::ExternalTool, target, StepOutcome::Removed);
            }
            Err(e) => {
                let line = report
                    .record(Step::ExternalTool, target, StepOutcome::Failed(e.to_string()))
                    .to_string();
                self.say(line);
            }
        }
    }

    fn run_uninstallers(&mut self, report: &mut RunReport) {
        self.say("\n=== Vendor Uninstallers ===");

        for exe in self.config.targets.uninstallers.clone() {
            let target = exe.path.display().to_string();

            if !exe.path.is_file() {
                self.say(format!("{} uninstaller not found: {}", exe.label, target));
                report.record(Step::Uninstaller, target, StepOutcome::NotFound);
                continue;
            }

            if self.config.dry_run {
                self.say(format!("[DRY RUN] Would run {} uninstaller: {}", exe.label, target));
                report.record(Step::Uninstaller, target, StepOutcome::WouldRemove);
                continue;
            }

            self.say(format!("Running {} uninstaller...", exe.label));
            let outcome = match self.launcher.run_and_wait(&exe.path) {
                Ok(status) => {
                    log::debug!("{} exited with {}", target, status);
                    self.say(format!("{} uninstaller finished.", exe.label));
                    StepOutcome::Removed
                }
                Err(e) => {
                    self.say(format!("[FAILED] {} uninstaller: {}", exe.label, e));
                    StepOutcome::Failed(e.to_string())
                }
            };
            report.record(Step::Uninstaller, target, outcome);
        }
    }

    fn purge_temp(&mut self, report: &mut RunReport) {
        self.say("\n=== Temp Files ===");

        let temp = self.config.targets.temp_dir.clone();
        let target = temp.display().to_string();

        if !temp.is_dir() {
            let line = report.record(Step::TempPurge, target, StepOutcome::NotFound).to_string();
            self.say(line);
            return;
        }

        if self.config.dry_run {
            self.say(format!(
                "[DRY RUN] Would delete {} entries under {}",
                purge::count_entries(&temp),
                target
            ));
            report.record(Step::TempPurge, target, StepOutcome::WouldRemove);
            return;
        }

        let stats = purge::purge_contents(&temp, self.deleter);
        self.report_skipped(Step::TempPurge, &stats, report);

        self.say(format!(
            "Temp files cleaned: {} removed, {} skipped.",
            stats.removed,
            stats.skipped.len()
        ));
        report.record(Step::TempPurge, target, StepOutcome::Removed);
    }

    fn purge_flexnet(&mut self, report: &mut RunReport) {
        self.say("\n=== FLEXnet Licensing Files ===");

        let dir = self.config.targets.flexnet_dir.clone();
        let prefix = self.config.targets.flexnet_prefix.clone();

        if !dir.is_dir() {
            let line = report
                .record(Step::PrefixPurge, dir.display().to_string(), StepOutcome::NotFound)
                .to_string();
            self.say(line);
            return;
        }

        let entries = purge::prefixed_entries(&dir, &prefix);
        if entries.is_empty() {
            let pattern = dir.join(format!("{}*", prefix)).display().to_string();
            let line = report.record(Step::PrefixPurge, pattern, StepOutcome::NotFound).to_string();
            self.say(line);
            return;
        }

        for path in entries {
            let target = path.display().to_string();

            if self.config.dry_run {
                let line = report.record(Step::PrefixPurge, target, StepOutcome::WouldRemove).to_string();
                self.say(line);
                continue;
            }

            let stats = purge::remove_entry(&path, self.deleter);
            if stats.is_clean() {
                let line = report.record(Step::PrefixPurge, target, StepOutcome::Removed).to_string();
                self.say(line);
            } else {
                self.report_skipped(Step::PrefixPurge, &stats, report);
            }
        }
    }

    fn remove_directories(&mut self, report: &mut RunReport) {
        self.say("\n=== Leftover Folders ===");

        for dir in self.config.targets.directories.clone() {
            let target = dir.display().to_string();

            let outcome = if !exists(&dir) {
                StepOutcome::NotFound
            } else if self.config.dry_run {
                StepOutcome::WouldRemove
            } else {
                let stats = purge::remove_entry(&dir, self.deleter);
                for skipped in &stats.skipped {
                    log::debug!("left {}: {}", skipped.path.display(), skipped.reason);
                }
                match stats.skipped.first() {
                    Some(first) if exists(&dir) => StepOutcome::Failed(first.reason.clone()),
                    _ => StepOutcome::Removed,
                }
            };

            let line = report.record(Step::Directory, target, outcome).to_string();
            self.say(line);
        }
    }

    fn remove_registry_keys(&mut self, report: &mut RunReport) {
        self.say("\n=== Registry Keys ===");

        for raw in self.config.targets.registry_keys.clone() {
            let outcome = match raw.parse::<RegistryKeyPath>() {
                Ok(key) => self.remove_registry_key(&key),
                Err(e) => StepOutcome::Failed(e.to_string()),
            };

            let line = report.record(Step::RegistryKey, raw, outcome).to_string();
            self.say(line);
        }
    }

    fn remove_registry_key(&self, key: &RegistryKeyPath) -> StepOutcome {
        match self.registry.key_exists(key) {
            Ok(false) => StepOutcome::NotFound,
            Ok(true) if self.config.dry_run => StepOutcome::WouldRemove,
            Ok(true) => StepOutcome::from_attempt(self.registry.delete_tree(key)),
            Err(e) => StepOutcome::Failed(e.to_string()),
        }
    }

    fn print_reminders(&mut self) {
        self.say("\n=== Manual Steps ===");

        for (i, reminder) in self.config.targets.reminders.clone().iter().enumerate() {
            self.say(format!("{}. {}", i + 1, reminder));
        }

        self.say("\nCleanup finished.");
    }

    /// Records entries a purge left behind; only the `Warn` policy shows them
    fn report_skipped(&mut self, step: Step, stats: &PurgeStats, report: &mut RunReport) {
        for skipped in &stats.skipped {
            let line = report
                .record(
                    step,
                    skipped.path.display().to_string(),
                    StepOutcome::Skipped(skipped.reason.clone()),
                )
                .to_string();

            match self.config.locked_files {
                LockedFilePolicy::Warn => self.say(format!("[WARN] {}", line)),
                LockedFilePolicy::Silent => log::debug!("skipped {}", line),
            }
        }
    }

    fn say(&mut self, line: impl AsRef<str>) {
        // A closed console must not stop the cleanup
        let _ = writeln!(self.console, "{}", line.as_ref());
    }
}

fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
