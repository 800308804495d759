//! External program lookup and launch

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

/// Runs external programs on behalf of the cleanup steps
pub trait ProgramLauncher {
    /// Finds a program by name on the command search path
    fn find_on_path(&self, name: &str) -> Option<PathBuf>;

    /// Starts a program without waiting for it
    fn spawn(&self, program: &Path) -> io::Result<()>;

    /// Starts a program and blocks until it exits
    fn run_and_wait(&self, program: &Path) -> io::Result<ExitStatus>;
}

/// Launcher backed by the real process table
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl ProgramLauncher for SystemLauncher {
    fn find_on_path(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    fn spawn(&self, program: &Path) -> io::Result<()> {
        let child = Command::new(program).spawn()?;
        log::debug!("started {} (pid {})", program.display(), child.id());
        Ok(())
    }

    fn run_and_wait(&self, program: &Path) -> io::Result<ExitStatus> {
        Command::new(program).status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_not_found() {
        let launcher = SystemLauncher;
        assert!(launcher.find_on_path("adsk-purge-no-such-tool-3f9c").is_none());
    }

    #[test]
    fn test_run_missing_path_errors() {
        let launcher = SystemLauncher;
        let err = launcher
            .run_and_wait(Path::new("/definitely/not/here/uninstall.exe"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    /// Writes an executable shell script that exits with `code`
    #[cfg(unix)]
    fn exit_script(dir: &Path, code: i32) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(format!("exit{}.sh", code));
        std::fs::write(&path, format!("#!/bin/sh\nexit {}\n", code)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Runs `program`, retrying while another test thread's fork still holds
    /// the freshly written script open
    #[cfg(unix)]
    fn run_script(program: &Path) -> ExitStatus {
        let mut attempts = 0;
        loop {
            match SystemLauncher.run_and_wait(program) {
                Err(e) if e.raw_os_error() == Some(libc::ETXTBSY) && attempts < 20 => {
                    attempts += 1;
                    std::thread::sleep(std::time::Duration::from_millis(50));
                }
                result => return result.unwrap(),
            }
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_run_and_wait_returns_status() {
        let tmp = tempfile::TempDir::new().unwrap();

        assert!(run_script(&exit_script(tmp.path(), 0)).success());

        let status = run_script(&exit_script(tmp.path(), 3));
        assert!(!status.success());
        assert_eq!(status.code(), Some(3));
    }
}
