//! Best-effort filesystem deletion
//!
//! Every walk here keeps going past entries it cannot delete. A directory
//! is only removed once everything under it is gone, so one locked file
//! never takes its siblings down with it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Filesystem deletion primitives used by the purge walks
pub trait Deleter {
    /// Deletes a single file (or symlink), clearing a read-only flag first
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Deletes a directory that is already empty, or a directory link
    /// (symlink or junction) without following it
    fn remove_empty_dir(&self, path: &Path) -> io::Result<()>;
}

/// Deleter backed by `std::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct StdDeleter;

impl Deleter for StdDeleter {
    fn remove_file(&self, path: &Path) -> io::Result<()> {
        clear_readonly(path);
        fs::remove_file(path)
    }

    fn remove_empty_dir(&self, path: &Path) -> io::Result<()> {
        clear_readonly(path);
        fs::remove_dir(path)
    }
}

#[cfg(windows)]
fn clear_readonly(path: &Path) {
    if let Ok(metadata) = fs::symlink_metadata(path) {
        let mut perms = metadata.permissions();
        if perms.readonly() {
            #[allow(clippy::permissions_set_readonly_false)]
            perms.set_readonly(false);
            let _ = fs::set_permissions(path, perms);
        }
    }
}

#[cfg(not(windows))]
fn clear_readonly(_path: &Path) {}

/// An entry the walk could not delete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Tally of one purge walk
#[derive(Debug, Default, Clone)]
pub struct PurgeStats {
    /// Entries deleted (files and directories)
    pub removed: usize,
    /// Entries left behind, with the error that stopped each
    pub skipped: Vec<SkippedEntry>,
}

impl PurgeStats {
    fn skip(&mut self, path: &Path, err: io::Error) {
        self.skipped.push(SkippedEntry {
            path: path.to_path_buf(),
            reason: err.to_string(),
        });
    }

    fn merge(&mut self, other: PurgeStats) {
        self.removed += other.removed;
        self.skipped.extend(other.skipped);
    }

    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Deletes everything inside `dir`, leaving `dir` itself in place
pub fn purge_contents(dir: &Path, deleter: &dyn Deleter) -> PurgeStats {
    let mut stats = PurgeStats::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            stats.skip(dir, e);
            return stats;
        }
    };

    for entry in entries {
        match entry {
            Ok(entry) => stats.merge(remove_entry(&entry.path(), deleter)),
            Err(e) => stats.skip(dir, e),
        }
    }

    stats
}

/// Deletes `path` and, for a directory, everything beneath it
pub fn remove_entry(path: &Path, deleter: &dyn Deleter) -> PurgeStats {
    let mut stats = PurgeStats::default();

    let file_type = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata.file_type(),
        Err(e) => {
            stats.skip(path, e);
            return stats;
        }
    };

    if is_dir_link(&file_type) {
        match deleter.remove_empty_dir(path) {
            Ok(()) => stats.removed += 1,
            Err(e) => stats.skip(path, e),
        }
        return stats;
    }

    if !file_type.is_dir() {
        match deleter.remove_file(path) {
            Ok(()) => stats.removed += 1,
            Err(e) => stats.skip(path, e),
        }
        return stats;
    }

    stats.merge(purge_contents(path, deleter));

    // A directory holding skipped entries cannot be empty; only its
    // children are worth reporting.
    if stats.is_clean() {
        match deleter.remove_empty_dir(path) {
            Ok(()) => stats.removed += 1,
            Err(e) => stats.skip(path, e),
        }
    }

    stats
}

/// Directory symlinks and junctions on Windows are removed with
/// `RemoveDirectory`, never walked. Elsewhere a link is a plain file.
#[cfg(windows)]
fn is_dir_link(file_type: &fs::FileType) -> bool {
    use std::os::windows::fs::FileTypeExt;
    file_type.is_symlink_dir()
}

#[cfg(not(windows))]
fn is_dir_link(_file_type: &fs::FileType) -> bool {
    false
}

/// Lists the entries of `dir` whose name starts with `prefix`, ignoring
/// ASCII case the way Windows name matching does
pub fn prefixed_entries(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let prefix = prefix.to_ascii_lowercase();
    let mut matches = Vec::new();

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_ascii_lowercase();
            if name.starts_with(&prefix) {
                matches.push(entry.path());
            }
        }
    }

    matches.sort();
    matches
}

/// Counts the entries directly inside `dir`
pub fn count_entries(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.flatten().count()).unwrap_or(0)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Refuses to delete files with the listed names, like a file held open
    /// by another process on Windows
    pub(crate) struct LockingDeleter {
        pub locked: Vec<String>,
        pub attempts: RefCell<Vec<PathBuf>>,
    }

    impl LockingDeleter {
        pub(crate) fn new(locked: &[&str]) -> Self {
            LockingDeleter {
                locked: locked.iter().map(|s| s.to_string()).collect(),
                attempts: RefCell::new(Vec::new()),
            }
        }
    }

    impl Deleter for LockingDeleter {
        fn remove_file(&self, path: &Path) -> io::Result<()> {
            self.attempts.borrow_mut().push(path.to_path_buf());
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            if self.locked.contains(&name) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "file is in use by another process",
                ));
            }
            StdDeleter.remove_file(path)
        }

        fn remove_empty_dir(&self, path: &Path) -> io::Result<()> {
            StdDeleter.remove_empty_dir(path)
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_purge_contents_keeps_root() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.txt"));
        touch(&tmp.path().join("nested/deeper/b.tmp"));

        let stats = purge_contents(tmp.path(), &StdDeleter);

        assert!(stats.is_clean());
        assert_eq!(stats.removed, 4);
        assert!(tmp.path().exists());
        assert_eq!(count_entries(tmp.path()), 0);
    }

    #[test]
    fn test_locked_file_does_not_stop_siblings() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.txt"));
        touch(&tmp.path().join("b.tmp"));
        touch(&tmp.path().join("c.lock"));

        let deleter = LockingDeleter::new(&["c.lock"]);
        let stats = purge_contents(tmp.path(), &deleter);

        assert!(!tmp.path().join("a.txt").exists());
        assert!(!tmp.path().join("b.tmp").exists());
        assert!(tmp.path().join("c.lock").exists());
        assert_eq!(stats.removed, 2);
        assert_eq!(stats.skipped.len(), 1);
        assert!(stats.skipped[0].path.ends_with("c.lock"));
        assert_eq!(deleter.attempts.borrow().len(), 3);
    }

    #[test]
    fn test_locked_file_in_subdir_keeps_only_its_parent() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("busy/c.lock"));
        touch(&tmp.path().join("busy/other.txt"));
        touch(&tmp.path().join("idle/d.txt"));

        let stats = purge_contents(tmp.path(), &LockingDeleter::new(&["c.lock"]));

        assert!(tmp.path().join("busy/c.lock").exists());
        assert!(!tmp.path().join("busy/other.txt").exists());
        assert!(!tmp.path().join("idle").exists());
        // Only the locked file is reported, not the directory holding it
        assert_eq!(stats.skipped.len(), 1);
    }

    #[test]
    fn test_remove_entry_tree() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("Autodesk");
        touch(&target.join("AutoCAD 2024/acad.exe"));
        touch(&target.join("readme.txt"));

        let stats = remove_entry(&target, &StdDeleter);

        assert!(stats.is_clean());
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_dir_link_is_removed_without_following() {
        let tmp = TempDir::new().unwrap();
        let real = tmp.path().join("real");
        touch(&real.join("keep.dat"));
        let link = tmp.path().join("Temp").join("redirected");
        fs::create_dir_all(link.parent().unwrap()).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let stats = purge_contents(&tmp.path().join("Temp"), &StdDeleter);

        assert!(stats.is_clean());
        assert_eq!(stats.removed, 1);
        assert!(link.symlink_metadata().is_err());
        assert!(real.join("keep.dat").exists());
    }

    #[cfg(windows)]
    #[test]
    fn test_dir_link_kind_is_detected() {
        let tmp = TempDir::new().unwrap();
        let real = tmp.path().join("real");
        touch(&real.join("keep.dat"));
        let link = tmp.path().join("redirected");
        // Creating directory symlinks needs developer mode or elevation
        if std::os::windows::fs::symlink_dir(&real, &link).is_err() {
            return;
        }

        assert!(is_dir_link(&fs::symlink_metadata(&link).unwrap().file_type()));
        assert!(remove_entry(&link, &StdDeleter).is_clean());
        assert!(link.symlink_metadata().is_err());
        assert!(real.join("keep.dat").exists());
    }

    #[test]
    fn test_remove_entry_missing_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let stats = remove_entry(&tmp.path().join("gone"), &StdDeleter);
        assert_eq!(stats.removed, 0);
        assert_eq!(stats.skipped.len(), 1);
    }

    #[test]
    fn test_prefixed_entries_match_case_insensitively() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("adskflex_00691b00_tsf.data"));
        touch(&tmp.path().join("ADSK_backup.data"));
        touch(&tmp.path().join("adskdir/inner.dat"));
        touch(&tmp.path().join("FNP_Act_Installer.dll"));
        touch(&tmp.path().join("other_adsk.data"));

        let entries = prefixed_entries(tmp.path(), "adsk");
        assert_eq!(entries.len(), 3);

        for path in &entries {
            assert!(remove_entry(path, &StdDeleter).is_clean());
        }

        assert!(!tmp.path().join("adskflex_00691b00_tsf.data").exists());
        assert!(!tmp.path().join("ADSK_backup.data").exists());
        assert!(!tmp.path().join("adskdir").exists());
        assert!(tmp.path().join("FNP_Act_Installer.dll").exists());
        assert!(tmp.path().join("other_adsk.data").exists());
    }

    #[test]
    fn test_prefixed_entries_missing_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(prefixed_entries(&tmp.path().join("FLEXnet"), "adsk").is_empty());
    }
}
