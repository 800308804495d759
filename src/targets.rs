//! Fixed Autodesk cleanup targets
//!
//! Every path is built from a handful of environment-derived base
//! directories so the lists stay literal while tests can point them at a
//! scratch tree.

use std::path::{Path, PathBuf};

/// Name looked up on PATH for the optional interactive uninstall tool
pub const EXTERNAL_TOOL_NAME: &str = "AdskUninstallHelper";

/// Files in the FLEXnet directory starting with this prefix are Autodesk's
pub const FLEXNET_PREFIX: &str = "adsk";

/// Registry keys removed recursively
pub const REGISTRY_KEYS: [&str; 2] = [
    r"HKEY_LOCAL_MACHINE\SOFTWARE\Autodesk",
    r"HKEY_CURRENT_USER\SOFTWARE\Autodesk",
];

/// Steps the operator has to finish by hand
pub const MANUAL_REMINDERS: [&str; 2] = [
    "Open Control Panel > Programs and Features and uninstall any remaining Autodesk entries.",
    "Uninstall \"Autodesk Genuine Service\" from Settings > Apps > Installed apps.",
];

fn nested(base: &Path, parts: &[&str]) -> PathBuf {
    parts.iter().fold(base.to_path_buf(), |path, part| path.join(part))
}

/// Base directories the target lists are resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseDirs {
    pub program_files: PathBuf,
    pub program_files_x86: PathBuf,
    pub program_data: PathBuf,
    pub local_app_data: PathBuf,
    pub roaming_app_data: PathBuf,
    pub temp: PathBuf,
}

impl BaseDirs {
    /// Places every base directory under one root, for scratch trees
    #[cfg(test)]
    pub fn under(root: &Path) -> Self {
        BaseDirs {
            program_files: root.join("Program Files"),
            program_files_x86: root.join("Program Files (x86)"),
            program_data: root.join("ProgramData"),
            local_app_data: nested(root, &["AppData", "Local"]),
            roaming_app_data: nested(root, &["AppData", "Roaming"]),
            temp: root.join("Temp"),
        }
    }
}

/// A vendor uninstaller launched from a fixed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedExecutable {
    /// Label printed in status lines
    pub label: &'static str,
    pub path: PathBuf,
}

/// The complete, resolved set of things a run touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets {
    pub external_tool: String,
    pub uninstallers: Vec<FixedExecutable>,
    pub temp_dir: PathBuf,
    pub flexnet_dir: PathBuf,
    pub flexnet_prefix: String,
    pub directories: Vec<PathBuf>,
    pub registry_keys: Vec<String>,
    pub reminders: Vec<String>,
}

impl Targets {
    /// Resolves the Autodesk target lists against the given bases
    pub fn autodesk(base: &BaseDirs) -> Self {
        Targets {
            external_tool: EXTERNAL_TOOL_NAME.to_string(),
            uninstallers: vec![
                FixedExecutable {
                    label: "Autodesk Access",
                    path: nested(&base.program_files, &["Autodesk", "AdODIS", "V1", "RemoveODIS.exe"]),
                },
                FixedExecutable {
                    label: "Autodesk Licensing Service",
                    path: nested(
                        &base.program_files_x86,
                        &["Common Files", "Autodesk Shared", "AdskLicensing", "uninstall.exe"],
                    ),
                },
            ],
            temp_dir: base.temp.clone(),
            flexnet_dir: base.program_data.join("FLEXnet"),
            flexnet_prefix: FLEXNET_PREFIX.to_string(),
            directories: vec![
                base.program_files.join("Autodesk"),
                nested(&base.program_files, &["Common Files", "Autodesk Shared"]),
                base.program_files_x86.join("Autodesk"),
                nested(&base.program_files_x86, &["Common Files", "Autodesk Shared"]),
                base.program_data.join("Autodesk"),
                base.local_app_data.join("Autodesk"),
                base.roaming_app_data.join("Autodesk"),
            ],
            registry_keys: REGISTRY_KEYS.iter().map(|k| k.to_string()).collect(),
            reminders: MANUAL_REMINDERS.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autodesk_target_counts() {
        let targets = Targets::autodesk(&BaseDirs::under(Path::new("root")));
        assert_eq!(targets.uninstallers.len(), 2);
        assert_eq!(targets.directories.len(), 7);
        assert_eq!(targets.registry_keys.len(), 2);
        assert_eq!(targets.reminders.len(), 2);
        assert_eq!(targets.flexnet_prefix, "adsk");
    }

    #[test]
    fn test_directories_do_not_overlap() {
        let targets = Targets::autodesk(&BaseDirs::under(Path::new("root")));
        for (i, a) in targets.directories.iter().enumerate() {
            for (j, b) in targets.directories.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a), "{} contains {}", a.display(), b.display());
                }
            }
        }
    }

    #[test]
    fn test_access_remover_lives_in_program_files_autodesk() {
        let targets = Targets::autodesk(&BaseDirs::under(Path::new("root")));
        assert!(targets.uninstallers[0].path.starts_with(&targets.directories[0]));
        assert!(targets.uninstallers[1].path.starts_with(&targets.directories[3]));
    }

    #[test]
    fn test_paths_follow_bases() {
        let base = BaseDirs::under(Path::new("root"));
        let targets = Targets::autodesk(&base);
        assert!(targets.uninstallers[0].path.starts_with(&base.program_files));
        assert!(targets.uninstallers[1].path.starts_with(&base.program_files_x86));
        assert_eq!(targets.temp_dir, base.temp);
        assert_eq!(targets.flexnet_dir, base.program_data.join("FLEXnet"));
    }
}
