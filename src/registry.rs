//! Registry key removal
//!
//! Keys are written as `HIVE\sub\key` strings. The hive accepts either the
//! long `HKEY_*` name or the short `HKLM`/`HKCU` form, optionally followed
//! by a colon as PowerShell writes it.
//!
//! Deleting a key is recursive: the key and every subkey and value under it
//! are removed in one call.

use std::fmt;
use std::io;
use std::str::FromStr;

use crate::error::RegistryPathError;

/// Top-level registry hive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hive {
    LocalMachine,
    CurrentUser,
    ClassesRoot,
    Users,
}

impl Hive {
    fn parse(name: &str) -> Option<Self> {
        match name.trim_end_matches(':').to_ascii_uppercase().as_str() {
            "HKEY_LOCAL_MACHINE" | "HKLM" => Some(Hive::LocalMachine),
            "HKEY_CURRENT_USER" | "HKCU" => Some(Hive::CurrentUser),
            "HKEY_CLASSES_ROOT" | "HKCR" => Some(Hive::ClassesRoot),
            "HKEY_USERS" | "HKU" => Some(Hive::Users),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Hive::LocalMachine => "HKEY_LOCAL_MACHINE",
            Hive::CurrentUser => "HKEY_CURRENT_USER",
            Hive::ClassesRoot => "HKEY_CLASSES_ROOT",
            Hive::Users => "HKEY_USERS",
        }
    }
}

/// A registry key split into hive and subkey
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKeyPath {
    pub hive: Hive,
    pub subkey: String,
}

impl FromStr for RegistryKeyPath {
    type Err = RegistryPathError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let (hive_name, rest) = match path.split_once('\\') {
            Some((hive, rest)) => (hive, rest),
            None => (path, ""),
        };

        let hive = Hive::parse(hive_name).ok_or_else(|| RegistryPathError::UnknownHive(path.to_string()))?;

        let subkey = rest.trim_matches('\\');
        if subkey.is_empty() {
            return Err(RegistryPathError::MissingSubkey(path.to_string()));
        }

        Ok(RegistryKeyPath {
            hive,
            subkey: subkey.to_string(),
        })
    }
}

impl fmt::Display for RegistryKeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, r"{}\{}", self.hive.name(), self.subkey)
    }
}

/// Access to the registry keys a run removes
pub trait RegistryStore {
    /// Whether the key is present
    fn key_exists(&self, key: &RegistryKeyPath) -> io::Result<bool>;

    /// Deletes the key with all of its subkeys and values
    fn delete_tree(&self, key: &RegistryKeyPath) -> io::Result<()>;
}

/// The Windows registry, through `winreg`
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct WinRegistry;

#[cfg(windows)]
impl WinRegistry {
    fn root(hive: Hive) -> winreg::RegKey {
        use winreg::enums::*;

        let hkey = match hive {
            Hive::LocalMachine => HKEY_LOCAL_MACHINE,
            Hive::CurrentUser => HKEY_CURRENT_USER,
            Hive::ClassesRoot => HKEY_CLASSES_ROOT,
            Hive::Users => HKEY_USERS,
        };
        winreg::RegKey::predef(hkey)
    }
}

#[cfg(windows)]
impl RegistryStore for WinRegistry {
    fn key_exists(&self, key: &RegistryKeyPath) -> io::Result<bool> {
        match Self::root(key.hive).open_subkey(&key.subkey) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn delete_tree(&self, key: &RegistryKeyPath) -> io::Result<()> {
        Self::root(key.hive).delete_subkey_all(&key.subkey)
    }
}

/// Stand-in for hosts without a registry: no key ever exists
#[cfg(any(not(windows), test))]
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRegistry;

#[cfg(any(not(windows), test))]
impl RegistryStore for NoRegistry {
    fn key_exists(&self, _key: &RegistryKeyPath) -> io::Result<bool> {
        Ok(false)
    }

    fn delete_tree(&self, key: &RegistryKeyPath) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no registry on this platform for {}", key),
        ))
    }
}

/// The registry store for the host platform
#[cfg(windows)]
pub fn system_registry() -> Box<dyn RegistryStore> {
    Box::new(WinRegistry)
}

/// The registry store for the host platform
#[cfg(not(windows))]
pub fn system_registry() -> Box<dyn RegistryStore> {
    Box::new(NoRegistry)
}
