//! Directory-backed profile registry
//!
//! Profiles are plain `.icc` / `.icm` files under one or more root
//! directories. Enumeration is lazy and can be restarted any number of
//! times; nothing is cached between calls.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::profile::Profile;

/// One profile file known to a registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    /// Path relative to its root, `/`-separated
    pub id: String,
    pub path: PathBuf,
}

impl RegistryEntry {
    pub fn load(&self) -> Result<Profile> {
        Profile::from_file(&self.path)
    }
}

/// A source of installed profiles
pub trait ProfileRegistry {
    /// Every entry, in a stable order. Each call starts a fresh walk.
    fn entries(&self) -> Box<dyn Iterator<Item = RegistryEntry> + '_>;

    /// Entries that parse, with their profiles
    fn profiles(&self) -> Box<dyn Iterator<Item = (RegistryEntry, Profile)> + '_> {
        Box::new(self.entries().filter_map(|entry| match entry.load() {
            Ok(profile) => Some((entry, profile)),
            Err(e) => {
                debug!(path = %entry.path.display(), error = %e, "skipping unreadable profile");
                None
            }
        }))
    }
}

/// Registry over profile directories, searched recursively
#[derive(Debug, Clone)]
pub struct DirectoryRegistry {
    roots: Vec<PathBuf>,
}

impl DirectoryRegistry {
    pub fn new<I, P>(roots: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Write `profile` into the first root.
    ///
    /// Without `file_name` the name comes from the profile description.
    pub fn install(&self, profile: &Profile, file_name: Option<&str>) -> Result<RegistryEntry> {
        let root = self.roots.first().ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "registry has no root directory",
            ))
        })?;
        let name = match file_name {
            Some(name) => name.to_owned(),
            None => file_name_for(profile),
        };
        if Path::new(&name).file_name() != Some(std::ffi::OsStr::new(&name)) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid profile file name {name:?}"),
            )));
        }

        std::fs::create_dir_all(root)?;
        let path = root.join(&name);
        std::fs::write(&path, profile.raw_data())?;
        debug!(path = %path.display(), "installed profile");
        Ok(RegistryEntry { id: name, path })
    }

    /// Delete an installed profile; paths outside every root are refused
    pub fn uninstall(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref().canonicalize()?;
        let inside = self
            .roots
            .iter()
            .filter_map(|root| root.canonicalize().ok())
            .any(|root| path.starts_with(root));
        if !inside {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("{} is outside the registry roots", path.display()),
            )));
        }
        std::fs::remove_file(&path)?;
        debug!(path = %path.display(), "uninstalled profile");
        Ok(())
    }
}

impl ProfileRegistry for DirectoryRegistry {
    fn entries(&self) -> Box<dyn Iterator<Item = RegistryEntry> + '_> {
        Box::new(self.roots.iter().flat_map(|root| {
            WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(move |entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        debug!(root = %root.display(), error = %e, "skipping registry path");
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file() && is_profile_file(entry.path()))
                .map(move |entry| {
                    let path = entry.into_path();
                    let id = path
                        .strip_prefix(root)
                        .unwrap_or(&path)
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    RegistryEntry { id, path }
                })
        }))
    }
}

fn is_profile_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("icc") || e.eq_ignore_ascii_case("icm"))
}

/// `Display P3` becomes `Display P3.icc`
fn file_name_for(profile: &Profile) -> String {
    let stem: String = profile
        .description()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.'))
        .collect();
    let stem = stem.trim().trim_matches('.');
    if stem.is_empty() {
        "profile.icc".to_owned()
    } else {
        format!("{stem}.icc")
    }
}
