// src/core/paths.rs

use crate::constants::{APP_DIR, CONFIG_FILENAME, NOTE_FIELDS_FILENAME};
use lazy_static::lazy_static;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

lazy_static! {
    static ref CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not create directory at '{path}': {source}")]
    DirCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not expand path '{path}': {reason}")]
    Expansion { path: String, reason: String },
}

/// Returns the application config directory (`~/.config/cardsmith`),
/// creating it on first use.
///
/// Memoized: only the first call touches the filesystem.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    let mut cached = CONFIG_DIR.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join(APP_DIR);
    ensure_dir(&config_path)?;

    *cached = Some(config_path.clone());
    Ok(config_path)
}

pub fn get_config_path() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILENAME))
}

pub fn get_note_fields_path() -> Result<PathBuf, PathError> {
    get_config_dir().map(|dir| dir.join(NOTE_FIELDS_FILENAME))
}

pub fn ensure_dir(path: &Path) -> Result<(), PathError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| PathError::DirCreation {
            path: path.display().to_string(),
            source: e,
        })?;
    }
    Ok(())
}

/// Expands `~` and environment variables in a path taken from the settings.
pub fn expand_path(template: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        path: template.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// A path as it should be shown to the user (no `\\?\` prefixes on Windows).
pub fn display_path(path: &Path) -> String {
    dunce::simplified(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_resolves_home_and_rejects_unset_variables() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_path("~/cards.txt").unwrap(), home.join("cards.txt"));

        // Unset variables are an error, not an empty string.
        assert!(expand_path("$CARDSMITH_SURELY_UNSET_VARIABLE/audio").is_err());
    }

    #[test]
    fn test_plain_paths_are_untouched() {
        assert_eq!(expand_path("relative/file.txt").unwrap(), PathBuf::from("relative/file.txt"));
    }

    #[test]
    fn test_ensure_dir_creates_nested_directories() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir(&nested).unwrap();
    }
}
