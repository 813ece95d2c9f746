// src/core/config_loader.rs

//! Loading and saving of `config.toml`.
//!
//! A missing file is created with the defaults. A file that exists but does
//! not parse is an error the user has to fix; it is never overwritten.

use crate::core::paths::{self, PathError};
use crate::models::Settings;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Could not read settings from '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Settings file '{path}' is corrupted: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Could not write settings to '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub fn load_settings() -> Result<Settings, SettingsError> {
    load_settings_from(&paths::get_config_path()?)
}

pub fn save_settings(settings: &Settings) -> Result<(), SettingsError> {
    save_settings_to(settings, &paths::get_config_path()?)
}

pub fn load_settings_from(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        log::info!("No settings at '{}', writing defaults.", path.display());
        let defaults = Settings::default();
        save_settings_to(&defaults, path)?;
        return Ok(defaults);
    }

    let content = fs::read_to_string(path).map_err(|e| SettingsError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| SettingsError::Parse {
        path: path.display().to_string(),
        source: e,
    })
}

/// Writes through a temporary file in the same directory, so a crash never
/// leaves a half-written settings file behind.
pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<(), SettingsError> {
    let content = toml::to_string_pretty(settings)?;
    write_atomically(path, content.as_bytes()).map_err(|e| SettingsError::Write {
        path: path.display().to_string(),
        source: e,
    })
}

pub(crate) fn write_atomically(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&dir)?;

    let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
    temp.write_all(content)?;
    temp.flush()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
