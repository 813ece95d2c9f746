// src/state.rs

use crate::core::config_loader;
use crate::models::Settings;
use anyhow::Result;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Journaling wrapper around the loaded settings.
/// The snapshot of the original settings is taken on the first mutable access only.
#[derive(Debug)]
enum SettingsState {
    Pristine(Settings),
    Dirty { original: Settings, current: Settings },
}

#[derive(Debug)]
pub struct SettingsStore {
    state: SettingsState,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: SettingsState::Pristine(settings),
        }
    }

    /// `true` when a mutation actually changed something.
    pub fn needs_saving(&self) -> bool {
        match &self.state {
            SettingsState::Pristine(_) => false,
            SettingsState::Dirty { original, current } => original != current,
        }
    }

    pub fn settings(&self) -> &Settings {
        match &self.state {
            SettingsState::Pristine(settings) => settings,
            SettingsState::Dirty { current, .. } => current,
        }
    }

    fn settings_mut(&mut self) -> &mut Settings {
        if let SettingsState::Pristine(_) = self.state {
            let previous = std::mem::replace(
                &mut self.state,
                SettingsState::Pristine(Settings::default()),
            );
            if let SettingsState::Pristine(settings) = previous {
                self.state = SettingsState::Dirty {
                    original: settings.clone(),
                    current: settings,
                };
            }
        }

        match &mut self.state {
            SettingsState::Dirty { current, .. } => current,
            SettingsState::Pristine(settings) => settings,
        }
    }

    /// Treats the current settings as the new saved baseline.
    pub fn mark_saved(&mut self) {
        let previous = std::mem::replace(
            &mut self.state,
            SettingsState::Pristine(Settings::default()),
        );
        self.state = match previous {
            SettingsState::Dirty { current, .. } => SettingsState::Pristine(current),
            pristine => pristine,
        };
    }
}

/// Guard handed out by [`lock_settings`]. Reading goes through `Deref`,
/// writing through `DerefMut`, which marks the store dirty.
#[derive(Debug)]
pub struct SettingsGuard<'a> {
    guard: MutexGuard<'a, SettingsStore>,
}

impl SettingsGuard<'_> {
    pub fn needs_saving(&self) -> bool {
        self.guard.needs_saving()
    }
}

impl Deref for SettingsGuard<'_> {
    type Target = Settings;

    fn deref(&self) -> &Self::Target {
        self.guard.settings()
    }
}

impl DerefMut for SettingsGuard<'_> {
    fn deref_mut(&mut self) -> &mut Settings {
        self.guard.settings_mut()
    }
}

static SETTINGS: OnceLock<Mutex<SettingsStore>> = OnceLock::new();

/// Installs the settings loaded at startup. Later calls are ignored.
pub fn init_settings(settings: Settings) {
    if SETTINGS.set(Mutex::new(SettingsStore::new(settings))).is_err() {
        log::debug!("Settings were already initialized; keeping the first copy.");
    }
}

pub fn lock_settings() -> SettingsGuard<'static> {
    let store = SETTINGS.get_or_init(|| Mutex::new(SettingsStore::new(Settings::default())));
    SettingsGuard {
        guard: store.lock().unwrap_or_else(PoisonError::into_inner),
    }
}

/// Clones the current settings so long operations don't hold the lock.
pub fn snapshot() -> Settings {
    lock_settings().clone()
}

/// Writes the settings to disk if anything changed since the last save.
pub fn save_if_dirty() -> Result<bool> {
    let mut guard = lock_settings();
    if !guard.needs_saving() {
        return Ok(false);
    }
    config_loader::save_settings(&guard)?;
    guard.guard.mark_saved();
    log::debug!("Settings saved.");
    Ok(true)
}
