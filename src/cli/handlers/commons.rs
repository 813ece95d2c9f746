// src/cli/handlers/commons.rs

// This module contains shared functions used by multiple handlers.

use anyhow::{Context, Result};
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use std::path::PathBuf;

use crate::core::paths;
use crate::core::selection::{ChoiceError, ChoiceInput};

/// Reads choice expressions from the terminal.
#[derive(Debug, Default)]
pub struct InteractiveInput;

impl ChoiceInput for InteractiveInput {
    fn read_choice(&mut self, prompt: &str, auto_choice: &str) -> Result<String, ChoiceError> {
        let theme = ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(&theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if !auto_choice.is_empty() {
            input = input.default(auto_choice.to_string());
        }
        // Ctrl+C and a closed stdin both end up here.
        input.interact_text().map_err(|e| {
            log::debug!("Choice prompt aborted: {}", e);
            ChoiceError::Interrupted
        })
    }
}

/// Asks a yes/no question, defaulting to "no".
pub fn confirm(prompt: &str) -> Result<bool> {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context(t!("common.error.prompt"))
}

/// Resolves a path from the settings: `~` and variables are expanded and
/// relative paths are taken from the config directory.
pub fn resolve_data_path(template: &str) -> Result<PathBuf> {
    let expanded = paths::expand_path(template)?;
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(paths::get_config_dir()?.join(expanded))
    }
}

/// Parses `on`/`off` style switches.
pub fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

pub fn switch_label(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}
