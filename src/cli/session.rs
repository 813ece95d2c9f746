// src/cli/session.rs

//! The interactive search loop.

use anyhow::Result;
use colored::*;
use dialoguer::{Input, theme::ColorfulTheme};

use crate::cli::dispatcher;
use crate::cli::handlers::{commons::InteractiveInput, search};
use crate::core::color::{Palette, paint};
use crate::core::query::parse_query;
use crate::core::selection::SelectionMode;
use crate::dictionaries::Sources;
use crate::dictionaries::http::HttpClient;
use crate::state;

/// What lives for the whole run: the sources, the shared HTTP client and
/// the resolved colors.
#[derive(Debug)]
pub struct Session {
    pub sources: Sources,
    pub http: HttpClient,
    pub palette: Palette,
}

impl Session {
    pub fn new(sources: Sources, http: HttpClient, palette: Palette) -> Self {
        Self {
            sources,
            http,
            palette,
        }
    }

    /// Re-resolves the palette after a `-color` change.
    pub fn reload_palette(&mut self) {
        self.palette = Palette::from_settings_lossy(&state::snapshot().display.colors);
    }

    pub fn warn(&self, message: &str) {
        println!("{}", paint(message, self.palette.error));
    }

    /// Handles one line typed at the search prompt. Errors are reported
    /// here; nothing a single line does ends the session.
    pub fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        match dispatcher::dispatch(line, self) {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => {
                self.warn(&format!("{:#}", e));
                return;
            }
        }

        if let Some((name, _)) = dispatcher::split_command(line) {
            self.warn(&format!(t!("search.error.unknown_command"), command = name));
            return;
        }

        let Some(query) = parse_query(line) else {
            self.warn(&format!(t!("search.error.invalid_query"), query = line));
            return;
        };

        if let Err(e) = search::handle(self, &query, SelectionMode::Interactive, &mut InteractiveInput) {
            search::report(self, &e);
        }
    }
}

/// Prompts for queries until the user interrupts the prompt.
pub fn run(session: &mut Session, initial: Option<String>) -> Result<()> {
    if let Some(line) = initial.filter(|line| !line.trim().is_empty()) {
        session.handle_line(&line);
    }

    let theme = ColorfulTheme::default();
    loop {
        let line = match Input::<String>::with_theme(&theme)
            .with_prompt(t!("search.prompt"))
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(e) => {
                // Ctrl+C or end of input.
                log::debug!("Search prompt closed: {}", e);
                println!("{}", t!("search.info.goodbye").dimmed());
                return Ok(());
            }
        };
        session.handle_line(&line);
    }
}
