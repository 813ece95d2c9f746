// src/cli/handlers/refresh.rs

use anyhow::Result;
use colored::*;

use crate::core::paths;
use crate::state;
use crate::system::anki;

/// `-refresh`: asks Anki for the fields of the configured note type again
/// and rebuilds the cached mapping.
pub fn handle() -> Result<()> {
    let settings = state::snapshot();
    let mapping = anki::refresh(&settings.anki, &paths::get_note_fields_path()?)?;

    println!(
        "{}",
        format!(t!("refresh.success.mapped"), note = settings.anki.note).green()
    );
    for (note_field, card_field) in &mapping {
        println!("  {} {} {}", note_field.bold(), "->".dimmed(), card_field.as_str().cyan());
    }
    Ok(())
}
