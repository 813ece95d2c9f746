// src/cli/handlers/delete.rs

use anyhow::{Context, Result, anyhow};
use colored::*;

use crate::cli::handlers::commons;
use crate::core::paths::display_path;
use crate::state;
use crate::system::card_file;

/// `--delete-last [n]`: removes the last `n` cards (default 1) from the card
/// file after confirmation.
pub fn handle(arg: &str) -> Result<()> {
    let count = match arg.trim() {
        "" => 1,
        value => value
            .parse::<usize>()
            .ok()
            .filter(|count| *count > 0)
            .ok_or_else(|| anyhow!(t!("delete.error.invalid_count"), value = value))?,
    };

    let path = commons::resolve_data_path(&state::snapshot().card.card_file)?;
    if !path.exists() {
        println!("{}", format!(t!("delete.info.no_file"), path = display_path(&path)).yellow());
        return Ok(());
    }

    let prompt = format!(t!("delete.prompt.confirm"), count = count, path = display_path(&path));
    if !commons::confirm(&prompt)? {
        println!("{}", t!("common.info.cancelled"));
        return Ok(());
    }

    let removed = card_file::delete_last(&path, count)
        .with_context(|| format!(t!("delete.error.write"), path = display_path(&path)))?;
    println!("{}", format!(t!("delete.success.removed"), count = removed).green());
    Ok(())
}
