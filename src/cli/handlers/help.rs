// src/cli/handlers/help.rs

use anyhow::Result;

use crate::cli::render_tags;

/// `--help` typed at the search prompt: the search-line grammar and every
/// command.
pub fn handle() -> Result<()> {
    println!("{}", render_tags(t!("help.commands")));
    Ok(())
}
