// src/bin/cardsmith.rs

use anyhow::{Context, Result};
use cardsmith::{
    cli::{Cli, handlers::bulk, session::{self, Session}},
    core::{color::Palette, config_loader},
    dictionaries::{Sources, http::HttpClient},
    state, t,
};
use clap::Parser;
use colored::*;
use std::env;

fn main() {
    env_logger::init();

    // The help text is colored while clap parses, so the switch has to be
    // honored before `Cli::parse`.
    if env::args().any(|arg| arg == "--no-color") {
        colored::control::set_override(false);
    }

    // The entire application logic is wrapped in a Result to enable centralized error handling.
    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);
    if cli.no_color {
        colored::control::set_override(false);
    }

    // A settings file that does not parse is the only fatal error.
    let settings = config_loader::load_settings().context(t!("startup.error.settings"))?;
    let palette = Palette::from_settings(&settings.display.colors).unwrap_or_else(|e| {
        eprintln!("{} {}", t!("startup.warning.colors").yellow(), e);
        Palette::from_settings_lossy(&settings.display.colors)
    });
    state::init_settings(settings);

    let http = HttpClient::new().context(t!("startup.error.http"))?;
    let sources = Sources::online().context(t!("startup.error.http"))?;
    let mut session = Session::new(sources, http, palette);

    if let Some(path) = cli.bulk.as_deref() {
        return bulk::run(&session, path, cli.separator.as_deref());
    }

    let initial = Some(cli.query.join(" ")).filter(|query| !query.trim().is_empty());
    session::run(&mut session, initial)
}
