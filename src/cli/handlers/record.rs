// src/cli/handlers/record.rs

use anyhow::Result;
use colored::*;
use std::io;

use crate::cli::handlers::commons;
use crate::core::paths::display_path;
use crate::state;
use crate::system::executor::Recorder;

/// Builds the recorder from the current settings. Recordings are saved next
/// to the downloaded audio so Anki can import both from one place.
pub fn recorder_from_settings() -> Result<Recorder> {
    let settings = state::snapshot();
    let dir = commons::resolve_data_path(&settings.card.audio_dir)?;
    Ok(Recorder::new(settings.card.recorder, dir))
}

/// `-rec`: records without a card, e.g. to test the microphone setup.
pub fn handle() -> Result<()> {
    let recorder = recorder_from_settings()?;
    let output = recorder.record_with("recording", || {
        println!("{}", t!("record.info.stop"));
        let mut line = String::new();
        io::stdin().read_line(&mut line).map(|_| ())
    })?;
    println!(
        "{}",
        format!(t!("record.success.saved"), path = display_path(&output)).green()
    );
    Ok(())
}
