// src/cli/handlers/search.rs

//! Runs one query through the card pipeline and delivers the result.

use colored::*;

use crate::cli::handlers::{commons, record};
use crate::cli::session::Session;
use crate::core::color::paint;
use crate::core::paths;
use crate::core::pipeline::{
    self, AudioStore, CardError, CardOutcome, CardSink, Pipeline, PhraseRecorder,
};
use crate::core::query::Query;
use crate::core::selection::{ChoiceInput, SelectionMode};
use crate::models::Settings;
use crate::system::anki::AnkiSink;
use crate::system::audio::AudioDownloader;
use crate::system::card_file::CardFile;

/// Every destination enabled in `settings`. Sinks that cannot be set up are
/// reported and left out; the others still receive the card.
pub fn build_sinks(settings: &Settings, session: &Session) -> Vec<Box<dyn CardSink>> {
    let mut sinks: Vec<Box<dyn CardSink>> = Vec::new();

    if settings.card.save_to_file {
        match commons::resolve_data_path(&settings.card.card_file) {
            Ok(path) => sinks.push(Box::new(CardFile::new(path, settings.card.field_order.clone()))),
            Err(e) => session.warn(&format!("{} {:#}", t!("search.error.card_file"), e)),
        }
    }

    if settings.anki.enabled {
        let sink = paths::get_note_fields_path()
            .map_err(anyhow::Error::from)
            .and_then(|cache| AnkiSink::new(&settings.anki, &cache).map_err(anyhow::Error::from));
        match sink {
            Ok(sink) => sinks.push(Box::new(sink)),
            Err(e) => session.warn(&format!("{} {:#}", t!("search.error.anki"), e)),
        }
    }

    log::debug!("{} sink(s) enabled", sinks.len());
    sinks
}

/// Looks `query` up, assembles a card from the user's choices and delivers it.
/// Returns how many sinks accepted the card.
pub fn handle(
    session: &Session,
    query: &Query,
    mode: SelectionMode,
    input: &mut dyn ChoiceInput,
) -> Result<usize, CardError> {
    let settings = crate::state::snapshot();

    let audio = match commons::resolve_data_path(&settings.card.audio_dir) {
        Ok(dir) => Some(AudioDownloader::new(dir, session.http.clone())),
        Err(e) => {
            log::warn!("Audio directory unavailable: {:#}", e);
            None
        }
    };
    let recorder = if query.flags.record {
        record::recorder_from_settings()
            .map_err(|e| log::warn!("Recorder unavailable: {:#}", e))
            .ok()
    } else {
        None
    };

    let pipeline = Pipeline {
        settings: &settings,
        sources: &session.sources,
        palette: session.palette,
        mode,
        audio: audio.as_ref().map(|store| store as &dyn AudioStore),
        recorder: recorder.as_ref().map(|rec| rec as &dyn PhraseRecorder),
    };

    match pipeline.run(query, input)? {
        CardOutcome::Displayed => Ok(0),
        CardOutcome::Assembled(card) => {
            let mut sinks = build_sinks(&settings, session);
            if sinks.is_empty() {
                println!("{}", t!("search.info.no_sinks").yellow());
                return Ok(0);
            }
            Ok(pipeline::dispatch(&card, &mut sinks, &session.palette))
        }
    }
}

/// Prints a card error the way the search loop reports it.
pub fn report(session: &Session, error: &CardError) {
    match error {
        // Already reported by the pipeline, together with the idioms hint.
        CardError::NotFound(_) => {}
        CardError::Interrupted => println!("{}", t!("search.info.cancelled").dimmed()),
        CardError::Connectivity(e) => println!(
            "{} {}",
            paint(t!("search.error.connectivity"), session.palette.error),
            e
        ),
        CardError::InvalidChoice(expr) => println!(
            "{}",
            paint(&format!(t!("search.error.invalid_choice"), choice = expr), session.palette.error)
        ),
    }
}
