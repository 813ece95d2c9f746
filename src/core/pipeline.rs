// src/core/pipeline.rs

//! One card, from a parsed query to its delivery.
//!
//! The pipeline reads an immutable settings snapshot and talks to the
//! outside world only through [`Sources`], [`ChoiceInput`] and the small
//! traits below, so every step can run against fakes.

use crate::constants::{DEF_INDEX_COLOR, SENTENCE_HIGHLIGHT_COLOR};
use crate::core::color::{Palette, paint};
use crate::core::hide::hide;
use crate::core::query::{Query, QueryFlags};
use crate::core::render::{RenderOptions, render_card_preview, render_entry};
use crate::core::selection::{Choice, ChoiceError, ChoiceInput, InputField, SelectedField, SelectionMode};
use crate::dictionaries::{Lookup, ScrapeAdapter, SourceError, Sources, lookup};
use crate::models::{
    AudioSourceName, CanonicalEntry, CardFields, DictionaryName, FieldName, SentenceFallback,
    Settings, SourceSettings,
};
use colored::Colorize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    #[error("Could not find '{0}'")]
    NotFound(String),
    #[error(transparent)]
    Connectivity(#[from] SourceError),
    #[error("Invalid choice: '{0}'")]
    InvalidChoice(String),
    #[error("Card creation interrupted")]
    Interrupted,
}

impl From<ChoiceError> for CardError {
    fn from(e: ChoiceError) -> Self {
        match e {
            ChoiceError::Invalid(expr) => Self::InvalidChoice(expr),
            ChoiceError::Interrupted => Self::Interrupted,
        }
    }
}

/// Progress of a card, for the debug log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    QueryParsed,
    DictionaryQueried,
    EntryRendered,
    FieldsSelected,
    ThesaurusQueried,
    AudioResolved,
    ContentFormatted,
    Dispatched,
}

fn transition(state: CardState, phrase: &str) {
    log::debug!("[{}] -> {:?}", phrase, state);
}

/// A destination for finished cards.
pub trait CardSink {
    fn name(&self) -> &str;

    /// Delivers one card and returns a short report for the user.
    fn deliver(&mut self, card: &CardFields) -> anyhow::Result<String>;
}

/// Turns a pronunciation url into the content of the audio field.
pub trait AudioStore {
    fn store(&self, url: &str) -> anyhow::Result<String>;
}

/// Records the user saying the phrase; returns the recording field content.
pub trait PhraseRecorder {
    fn record(&self, phrase: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardOutcome {
    /// Card creation is off; the entry was only shown.
    Displayed,
    Assembled(CardFields),
}

/// Where the audio field comes from, decided before any request is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioPlan {
    Skip,
    EntryUrl(String),
    Source(AudioSourceName),
}

/// Picks the audio origin for an entry of `dictionary`.
///
/// A dictionary without recordings always defers to the fallback source.
/// `auto`, or the source that belongs to the dictionary, uses the entry's
/// own url and falls back when it has none; any other source is asked
/// directly.
pub fn plan_audio(
    sources: &SourceSettings,
    dictionary: DictionaryName,
    supplies_audio: bool,
    entry_url: Option<&str>,
) -> AudioPlan {
    let fallback = match sources.audio_fallback {
        AudioSourceName::Off => AudioPlan::Skip,
        AudioSourceName::Auto => AudioPlan::Source(AudioSourceName::Commons),
        name => AudioPlan::Source(name),
    };
    let from_entry = || {
        entry_url
            .filter(|url| !url.is_empty())
            .map(|url| AudioPlan::EntryUrl(url.to_string()))
            .unwrap_or_else(|| fallback.clone())
    };

    match sources.audio {
        AudioSourceName::Off => AudioPlan::Skip,
        _ if !supplies_audio => fallback.clone(),
        AudioSourceName::Auto => from_entry(),
        server if server.belongs_to(dictionary) => from_entry(),
        server => AudioPlan::Source(server),
    }
}

// --- FORMATTING ---

/// Escapes the quotes that would break an HTML attribute or a note field.
pub fn escape_quotes(text: &str) -> String {
    text.replace('\'', "&#39;").replace('"', "&quot;")
}

const DEFINITION_STYLES: [(&str, &str); 4] = [
    ("", ""),
    ("<span style=\"opacity: .6;\">", "</span>"),
    ("<small style=\"opacity: .4;\">", "</small>"),
    ("<small style=\"opacity: .2;\"><sub>", "</sub></small>"),
];

/// Numbers joined definitions and fades each one after the first.
/// An empty field is left as it is.
pub fn format_definitions(definitions: &str, separator: &str) -> String {
    if separator.is_empty() || definitions.trim().is_empty() {
        return definitions.to_string();
    }
    definitions
        .split(separator)
        .enumerate()
        .map(|(i, definition)| {
            let (open, close) = DEFINITION_STYLES
                .get(i)
                .or(DEFINITION_STYLES.last())
                .copied()
                .unwrap_or_default();
            format!(
                "{}<small style=\"color: {};\">{}.</small> {}{}",
                open,
                DEF_INDEX_COLOR,
                i + 1,
                definition,
                close
            )
        })
        .collect::<Vec<_>>()
        .join(separator)
}

/// Turns the `<phrase>` marker of a single-line sentence into bold text.
pub fn highlight_sentence(sentence: &str) -> String {
    if sentence.contains("<br>") {
        return sentence.to_string();
    }
    let Some((before, rest)) = sentence.split_once('<') else {
        return sentence.to_string();
    };
    let Some((marked, after)) = rest.split_once('>') else {
        return sentence.to_string();
    };
    format!(
        "{}<b style=\"color: {};\">{}</b>{}",
        before, SENTENCE_HIGHLIGHT_COLOR, marked, after
    )
}

/// Fills the sentence field when the user gave none.
pub fn apply_sentence_fallback(card: &mut CardFields, fallback: SentenceFallback) {
    if !card.get(FieldName::Sentence).is_empty() || fallback == SentenceFallback::Off {
        return;
    }
    let example = card.take(FieldName::Exsen);
    if !example.is_empty() {
        card.set(FieldName::Sentence, example);
    } else if fallback == SentenceFallback::Strict {
        let phrase = card.take(FieldName::Phrase);
        card.set(FieldName::Sentence, phrase);
    }
}

/// The content of the dependent fields follows the definition choice; a
/// literal definition has no counterpart, so they start empty.
fn follow_expression(choice: &Choice) -> String {
    match choice {
        Choice::Literal(_) => Choice::Skip.to_expression(),
        other => other.to_expression(),
    }
}

// --- PIPELINE ---

struct Hit<'a> {
    dictionary: DictionaryName,
    adapter: &'a dyn ScrapeAdapter,
    entry: CanonicalEntry,
}

/// The fields chosen from an entry, before hiding.
struct Selection {
    phrase: String,
    audio_url: Option<String>,
    def: SelectedField,
    exsen: SelectedField,
    pos: SelectedField,
    etym: SelectedField,
}

pub struct Pipeline<'a> {
    pub settings: &'a Settings,
    pub sources: &'a Sources,
    pub palette: Palette,
    pub mode: SelectionMode,
    pub audio: Option<&'a dyn AudioStore>,
    pub recorder: Option<&'a dyn PhraseRecorder>,
}

impl<'a> Pipeline<'a> {
    fn render_options(&self, flags: &QueryFlags) -> RenderOptions {
        RenderOptions::from_display(&self.settings.display, self.palette, flags.filter_subsenses)
    }

    fn notice(&self, message: &str) {
        println!("{}", paint(message, self.palette.error));
    }

    fn prompts_everything(&self) -> bool {
        match &self.mode {
            SelectionMode::Interactive => true,
            SelectionMode::Bulk(bulk) => bulk.freeform,
        }
    }

    /// Runs every step up to a finished card. Nothing is delivered here.
    pub fn run(&self, query: &Query, input: &mut dyn ChoiceInput) -> Result<CardOutcome, CardError> {
        let settings = self.settings;
        let phrase = query.phrase.as_str();
        transition(CardState::QueryParsed, phrase);

        let recording = match (query.flags.record, self.recorder) {
            (true, Some(recorder)) => recorder.record(phrase).unwrap_or_else(|e| {
                log::warn!("Recording failed: {}", e);
                self.notice(&format!("{} {}", t!("card.error.recording"), e));
                String::new()
            }),
            _ => String::new(),
        };

        let options = self.render_options(&query.flags);
        let hit = self.query_dictionaries(query, &options)?;
        transition(CardState::EntryRendered, phrase);

        if !settings.card.create_cards {
            if let Some(first) = hit.entry.phrases.first() {
                self.show_thesaurus(&hit, first, &options);
            }
            return Ok(CardOutcome::Displayed);
        }

        let sentence = match &query.sentence {
            Some(sentence) => sentence.clone(),
            None if settings.fields.sentence && self.prompts_everything() => {
                input.read_choice(t!("card.prompt.sentence"), "")?.trim().to_string()
            }
            None => String::new(),
        };

        let selection = self.select_fields(&hit.entry, phrase, input)?;
        transition(CardState::FieldsSelected, phrase);

        let syn = self.select_synonyms(&hit, &selection.phrase, &options, input)?;
        transition(CardState::ThesaurusQueried, phrase);

        let audio = if settings.fields.audio {
            self.audio_field(&hit, &selection, query)
        } else {
            String::new()
        };
        transition(CardState::AudioResolved, phrase);

        let hide_settings = &settings.hide;
        let hidden = |field: &SelectedField, enabled: bool| {
            if enabled && !field.literal {
                hide(&field.content, &selection.phrase, hide_settings)
            } else {
                field.content.clone()
            }
        };

        let mut card = CardFields::default();
        card.set(FieldName::Def, hidden(&selection.def, hide_settings.def));
        card.set(FieldName::Exsen, hidden(&selection.exsen, hide_settings.exsen));
        card.set(FieldName::Syn, hidden(&syn, hide_settings.syn));
        card.set(FieldName::Pos, selection.pos.content.clone());
        card.set(FieldName::Etym, selection.etym.content.clone());
        card.set(FieldName::Phrase, selection.phrase.clone());
        card.set(FieldName::Sentence, sentence);
        card.set(FieldName::Audio, audio);
        card.set(FieldName::Recording, recording);

        apply_sentence_fallback(&mut card, settings.card.sentence_fallback);
        if hide_settings.sentence {
            let sentence = hide(card.get(FieldName::Sentence), &selection.phrase, hide_settings);
            card.set(FieldName::Sentence, sentence);
        }

        if settings.display.preview {
            for line in render_card_preview(&card, &settings.card.field_order, &options) {
                println!("{}", line);
            }
        }

        card.map_values(escape_quotes);
        if settings.card.format_definitions {
            let formatted = format_definitions(card.get(FieldName::Def), &settings.card.connectors.def);
            card.set(FieldName::Def, formatted);
        }
        let highlighted = highlight_sentence(card.get(FieldName::Sentence));
        card.set(FieldName::Sentence, highlighted);
        transition(CardState::ContentFormatted, phrase);

        Ok(CardOutcome::Assembled(card))
    }

    /// Asks the dictionaries named on the line, or the configured one with
    /// its fallback. Every entry found is shown; the last one is used.
    fn query_dictionaries(&self, query: &Query, options: &RenderOptions) -> Result<Hit<'a>, CardError> {
        let sources = &self.settings.sources;
        let explicit = !query.flags.dictionaries.is_empty();
        let names = if explicit {
            query.flags.dictionaries.clone()
        } else {
            vec![sources.dict]
        };

        let mut found = None;
        let mut failure = None;
        for name in names {
            match self.ask(name, query, options) {
                Ok(Some(hit)) => found = Some(hit),
                Ok(None) => {}
                Err(e) => failure = Some(e),
            }
        }

        if found.is_none() && failure.is_none() && !explicit {
            if let Some(second) = sources.dict2.filter(|second| *second != sources.dict) {
                log::debug!("Falling back to {}", second.as_str());
                match self.ask(second, query, options) {
                    Ok(hit) => found = hit,
                    Err(e) => failure = Some(e),
                }
            }
        }
        transition(CardState::DictionaryQueried, &query.phrase);

        match (found, failure) {
            (Some(hit), _) => Ok(hit),
            (None, Some(e)) => Err(CardError::Connectivity(e)),
            (None, None) => {
                if !explicit && sources.dict != DictionaryName::Idioms {
                    println!("{}", t!("search.info.idioms_hint"));
                }
                Err(CardError::NotFound(query.phrase.clone()))
            }
        }
    }

    fn ask(&self, name: DictionaryName, query: &Query, options: &RenderOptions) -> Result<Option<Hit<'a>>, SourceError> {
        let Some(adapter) = self.sources.dictionary(name) else {
            log::warn!("Dictionary '{}' is not available", name.as_str());
            return Ok(None);
        };

        let entry = match lookup(adapter, &query.phrase, &query.flags)? {
            Lookup::NotFound => {
                self.notice(&format!("{} {}: {}", t!("search.info.not_found"), adapter.title(), query.phrase));
                return Ok(None);
            }
            Lookup::Redirected { from, entry } => {
                let target = entry.phrases.first().cloned().unwrap_or_default();
                println!("{} {} -> {}", t!("search.info.redirected"), from, target);
                entry
            }
            Lookup::Found(entry) => entry,
        };

        let entry = query.flags.gram.filter_entry(entry);
        for line in render_entry(&entry, options) {
            println!("{}", line);
        }
        Ok(Some(Hit {
            dictionary: name,
            adapter,
            entry,
        }))
    }

    fn select_fields(
        &self,
        entry: &CanonicalEntry,
        query_phrase: &str,
        input: &mut dyn ChoiceInput,
    ) -> Result<Selection, CardError> {
        let toggles = &self.settings.fields;
        let connectors = &self.settings.card.connectors;

        let (def_choice, def) = if toggles.def {
            InputField {
                field: FieldName::Def,
                prompt: t!("card.prompt.def"),
                candidates: &entry.definitions,
                separator: &connectors.def,
                auto_choice: "1".to_string(),
            }
            .select(&self.mode, input)?
        } else {
            (Choice::Picks(vec![1]), SelectedField::default())
        };

        let phrase = entry
            .phrases
            .get(def_choice.first_block(&entry.def_index_to_phrase_block))
            .filter(|phrase| !phrase.is_empty())
            .cloned()
            .unwrap_or_else(|| query_phrase.to_string());
        let audio_url = entry
            .audio_url_for(def_choice.first_block(&entry.def_index_to_gram_block))
            .map(str::to_string);

        let exsen = if toggles.exsen {
            InputField {
                field: FieldName::Exsen,
                prompt: t!("card.prompt.exsen"),
                candidates: &entry.example_sentences,
                separator: &connectors.exsen,
                auto_choice: follow_expression(&def_choice),
            }
            .select(&self.mode, input)?
            .1
        } else {
            SelectedField::default()
        };

        let pos = if toggles.pos {
            InputField {
                field: FieldName::Pos,
                prompt: t!("card.prompt.pos"),
                candidates: &entry.grammatical_labels,
                separator: &connectors.pos,
                auto_choice: def_choice.translate(&entry.def_index_to_gram_block).to_expression(),
            }
            .select(&self.mode, input)?
            .1
        } else {
            SelectedField::default()
        };

        let etym = if toggles.etym {
            InputField {
                field: FieldName::Etym,
                prompt: t!("card.prompt.etym"),
                candidates: &entry.etymologies,
                separator: &connectors.etym,
                auto_choice: def_choice.translate(&entry.def_index_to_phrase_block).to_expression(),
            }
            .select(&self.mode, input)?
            .1
        } else {
            SelectedField::default()
        };

        Ok(Selection {
            phrase,
            audio_url,
            def,
            exsen,
            pos,
            etym,
        })
    }

    fn select_synonyms(
        &self,
        hit: &Hit<'_>,
        phrase: &str,
        options: &RenderOptions,
        input: &mut dyn ChoiceInput,
    ) -> Result<SelectedField, CardError> {
        let settings = self.settings;
        if !settings.fields.syn {
            return Ok(SelectedField::default());
        }
        let Some(entry) = self.show_thesaurus(hit, phrase, options) else {
            return Ok(SelectedField::default());
        };

        let (_, selected) = InputField {
            field: FieldName::Syn,
            prompt: t!("card.prompt.syn"),
            candidates: &entry.definitions,
            separator: &settings.card.connectors.syn,
            auto_choice: "1".to_string(),
        }
        .select(&self.mode, input)?;
        Ok(selected)
    }

    /// Looks `phrase` up in the thesaurus and shows what it found. Failures
    /// are reported and yield `None`.
    fn show_thesaurus(&self, hit: &Hit<'_>, phrase: &str, options: &RenderOptions) -> Option<CanonicalEntry> {
        if !(self.settings.sources.thesaurus && hit.adapter.allows_thesaurus()) {
            return None;
        }
        let thesaurus = self.sources.thesaurus.as_deref()?;

        // "go (also go on)": only the headword itself has synonyms.
        let word = if phrase.split_whitespace().any(|word| word == "also") {
            phrase.split_whitespace().next().unwrap_or(phrase)
        } else {
            phrase
        };

        let entry = match lookup(thesaurus, word, &QueryFlags::default()) {
            Ok(found) => found.into_entry(),
            Err(e) => {
                log::warn!("Thesaurus lookup failed: {}", e);
                self.notice(&e.to_string());
                None
            }
        };
        let Some(entry) = entry else {
            println!("{} {}", t!("card.info.no_synonyms"), word);
            return None;
        };

        for line in render_entry(&entry, options) {
            println!("{}", line);
        }
        Some(entry)
    }

    fn audio_field(&self, hit: &Hit<'_>, selection: &Selection, query: &Query) -> String {
        let plan = plan_audio(
            &self.settings.sources,
            hit.dictionary,
            hit.adapter.supplies_audio(),
            selection.audio_url.as_deref(),
        );
        log::debug!("Audio plan: {:?}", plan);

        let url = match plan {
            AudioPlan::Skip => None,
            AudioPlan::EntryUrl(url) => Some(url),
            AudioPlan::Source(name) => match self.sources.audio_source(name) {
                Some(source) => source
                    .resolve_audio(&selection.phrase, query.flags.gram.primary())
                    .unwrap_or_else(|e| {
                        log::warn!("Audio lookup in {} failed: {}", name.as_str(), e);
                        None
                    }),
                None => None,
            },
        };

        let (Some(url), Some(store)) = (url, self.audio) else {
            return String::new();
        };
        store.store(&url).unwrap_or_else(|e| {
            log::warn!("Could not save audio: {}", e);
            self.notice(&format!("{} {}", t!("card.error.audio"), e));
            String::new()
        })
    }
}

/// Hands the card to every sink. A failing sink does not stop the others.
/// Returns how many sinks accepted the card.
pub fn dispatch(card: &CardFields, sinks: &mut [Box<dyn CardSink>], palette: &Palette) -> usize {
    let mut delivered = 0;
    for sink in sinks.iter_mut() {
        match sink.deliver(card) {
            Ok(report) => {
                delivered += 1;
                println!("{} {} ({})", t!("card.success.delivered").green(), sink.name(), report);
            }
            Err(e) => {
                log::warn!("Sink '{}' failed: {:#}", sink.name(), e);
                println!(
                    "{} {}: {}",
                    paint(t!("card.error.delivery"), palette.error),
                    sink.name(),
                    e
                );
            }
        }
    }
    transition(CardState::Dispatched, card.get(FieldName::Phrase));
    delivered
}
