// src/cli/handlers/settings.rs

//! Search-line commands that read or change a setting.
//!
//! Every toggle and value is a closed enum variant; the registry in
//! `cli::dispatcher` maps command names onto them once.

use anyhow::{Result, anyhow};
use colored::*;

use crate::cli::handlers::commons::{parse_switch, switch_label};
use crate::constants::{MAX_INDENT, MIN_TEXT_WIDTH};
use crate::core::color::{self, COLOR_NAMES};
use crate::models::{
    AudioSourceName, DictionaryName, FieldName, SentenceFallback, Settings, WrapStyle,
};
use crate::state;
use crate::system::executor;

// Generates the toggle enum together with its accessors, so a variant can
// never be added without saying which setting it flips.
macro_rules! toggles {
    ($($variant:ident => $($path:ident).+;)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Toggle {
            $($variant),*
        }

        impl Toggle {
            pub fn get(self, settings: &Settings) -> bool {
                match self {
                    $(Self::$variant => settings.$($path).+),*
                }
            }

            pub fn slot(self, settings: &mut Settings) -> &mut bool {
                match self {
                    $(Self::$variant => &mut settings.$($path).+),*
                }
            }
        }
    };
}

toggles! {
    Sentence => fields.sentence;
    Def => fields.def;
    Exsen => fields.exsen;
    Pos => fields.pos;
    Etym => fields.etym;
    Syn => fields.syn;
    Audio => fields.audio;
    HideDef => hide.def;
    HideExsen => hide.exsen;
    HideSentence => hide.sentence;
    HideSyn => hide.syn;
    HidePrepositions => hide.prepositions;
    KeepEndings => hide.keep_endings;
    ShowExamples => display.show_examples;
    FilterSubsenses => display.filter_subsenses;
    Preview => display.preview;
    Anki => anki.enabled;
    Duplicates => anki.duplicates;
    SaveCards => card.save_to_file;
    FormatDefs => card.format_definitions;
    CreateCards => card.create_cards;
    Thesaurus => sources.thesaurus;
    BulkFreeform => bulk.freeform;
}

/// The field switches flipped together by `-all`.
pub const FIELD_TOGGLES: [Toggle; 7] = [
    Toggle::Sentence,
    Toggle::Def,
    Toggle::Exsen,
    Toggle::Pos,
    Toggle::Etym,
    Toggle::Syn,
    Toggle::Audio,
];

/// Settings that take a value rather than on/off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSetting {
    TextWrap,
    TextWidth,
    Indent,
    HideAs,
    Dict,
    Dict2,
    Audio,
    AudioFallback,
    Deck,
    Note,
    Tags,
    SentenceFallback,
    DuplicateScope,
    FieldOrder,
    Color,
    Bulk,
    Recorder,
    CardFile,
    AudioDir,
}

fn invalid(command: &str, value: &str, expected: &str) -> anyhow::Error {
    anyhow!(
        t!("settings.error.invalid_value"),
        command = command,
        value = value,
        expected = expected
    )
}

/// Splits a list given as `a b c` or `a, b, c`.
fn split_list(value: &str) -> Vec<&str> {
    value
        .split([',', ' ', '\t'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

pub fn parse_field_order(value: &str) -> Result<Vec<FieldName>> {
    let mut order = Vec::new();
    for name in split_list(value) {
        let field = FieldName::parse(name).ok_or_else(|| invalid("fo", name, &field_names()))?;
        if !order.contains(&field) {
            order.push(field);
        }
    }
    if order.is_empty() {
        return Err(invalid("fo", value, &field_names()));
    }
    Ok(order)
}

fn field_names() -> String {
    FieldName::ALL
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_order(order: &[FieldName]) -> String {
    order
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

impl ValueSetting {
    /// The current value, as the user would type it.
    pub fn current(self, settings: &Settings) -> String {
        match self {
            Self::TextWrap => settings.display.wrap.as_str().to_string(),
            Self::TextWidth if settings.display.auto_width => "auto".to_string(),
            Self::TextWidth => settings.display.width.to_string(),
            Self::Indent => settings.display.indent().to_string(),
            Self::HideAs => settings.hide.mask.clone(),
            Self::Dict => settings.sources.dict.as_str().to_string(),
            Self::Dict2 => settings
                .sources
                .dict2
                .map(|dict| dict.as_str())
                .unwrap_or("-")
                .to_string(),
            Self::Audio => settings.sources.audio.as_str().to_string(),
            Self::AudioFallback => settings.sources.audio_fallback.as_str().to_string(),
            Self::Deck => settings.anki.deck.clone(),
            Self::Note => settings.anki.note.clone(),
            Self::Tags => settings.anki.tags.join(" "),
            Self::SentenceFallback => settings.card.sentence_fallback.as_str().to_string(),
            Self::DuplicateScope => settings.anki.duplicate_scope.clone(),
            Self::FieldOrder => join_order(&settings.card.field_order),
            Self::Color => {
                let colors = &settings.display.colors;
                format!(
                    "def1={} def2={} index={} phrase={} phonetic={} label={} example={} etym={} delimiter={} error={}",
                    colors.def1,
                    colors.def2,
                    colors.index,
                    colors.phrase,
                    colors.phonetic,
                    colors.label,
                    colors.example,
                    colors.etym,
                    colors.delimiter,
                    colors.error
                )
            }
            Self::Bulk => {
                let bulk = &settings.bulk;
                format!(
                    "def={} exsen={} pos={} etym={} syn={}",
                    bulk.def, bulk.exsen, bulk.pos, bulk.etym, bulk.syn
                )
            }
            Self::Recorder => settings.card.recorder.clone(),
            Self::CardFile => settings.card.card_file.clone(),
            Self::AudioDir => settings.card.audio_dir.clone(),
        }
    }

    /// Parses `value` and stores it. Nothing is changed on error.
    pub fn apply(self, command: &str, settings: &mut Settings, value: &str) -> Result<()> {
        let value = value.trim();
        match self {
            Self::TextWrap => {
                settings.display.wrap = WrapStyle::parse(value)
                    .ok_or_else(|| invalid(command, value, "justify, regular, cut"))?;
            }
            Self::TextWidth => {
                if value.eq_ignore_ascii_case("auto") {
                    settings.display.auto_width = true;
                } else {
                    let width: usize = value
                        .parse()
                        .map_err(|_| invalid(command, value, "a number or 'auto'"))?;
                    settings.display.width = width.max(MIN_TEXT_WIDTH);
                    settings.display.auto_width = false;
                }
            }
            Self::Indent => {
                let indent: usize = value
                    .parse()
                    .map_err(|_| invalid(command, value, "a number"))?;
                settings.display.indent = indent.min(MAX_INDENT);
            }
            Self::HideAs => {
                if value.is_empty() {
                    return Err(invalid(command, value, "some text"));
                }
                settings.hide.mask = value.to_string();
            }
            Self::Dict => {
                settings.sources.dict = DictionaryName::parse(value)
                    .ok_or_else(|| invalid(command, value, "freedict, idioms"))?;
            }
            Self::Dict2 => {
                settings.sources.dict2 = match value {
                    "-" | "off" => None,
                    _ => Some(
                        DictionaryName::parse(value)
                            .ok_or_else(|| invalid(command, value, "freedict, idioms, -"))?,
                    ),
                };
            }
            Self::Audio => {
                settings.sources.audio = AudioSourceName::parse(value)
                    .ok_or_else(|| invalid(command, value, "auto, freedict, commons, -"))?;
            }
            Self::AudioFallback => {
                settings.sources.audio_fallback = AudioSourceName::parse(value)
                    .ok_or_else(|| invalid(command, value, "auto, freedict, commons, -"))?;
            }
            Self::Deck => {
                if value.is_empty() {
                    return Err(invalid(command, value, "a deck name"));
                }
                settings.anki.deck = value.to_string();
            }
            Self::Note => settings.anki.note = value.to_string(),
            Self::Tags => {
                settings.anki.tags = split_list(value).into_iter().map(str::to_string).collect();
            }
            Self::SentenceFallback => {
                settings.card.sentence_fallback = SentenceFallback::parse(value)
                    .ok_or_else(|| invalid(command, value, "-, example, strict"))?;
            }
            Self::DuplicateScope => {
                let scope = value.to_lowercase();
                if scope != "deck" && scope != "collection" {
                    return Err(invalid(command, value, "deck, collection"));
                }
                settings.anki.duplicate_scope = scope;
            }
            Self::FieldOrder => settings.card.field_order = parse_field_order(value)?,
            Self::Color => {
                let (element, name) = value
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| invalid(command, value, "<element> <color>"))?;
                color::parse_color_name(name)
                    .map_err(|_| invalid(command, name, &COLOR_NAMES.join(", ")))?;
                let slot = color::element_mut(&mut settings.display.colors, element)
                    .ok_or_else(|| {
                        invalid(
                            command,
                            element,
                            "def1, def2, index, phrase, phonetic, label, example, etym, delimiter, error",
                        )
                    })?;
                *slot = name.trim().to_string();
            }
            Self::Bulk => {
                let (field, number) = value
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| invalid(command, value, "<field> <number>"))?;
                let number: i32 = number
                    .trim()
                    .parse()
                    .map_err(|_| invalid(command, number, "a number"))?;
                let slot = FieldName::parse(field)
                    .and_then(|field| settings.bulk.choice_mut(field))
                    .ok_or_else(|| invalid(command, field, "def, exsen, pos, etym, syn"))?;
                *slot = number;
            }
            Self::Recorder => {
                executor::build_command(value, std::path::Path::new("probe.mp3"))?;
                settings.card.recorder = value.to_string();
            }
            Self::CardFile => {
                if value.is_empty() {
                    return Err(invalid(command, value, "a file path"));
                }
                settings.card.card_file = value.to_string();
            }
            Self::AudioDir => {
                if value.is_empty() {
                    return Err(invalid(command, value, "a directory path"));
                }
                settings.card.audio_dir = value.to_string();
            }
        }
        Ok(())
    }
}

fn print_value(command: &str, value: &str) {
    println!("{} {}", format!("{}:", command).bold(), value.cyan());
}

/// `-<toggle> [on|off]`. Without an argument the current state is shown.
pub fn handle_toggle(command: &str, toggle: Toggle, arg: &str) -> Result<()> {
    let mut guard = state::lock_settings();
    if arg.trim().is_empty() {
        print_value(command, switch_label(toggle.get(&guard)));
        return Ok(());
    }
    let value = parse_switch(arg).ok_or_else(|| invalid(command, arg.trim(), "on, off"))?;
    *toggle.slot(&mut guard) = value;
    print_value(command, switch_label(value));
    Ok(())
}

/// `-all [on|off]` flips every field switch at once.
pub fn handle_all_fields(arg: &str) -> Result<()> {
    let mut guard = state::lock_settings();
    if arg.trim().is_empty() {
        for toggle in FIELD_TOGGLES {
            print_value(&format!("{:?}", toggle).to_lowercase(), switch_label(toggle.get(&guard)));
        }
        return Ok(());
    }
    let value = parse_switch(arg).ok_or_else(|| invalid("all", arg.trim(), "on, off"))?;
    for toggle in FIELD_TOGGLES {
        *toggle.slot(&mut guard) = value;
    }
    print_value("all", switch_label(value));
    Ok(())
}

/// `-<setting> [value]`. Without an argument the current value is shown.
pub fn handle_value(command: &str, setting: ValueSetting, arg: &str) -> Result<()> {
    let mut guard = state::lock_settings();
    if !arg.trim().is_empty() {
        setting.apply(command, &mut guard, arg)?;
    }
    print_value(command, &setting.current(&guard));
    Ok(())
}
