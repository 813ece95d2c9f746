// src/cli/handlers/info.rs

use anyhow::Result;
use colored::*;

use crate::cli::handlers::commons::switch_label;
use crate::cli::handlers::settings::ValueSetting;
use crate::core::paths::{self, display_path};
use crate::models::Settings;
use crate::state;

fn row(label: &str, value: &str) {
    println!("  {:<22} {}", format!("{}:", label).dimmed(), value);
}

fn field_switches(settings: &Settings) -> String {
    let fields = &settings.fields;
    [
        ("pz", fields.sentence),
        ("def", fields.def),
        ("exsen", fields.exsen),
        ("pos", fields.pos),
        ("etym", fields.etym),
        ("syn", fields.syn),
        ("audio", fields.audio),
    ]
    .iter()
    .map(|(name, on)| format!("{}={}", name, switch_label(*on)))
    .collect::<Vec<_>>()
    .join(" ")
}

fn hide_switches(settings: &Settings) -> String {
    let hide = &settings.hide;
    [
        ("pz", hide.sentence),
        ("def", hide.def),
        ("exsen", hide.exsen),
        ("syn", hide.syn),
        ("upreps", hide.prepositions),
        ("keependings", hide.keep_endings),
    ]
    .iter()
    .map(|(name, on)| format!("{}={}", name, switch_label(*on)))
    .collect::<Vec<_>>()
    .join(" ")
}

/// `-config`: prints the current configuration and where it is stored.
pub fn handle() -> Result<()> {
    let settings = state::snapshot();

    println!("\n{}", t!("info.title.config").bold().yellow());
    row("config file", &display_path(&paths::get_config_path()?));
    row("fields", &field_switches(&settings));
    row("hide", &hide_switches(&settings));
    row("mask", &settings.hide.mask);

    println!("\n{}", t!("info.title.sources").bold().yellow());
    for (label, setting) in [
        ("dict", ValueSetting::Dict),
        ("dict2", ValueSetting::Dict2),
        ("audio", ValueSetting::Audio),
        ("audio fallback", ValueSetting::AudioFallback),
    ] {
        row(label, &setting.current(&settings));
    }
    row("thesaurus", switch_label(settings.sources.thesaurus));

    println!("\n{}", t!("info.title.cards").bold().yellow());
    row("create cards", switch_label(settings.card.create_cards));
    let card_file = format!(
        "{} ({})",
        settings.card.card_file,
        switch_label(settings.card.save_to_file)
    );
    row("card file", &card_file);
    for (label, setting) in [
        ("field order", ValueSetting::FieldOrder),
        ("sentence fallback", ValueSetting::SentenceFallback),
        ("audio dir", ValueSetting::AudioDir),
        ("recorder", ValueSetting::Recorder),
        ("bulk", ValueSetting::Bulk),
    ] {
        row(label, &setting.current(&settings));
    }
    row("bulk freeform", switch_label(settings.bulk.freeform));
    row("format defs", switch_label(settings.card.format_definitions));

    println!("\n{}", t!("info.title.anki").bold().yellow());
    row("ankiconnect", switch_label(settings.anki.enabled));
    row("url", &settings.anki.url);
    for (label, setting) in [
        ("deck", ValueSetting::Deck),
        ("note", ValueSetting::Note),
        ("tags", ValueSetting::Tags),
        ("duplicate scope", ValueSetting::DuplicateScope),
    ] {
        row(label, &setting.current(&settings));
    }
    row("duplicates", switch_label(settings.anki.duplicates));

    println!("\n{}", t!("info.title.display").bold().yellow());
    for (label, setting) in [
        ("textwrap", ValueSetting::TextWrap),
        ("textwidth", ValueSetting::TextWidth),
        ("indent", ValueSetting::Indent),
        ("colors", ValueSetting::Color),
    ] {
        row(label, &setting.current(&settings));
    }
    row("show examples", switch_label(settings.display.show_examples));
    row("filter subsenses", switch_label(settings.display.filter_subsenses));
    row("preview", switch_label(settings.display.preview));
    println!();
    Ok(())
}
