// src/cli/dispatcher.rs

use anyhow::Result;

use crate::cli::handlers::{
    self,
    settings::{Toggle, ValueSetting},
};
use crate::cli::session::Session;
use crate::state;

// --- Command Definition and Registry ---

/// Commands that do something instead of changing a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    AllFields,
    DeleteLast,
    DefineAll,
    Record,
    Refresh,
    Config,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Toggle(Toggle),
    Value(ValueSetting),
    Action(Action),
}

/// A search-line command: `-name [argument]`.
#[derive(Debug)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: CommandKind,
}

const fn toggle(name: &'static str, aliases: &'static [&'static str], toggle: Toggle) -> CommandDefinition {
    CommandDefinition {
        name,
        aliases,
        kind: CommandKind::Toggle(toggle),
    }
}

const fn value(name: &'static str, aliases: &'static [&'static str], setting: ValueSetting) -> CommandDefinition {
    CommandDefinition {
        name,
        aliases,
        kind: CommandKind::Value(setting),
    }
}

const fn action(name: &'static str, aliases: &'static [&'static str], action: Action) -> CommandDefinition {
    CommandDefinition {
        name,
        aliases,
        kind: CommandKind::Action(action),
    }
}

/// The single source of truth for all search-line commands.
pub static COMMAND_REGISTRY: &[CommandDefinition] = &[
    // Field switches.
    toggle("pz", &["sentence"], Toggle::Sentence),
    toggle("def", &[], Toggle::Def),
    toggle("exsen", &[], Toggle::Exsen),
    toggle("pos", &[], Toggle::Pos),
    toggle("etym", &[], Toggle::Etym),
    toggle("syn", &[], Toggle::Syn),
    toggle("audio-on", &[], Toggle::Audio),
    action("all", &[], Action::AllFields),
    // Hiding.
    toggle("hidedef", &[], Toggle::HideDef),
    toggle("hideexsen", &[], Toggle::HideExsen),
    toggle("hidepz", &["hidesentence"], Toggle::HideSentence),
    toggle("hidesyn", &[], Toggle::HideSyn),
    toggle("upreps", &[], Toggle::HidePrepositions),
    toggle("keependings", &[], Toggle::KeepEndings),
    value("hideas", &["mask"], ValueSetting::HideAs),
    // Display.
    toggle("showexsen", &[], Toggle::ShowExamples),
    toggle("fsubdefs", &[], Toggle::FilterSubsenses),
    toggle("preview", &[], Toggle::Preview),
    value("textwrap", &[], ValueSetting::TextWrap),
    value("textwidth", &[], ValueSetting::TextWidth),
    value("indent", &[], ValueSetting::Indent),
    value("color", &["colors"], ValueSetting::Color),
    // Sources.
    value("dict", &[], ValueSetting::Dict),
    value("dict2", &[], ValueSetting::Dict2),
    toggle("thesaurus", &[], Toggle::Thesaurus),
    value("audio", &[], ValueSetting::Audio),
    value("audiofb", &["audio-fallback"], ValueSetting::AudioFallback),
    // Cards.
    toggle("createcards", &[], Toggle::CreateCards),
    toggle("savecards", &[], Toggle::SaveCards),
    toggle("formatdefs", &[], Toggle::FormatDefs),
    value("tsc", &[], ValueSetting::SentenceFallback),
    value("fo", &["fieldorder"], ValueSetting::FieldOrder),
    value("cardfile", &[], ValueSetting::CardFile),
    value("audiodir", &[], ValueSetting::AudioDir),
    value("recorder", &[], ValueSetting::Recorder),
    // Anki.
    toggle("ankiconnect", &["anki"], Toggle::Anki),
    toggle("duplicates", &[], Toggle::Duplicates),
    value("deck", &[], ValueSetting::Deck),
    value("note", &[], ValueSetting::Note),
    value("tags", &[], ValueSetting::Tags),
    value("dupescope", &[], ValueSetting::DuplicateScope),
    // Bulk.
    toggle("bulkfree", &[], Toggle::BulkFreeform),
    value("bulk", &[], ValueSetting::Bulk),
    // Actions.
    action("delete-last", &["dl"], Action::DeleteLast),
    action("define-all", &["da"], Action::DefineAll),
    action("rec", &["record"], Action::Record),
    action("refresh", &[], Action::Refresh),
    action("config", &["settings"], Action::Config),
    action("help", &["h"], Action::Help),
];

/// Finds a command definition in the registry by its name or alias.
pub fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Splits `-name argument...` into the command name (dashes removed,
/// lowercased) and the raw argument text.
pub fn split_command(line: &str) -> Option<(String, &str)> {
    let line = line.trim();
    if !line.starts_with('-') {
        return None;
    }
    let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let name = head.trim_start_matches('-').to_lowercase();
    if name.is_empty() {
        return None;
    }
    Some((name, rest.trim()))
}

/// Runs `line` if it is a command. Returns `Ok(false)` for lines that are
/// not commands, which the caller treats as queries.
pub fn dispatch(line: &str, session: &mut Session) -> Result<bool> {
    let Some((name, arg)) = split_command(line) else {
        return Ok(false);
    };
    let Some(command) = find_command(&name) else {
        return Ok(false);
    };
    log::debug!("Dispatching command '{}' with argument {:?}", command.name, arg);

    match command.kind {
        CommandKind::Toggle(toggle) => handlers::settings::handle_toggle(command.name, toggle, arg)?,
        CommandKind::Value(setting) => {
            handlers::settings::handle_value(command.name, setting, arg)?;
            if setting == ValueSetting::Color {
                session.reload_palette();
            }
        }
        CommandKind::Action(action) => match action {
            Action::AllFields => handlers::settings::handle_all_fields(arg)?,
            Action::DeleteLast => handlers::delete::handle(arg)?,
            Action::DefineAll => handlers::bulk::handle(session, arg)?,
            Action::Record => handlers::record::handle()?,
            Action::Refresh => handlers::refresh::handle()?,
            Action::Config => handlers::info::handle()?,
            Action::Help => handlers::help::handle()?,
        },
    }

    // The "persist updated setting" side-channel: only mutations reach disk.
    if state::save_if_dirty()? {
        log::debug!("Command '{}' changed the settings", command.name);
    }
    Ok(true)
}
