// src/system/anki.rs

//! Card delivery to a running Anki through the AnkiConnect add-on.
//!
//! Card fields reach the note type through a mapping built from the note's
//! own field names. Mappings are cached per note type in `note_fields.toml`
//! and rebuilt on `-refresh`.

use crate::constants::{ANKICONNECT_VERSION, HTTP_TIMEOUT_SECS};
use crate::core::config_loader::write_atomically;
use crate::core::paths::display_path;
use crate::core::pipeline::CardSink;
use crate::models::{AnkiSettings, CardFields, FieldName};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Could not reach AnkiConnect at {url}. Is Anki open? ({reason})")]
    Unreachable { url: String, reason: String },
    #[error("Unexpected AnkiConnect response: {0}")]
    Protocol(String),
    #[error("No note type is set. Choose one with `-note`")]
    NoNoteType,
    #[error("No field of note type '{0}' matches a card field. Check its field names or run `-refresh`")]
    NoFieldsMapped(String),
    #[error("Could not access the note field cache at '{path}': {reason}")]
    Cache { path: String, reason: String },
}

/// What AnkiConnect made of an `addNote` request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    #[error("Created note {0}")]
    Created(u64),
    #[error("The card is a duplicate. Allow duplicates with `-duplicates on` or narrow the check with `-dupescope deck`")]
    Duplicate,
    #[error("The first field of the note type would be empty")]
    EmptyRequiredField,
    #[error("The collection is not available. Is a profile open in Anki?")]
    CollectionUnavailable,
    #[error("Deck '{0}' was not found. Change it with `-deck`")]
    DeckNotFound(String),
    #[error("Note type '{0}' was not found. Change it with `-note`")]
    NoteTypeNotFound(String),
    #[error("AnkiConnect error: {0}")]
    Rejected(String),
}

/// Turns an AnkiConnect error string into a specific outcome.
pub(crate) fn classify(error: &str, deck: &str, note: &str) -> AddOutcome {
    let lowered = error.to_lowercase();
    if lowered.starts_with("model was not found") {
        AddOutcome::NoteTypeNotFound(note.to_string())
    } else if lowered.starts_with("cannot create note because it is empty") {
        AddOutcome::EmptyRequiredField
    } else if lowered.starts_with("cannot create note because it is a duplicate") {
        AddOutcome::Duplicate
    } else if lowered.starts_with("collection is not available") {
        AddOutcome::CollectionUnavailable
    } else if lowered.starts_with("deck was not found") {
        AddOutcome::DeckNotFound(deck.to_string())
    } else {
        AddOutcome::Rejected(error.to_string())
    }
}

#[derive(Serialize)]
struct AnkiRequest<'a> {
    action: &'a str,
    version: u32,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct AnkiResponse<T> {
    result: Option<T>,
    error: Option<String>,
}

impl<T> AnkiResponse<T> {
    fn into_result(self) -> Result<T, String> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.result.ok_or_else(|| "null result".to_string())
    }
}

/// Blocking AnkiConnect client.
#[derive(Debug, Clone)]
pub struct AnkiClient {
    url: String,
    client: Client,
}

impl AnkiClient {
    pub fn new(url: &str) -> Result<Self, RpcError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| RpcError::Protocol(e.to_string()))?;
        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    /// Sends one action. An error reported by AnkiConnect comes back as
    /// `Ok(Err(message))` so callers can classify it.
    fn invoke<T>(&self, action: &str, params: serde_json::Value) -> Result<Result<T, String>, RpcError>
    where
        T: for<'de> Deserialize<'de>,
    {
        log::debug!("AnkiConnect action '{}'", action);
        let request = AnkiRequest {
            action,
            version: ANKICONNECT_VERSION,
            params,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .map_err(|e| RpcError::Unreachable {
                url: self.url.clone(),
                reason: e.to_string(),
            })?;
        let response: AnkiResponse<T> = response
            .json()
            .map_err(|e| RpcError::Protocol(e.to_string()))?;
        Ok(response.into_result())
    }

    pub fn version(&self) -> Result<u32, RpcError> {
        self.invoke("version", json!({}))?
            .map_err(RpcError::Protocol)
    }

    /// Field names of a note type. An unknown note type is `Ok(Err(..))`.
    pub fn model_field_names(&self, note: &str) -> Result<Result<Vec<String>, AddOutcome>, RpcError> {
        Ok(self
            .invoke("modelFieldNames", json!({ "modelName": note }))?
            .map_err(|e| classify(&e, "", note)))
    }

    pub fn add_note(
        &self,
        settings: &AnkiSettings,
        fields: &BTreeMap<String, String>,
    ) -> Result<AddOutcome, RpcError> {
        let params = json!({
            "note": {
                "deckName": settings.deck,
                "modelName": settings.note,
                "fields": fields,
                "options": {
                    "allowDuplicate": settings.duplicates,
                    "duplicateScope": settings.duplicate_scope,
                },
                "tags": settings.tags,
            }
        });
        Ok(match self.invoke("addNote", params)? {
            Ok(id) => AddOutcome::Created(id),
            Err(e) => classify(&e, &settings.deck, &settings.note),
        })
    }
}

// --- NOTE FIELD MAPPING ---

/// Words that tie a note field to a card field. The first match wins.
const FIELD_KEYWORDS: &[(&str, FieldName)] = &[
    ("def", FieldName::Def),
    ("syn", FieldName::Syn),
    ("exsen", FieldName::Exsen),
    ("example", FieldName::Exsen),
    ("phrase", FieldName::Phrase),
    ("word", FieldName::Phrase),
    ("sentence", FieldName::Sentence),
    ("pos", FieldName::Pos),
    ("etym", FieldName::Etym),
    ("recording", FieldName::Recording),
    ("audio", FieldName::Audio),
    ("sound", FieldName::Audio),
];

/// Maps note field names to card fields by the first word of each name.
pub fn map_note_fields(note_fields: &[String]) -> BTreeMap<String, FieldName> {
    let mut mapping = BTreeMap::new();
    for note_field in note_fields {
        let Some(first_word) = note_field.split_whitespace().next() else {
            continue;
        };
        let first_word = first_word.to_lowercase();
        if let Some((_, field)) = FIELD_KEYWORDS
            .iter()
            .find(|(keyword, _)| first_word.contains(keyword))
        {
            mapping.insert(note_field.clone(), *field);
        }
    }
    mapping
}

/// The note fields filled from a card, one entry per mapped note field.
pub fn note_values(mapping: &BTreeMap<String, FieldName>, card: &CardFields) -> BTreeMap<String, String> {
    mapping
        .iter()
        .map(|(note_field, field)| (note_field.clone(), card.get(*field).to_string()))
        .collect()
}

/// Field mappings per note type, persisted between sessions.
#[derive(Debug, Default)]
pub struct NoteFieldCache {
    path: PathBuf,
    notes: BTreeMap<String, BTreeMap<String, FieldName>>,
}

impl NoteFieldCache {
    /// Reads the cache. A missing file is an empty cache.
    pub fn load(path: &Path) -> Result<Self, RpcError> {
        let cache_error = |reason: String| RpcError::Cache {
            path: display_path(path),
            reason,
        };
        let notes = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| cache_error(e.to_string()))?;
            toml::from_str(&content).map_err(|e| cache_error(e.to_string()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            notes,
        })
    }

    pub fn save(&self) -> Result<(), RpcError> {
        let cache_error = |reason: String| RpcError::Cache {
            path: display_path(&self.path),
            reason,
        };
        let content = toml::to_string_pretty(&self.notes).map_err(|e| cache_error(e.to_string()))?;
        write_atomically(&self.path, content.as_bytes()).map_err(|e| cache_error(e.to_string()))
    }

    pub fn get(&self, note: &str) -> Option<&BTreeMap<String, FieldName>> {
        self.notes.get(note)
    }

    pub fn insert(&mut self, note: &str, mapping: BTreeMap<String, FieldName>) {
        self.notes.insert(note.to_string(), mapping);
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

/// A note type none of whose fields map to a card field is unusable.
fn mapping_for(note: &str, note_fields: &[String]) -> Result<BTreeMap<String, FieldName>, RpcError> {
    let mapping = map_note_fields(note_fields);
    if mapping.is_empty() {
        return Err(RpcError::NoFieldsMapped(note.to_string()));
    }
    Ok(mapping)
}

/// Fetches the field names of `note` and caches their mapping.
pub fn refresh_note(
    client: &AnkiClient,
    cache: &mut NoteFieldCache,
    note: &str,
) -> anyhow::Result<BTreeMap<String, FieldName>> {
    let names = client.model_field_names(note)??;
    let mapping = mapping_for(note, &names)?;
    log::info!("Mapped note type '{}': {:?}", note, mapping);
    cache.insert(note, mapping.clone());
    cache.save()?;
    Ok(mapping)
}

// --- SINK ---

/// Delivers cards as Anki notes.
#[derive(Debug)]
pub struct AnkiSink {
    client: AnkiClient,
    cache: NoteFieldCache,
    settings: AnkiSettings,
}

impl AnkiSink {
    pub fn new(settings: &AnkiSettings, cache_path: &Path) -> Result<Self, RpcError> {
        Ok(Self {
            client: AnkiClient::new(&settings.url)?,
            cache: NoteFieldCache::load(cache_path)?,
            settings: settings.clone(),
        })
    }

    fn mapping(&mut self) -> anyhow::Result<BTreeMap<String, FieldName>> {
        if self.settings.note.trim().is_empty() {
            return Err(RpcError::NoNoteType.into());
        }
        match self.cache.get(&self.settings.note) {
            Some(mapping) => Ok(mapping.clone()),
            None => refresh_note(&self.client, &mut self.cache, &self.settings.note),
        }
    }
}

impl CardSink for AnkiSink {
    fn name(&self) -> &str {
        "Anki"
    }

    fn deliver(&mut self, card: &CardFields) -> anyhow::Result<String> {
        let mapping = self.mapping()?;
        let values = note_values(&mapping, card);
        match self.client.add_note(&self.settings, &values)? {
            AddOutcome::Created(id) => log::debug!("Created note {}", id),
            outcome => return Err(outcome.into()),
        }

        let used: Vec<&str> = values
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, _)| name.as_str())
            .collect();
        Ok(format!(
            "deck: {} | note: {} | fields: {} | tags: {}",
            self.settings.deck,
            self.settings.note,
            used.join(", "),
            self.settings.tags.join(", ")
        ))
    }
}

/// Rebuilds the cached mapping of the configured note type.
pub fn refresh(settings: &AnkiSettings, cache_path: &Path) -> anyhow::Result<BTreeMap<String, FieldName>> {
    if settings.note.trim().is_empty() {
        return Err(RpcError::NoNoteType.into());
    }
    let client = AnkiClient::new(&settings.url)?;
    let mut cache = NoteFieldCache::load(cache_path)?;
    cache.clear();
    refresh_note(&client, &mut cache, &settings.note)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_error_strings_are_classified() {
        let cases = [
            ("model was not found: Basic", "NoteTypeNotFound"),
            ("cannot create note because it is empty", "EmptyRequiredField"),
            ("cannot create note because it is a duplicate", "Duplicate"),
            ("Collection is not available", "CollectionUnavailable"),
            ("deck was not found: Words", "DeckNotFound"),
            ("something else went wrong", "Rejected"),
        ];
        for (message, expected) in cases {
            let error = classify(message, "Words", "Basic");
            let variant = format!("{:?}", error);
            assert!(variant.starts_with(expected), "'{}' gave {}", message, variant);
        }
    }

    #[test]
    fn test_remediation_names_the_setting() {
        assert!(classify("deck was not found", "Words", "").to_string().contains("-deck"));
        assert!(classify("model was not found", "", "Basic").to_string().contains("-note"));
        assert!(AddOutcome::Duplicate.to_string().contains("-duplicates on"));
        assert!(RpcError::NoNoteType.to_string().contains("-note"));
    }

    #[test]
    fn test_note_fields_map_by_first_word() {
        let mapping = map_note_fields(&names(&[
            "Definition",
            "Synonyms",
            "Example sentence",
            "Sentence audio",
            "Word",
            "POS",
            "Etymology",
            "Audio",
            "Front",
        ]));

        assert_eq!(mapping.get("Definition"), Some(&FieldName::Def));
        assert_eq!(mapping.get("Synonyms"), Some(&FieldName::Syn));
        assert_eq!(mapping.get("Example sentence"), Some(&FieldName::Exsen));
        assert_eq!(mapping.get("Sentence audio"), Some(&FieldName::Sentence));
        assert_eq!(mapping.get("Word"), Some(&FieldName::Phrase));
        assert_eq!(mapping.get("POS"), Some(&FieldName::Pos));
        assert_eq!(mapping.get("Etymology"), Some(&FieldName::Etym));
        assert_eq!(mapping.get("Audio"), Some(&FieldName::Audio));
        assert_eq!(mapping.get("Front"), None);
    }

    #[test]
    fn test_note_type_without_known_fields_is_rejected() {
        let result = mapping_for("Basic", &names(&["Front", "Back"]));
        assert!(matches!(result, Err(RpcError::NoFieldsMapped(note)) if note == "Basic"));

        let mapping = mapping_for("Vocab", &names(&["Front", "Word"])).unwrap();
        assert_eq!(mapping.len(), 1);
    }

    #[test]
    fn test_note_values_follow_the_mapping() {
        let mapping = map_note_fields(&names(&["Word", "Meaning def", "Definition"]));
        let mut card = CardFields::default();
        card.set(FieldName::Phrase, "mint");
        card.set(FieldName::Def, "a plant");

        let values = note_values(&mapping, &card);
        assert_eq!(values.get("Word").map(String::as_str), Some("mint"));
        assert_eq!(values.get("Definition").map(String::as_str), Some("a plant"));
        assert!(!values.contains_key("Meaning def"));
    }

    #[test]
    fn test_cache_round_trip_keeps_field_names() {
        // --- Setup ---
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note_fields.toml");
        let mut cache = NoteFieldCache::load(&path).unwrap();
        assert!(cache.get("Vocab").is_none());

        // --- Execute ---
        cache.insert("Vocab", map_note_fields(&names(&["Word", "Definition"])));
        cache.save().unwrap();
        let reloaded = NoteFieldCache::load(&path).unwrap();

        // --- Assert ---
        let mapping = reloaded.get("Vocab").unwrap();
        assert_eq!(mapping.get("Word"), Some(&FieldName::Phrase));
        assert_eq!(mapping.get("Definition"), Some(&FieldName::Def));
    }

    #[test]
    fn test_sink_without_note_type_fails_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let settings = AnkiSettings {
            url: "http://127.0.0.1:9".to_string(),
            ..AnkiSettings::default()
        };
        let mut sink = AnkiSink::new(&settings, &dir.path().join("cache.toml")).unwrap();
        let error = sink.deliver(&CardFields::default()).unwrap_err();
        assert!(error.to_string().contains("-note"));
    }
}
