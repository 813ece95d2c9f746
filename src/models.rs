// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{
    ANKICONNECT_URL, DEFAULT_CARD_FILE, DEFAULT_MASK, DEFAULT_TEXT_WIDTH, MAX_INDENT,
};

// --- CANONICAL ENTRY ---
// The source-agnostic shape every dictionary adapter reduces its page to.

/// One normalized dictionary lookup result.
///
/// `definitions`, `example_sentences` and `subsenses` share the *definition
/// index* space. `phrases`, `phonetics` and `etymologies` are aligned to
/// headword blocks; `grammatical_labels` and `audio_urls` to grammatical
/// blocks. Both mapping vectors carry one extra trailing sentinel, so their
/// length is always `definitions.len() + 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalEntry {
    /// Display name of the source, used as the rendering title.
    pub source: String,
    pub phrases: Vec<String>,
    pub phonetics: Vec<String>,
    pub definitions: Vec<String>,
    pub example_sentences: Vec<String>,
    /// `true` when the definition at that index is a nested sense.
    pub subsenses: Vec<bool>,
    pub etymologies: Vec<String>,
    pub grammatical_labels: Vec<String>,
    pub audio_urls: Vec<String>,
    pub def_index_to_phrase_block: Vec<usize>,
    pub def_index_to_gram_block: Vec<usize>,
}

impl CanonicalEntry {
    /// Sentinel of the headword-block mapping (one past the last block).
    pub fn phrase_sentinel(&self) -> usize {
        self.def_index_to_phrase_block.last().copied().unwrap_or(0)
    }

    /// Sentinel of the grammatical-block mapping.
    pub fn gram_sentinel(&self) -> usize {
        self.def_index_to_gram_block.last().copied().unwrap_or(0)
    }

    /// Returns the first non-empty audio url, starting from `gram_block`.
    pub fn audio_url_for(&self, gram_block: usize) -> Option<&str> {
        self.audio_urls
            .get(gram_block)
            .filter(|url| !url.is_empty())
            .or_else(|| self.audio_urls.iter().find(|url| !url.is_empty()))
            .map(String::as_str)
    }
}

/// Incrementally assembles a [`CanonicalEntry`] while an adapter walks its
/// source, keeping the parallel index spaces in step.
#[derive(Debug, Default)]
pub struct EntryBuilder {
    entry: CanonicalEntry,
    open_phrase: Option<usize>,
    open_gram: Option<usize>,
}

impl EntryBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            entry: CanonicalEntry {
                source: source.into(),
                ..Default::default()
            },
            open_phrase: None,
            open_gram: None,
        }
    }

    /// Starts a new headword block. Grammatical blocks opened afterwards belong to it.
    pub fn begin_phrase(
        &mut self,
        phrase: impl Into<String>,
        phonetic: impl Into<String>,
        etymology: impl Into<String>,
    ) -> &mut Self {
        self.entry.phrases.push(phrase.into());
        self.entry.phonetics.push(phonetic.into());
        self.entry.etymologies.push(etymology.into());
        self.open_phrase = Some(self.entry.phrases.len() - 1);
        self.open_gram = None;
        self
    }

    /// Starts a new grammatical block inside the current headword block.
    pub fn begin_gram_block(
        &mut self,
        label: impl Into<String>,
        audio_url: impl Into<String>,
    ) -> &mut Self {
        self.entry.grammatical_labels.push(label.into());
        self.entry.audio_urls.push(audio_url.into());
        self.open_gram = Some(self.entry.grammatical_labels.len() - 1);
        self
    }

    /// Appends a definition to the open blocks. Definitions pushed before any
    /// block was opened are attached to implicit empty blocks.
    pub fn push_definition(
        &mut self,
        definition: impl Into<String>,
        example: impl Into<String>,
        subsense: bool,
    ) -> &mut Self {
        let phrase_block = match self.open_phrase {
            Some(block) => block,
            None => {
                self.begin_phrase("", "", "");
                self.entry.phrases.len() - 1
            }
        };
        let gram_block = match self.open_gram {
            Some(block) => block,
            None => {
                self.begin_gram_block("", "");
                self.entry.grammatical_labels.len() - 1
            }
        };

        self.entry.definitions.push(definition.into().trim().to_string());
        self.entry.example_sentences.push(example.into().trim().to_string());
        self.entry.subsenses.push(subsense);
        self.entry.def_index_to_phrase_block.push(phrase_block);
        self.entry.def_index_to_gram_block.push(gram_block);
        self
    }

    /// Closes the entry by appending the sentinels. Returns `None` when no
    /// definition was collected, which adapters report as "not found".
    pub fn finish(mut self) -> Option<CanonicalEntry> {
        if self.entry.definitions.is_empty() {
            return None;
        }
        let phrase_sentinel = self.entry.phrases.len();
        let gram_sentinel = self.entry.grammatical_labels.len();
        self.entry.def_index_to_phrase_block.push(phrase_sentinel);
        self.entry.def_index_to_gram_block.push(gram_sentinel);
        Some(self.entry)
    }
}

// --- CARD FIELDS ---

/// The fields a finished card can carry, in their default file order.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldName {
    Def,
    Syn,
    Exsen,
    Phrase,
    Sentence,
    Pos,
    Etym,
    Audio,
    Recording,
}

impl FieldName {
    pub const ALL: [Self; 9] = [
        Self::Def,
        Self::Syn,
        Self::Exsen,
        Self::Phrase,
        Self::Sentence,
        Self::Pos,
        Self::Etym,
        Self::Audio,
        Self::Recording,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Def => "def",
            Self::Syn => "syn",
            Self::Exsen => "exsen",
            Self::Phrase => "phrase",
            Self::Sentence => "sentence",
            Self::Pos => "pos",
            Self::Etym => "etym",
            Self::Audio => "audio",
            Self::Recording => "recording",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == name.trim().to_lowercase())
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The content of one card, keyed by field. Missing fields read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFields {
    values: BTreeMap<FieldName, String>,
}

impl CardFields {
    pub fn get(&self, field: FieldName) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or_default()
    }

    pub fn set(&mut self, field: FieldName, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn take(&mut self, field: FieldName) -> String {
        self.values.remove(&field).unwrap_or_default()
    }

    /// Applies `f` to every present field.
    pub fn map_values(&mut self, mut f: impl FnMut(&str) -> String) {
        for value in self.values.values_mut() {
            *value = f(value);
        }
    }

    /// Values in the requested order, one per requested field.
    pub fn ordered<'a>(&'a self, order: &'a [FieldName]) -> impl Iterator<Item = &'a str> + 'a {
        order.iter().map(move |field| self.get(*field))
    }
}

// --- SETTINGS ---
// What is read from and written to `config.toml`.

/// Line wrapping strategy used by the renderer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WrapStyle {
    #[default]
    Justify,
    Regular,
    Cut,
}

impl WrapStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Justify => "justify",
            Self::Regular => "regular",
            Self::Cut => "cut",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "justify" => Some(Self::Justify),
            "regular" => Some(Self::Regular),
            "cut" => Some(Self::Cut),
            _ => None,
        }
    }
}

/// Dictionaries that can answer a query.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum DictionaryName {
    #[default]
    Freedict,
    Idioms,
}

impl DictionaryName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Freedict => "freedict",
            Self::Idioms => "idioms",
        }
    }

    /// Accepts the canonical names and the short query flags.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "freedict" | "fd" | "f" | "dict" => Some(Self::Freedict),
            "idioms" | "idiom" | "i" => Some(Self::Idioms),
            _ => None,
        }
    }
}

/// Where pronunciation audio is taken from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioSourceName {
    #[default]
    Auto,
    Freedict,
    Commons,
    #[serde(rename = "-")]
    Off,
}

impl AudioSourceName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Freedict => "freedict",
            Self::Commons => "commons",
            Self::Off => "-",
        }
    }

    /// Whether this source is the pronunciation feed of `dictionary`.
    pub fn belongs_to(self, dictionary: DictionaryName) -> bool {
        matches!(
            (self, dictionary),
            (Self::Freedict, DictionaryName::Freedict)
        )
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "freedict" => Some(Self::Freedict),
            "commons" => Some(Self::Commons),
            "-" | "off" | "none" => Some(Self::Off),
            _ => None,
        }
    }
}

/// What fills the sentence field when the user gives no sentence.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SentenceFallback {
    #[default]
    #[serde(rename = "-")]
    Off,
    /// Move the chosen example sentence into the sentence field.
    Example,
    /// Like `Example`, but use the phrase itself when there is no example.
    Strict,
}

impl SentenceFallback {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "-",
            Self::Example => "example",
            Self::Strict => "strict",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "-" | "off" => Some(Self::Off),
            "example" => Some(Self::Example),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FieldToggles {
    pub sentence: bool,
    pub def: bool,
    pub exsen: bool,
    pub pos: bool,
    pub etym: bool,
    pub syn: bool,
    pub audio: bool,
}

impl Default for FieldToggles {
    fn default() -> Self {
        Self {
            sentence: true,
            def: true,
            exsen: true,
            pos: true,
            etym: true,
            syn: true,
            audio: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HideSettings {
    /// Replacement inserted wherever the phrase occurs.
    pub mask: String,
    pub sentence: bool,
    pub def: bool,
    pub exsen: bool,
    pub syn: bool,
    /// Also hide prepositions that are part of the phrase.
    pub prepositions: bool,
    pub keep_endings: bool,
}

impl Default for HideSettings {
    fn default() -> Self {
        Self {
            mask: DEFAULT_MASK.to_string(),
            sentence: true,
            def: false,
            exsen: true,
            syn: true,
            prepositions: false,
            keep_endings: true,
        }
    }
}

/// Terminal colors, by color name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ColorSettings {
    pub def1: String,
    pub def2: String,
    pub index: String,
    pub phrase: String,
    pub phonetic: String,
    pub label: String,
    pub example: String,
    pub etym: String,
    pub delimiter: String,
    pub error: String,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            def1: "reset".to_string(),
            def2: "bright white".to_string(),
            index: "bright black".to_string(),
            phrase: "bright cyan".to_string(),
            phonetic: "bright black".to_string(),
            label: "yellow".to_string(),
            example: "bright black".to_string(),
            etym: "bright black".to_string(),
            delimiter: "bright black".to_string(),
            error: "bright red".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct DisplaySettings {
    pub wrap: WrapStyle,
    pub width: usize,
    /// Use the terminal width instead of `width`.
    pub auto_width: bool,
    pub indent: usize,
    pub show_examples: bool,
    pub filter_subsenses: bool,
    pub preview: bool,
    pub colors: ColorSettings,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            wrap: WrapStyle::Justify,
            width: DEFAULT_TEXT_WIDTH,
            auto_width: true,
            indent: 0,
            show_examples: true,
            filter_subsenses: false,
            preview: false,
            colors: ColorSettings::default(),
        }
    }
}

impl DisplaySettings {
    pub fn indent(&self) -> usize {
        self.indent.min(MAX_INDENT)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SourceSettings {
    pub dict: DictionaryName,
    /// Queried when `dict` has no entry.
    pub dict2: Option<DictionaryName>,
    pub thesaurus: bool,
    pub audio: AudioSourceName,
    /// Used when the active dictionary has no pronunciation.
    pub audio_fallback: AudioSourceName,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            dict: DictionaryName::Freedict,
            dict2: None,
            thesaurus: false,
            audio: AudioSourceName::Auto,
            audio_fallback: AudioSourceName::Commons,
        }
    }
}

/// Per-field separators used when several candidates are joined.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Connectors {
    pub def: String,
    pub exsen: String,
    pub etym: String,
    pub syn: String,
    pub pos: String,
}

impl Default for Connectors {
    fn default() -> Self {
        Self {
            def: "<br>".to_string(),
            exsen: "<br>".to_string(),
            etym: "<br>".to_string(),
            syn: " | ".to_string(),
            pos: " ".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CardSettings {
    /// When off, queries only display entries.
    pub create_cards: bool,
    pub sentence_fallback: SentenceFallback,
    pub format_definitions: bool,
    pub field_order: Vec<FieldName>,
    pub save_to_file: bool,
    pub card_file: String,
    pub audio_dir: String,
    /// Encoder command; `{output}` is replaced by the target file.
    pub recorder: String,
    pub connectors: Connectors,
}

impl Default for CardSettings {
    fn default() -> Self {
        Self {
            create_cards: true,
            sentence_fallback: SentenceFallback::Off,
            format_definitions: false,
            field_order: FieldName::ALL.to_vec(),
            save_to_file: true,
            card_file: DEFAULT_CARD_FILE.to_string(),
            audio_dir: default_audio_dir(),
            recorder: default_recorder_command(),
            connectors: Connectors::default(),
        }
    }
}

fn default_audio_dir() -> String {
    dirs::data_dir()
        .map(|dir| dir.join("cardsmith").join("audio").display().to_string())
        .unwrap_or_else(|| "cardsmith_audio".to_string())
}

fn default_recorder_command() -> String {
    if cfg!(target_os = "windows") {
        "ffmpeg -hide_banner -loglevel error -f dshow -i audio=default -y {output}".to_string()
    } else if cfg!(target_os = "macos") {
        "ffmpeg -hide_banner -loglevel error -f avfoundation -i :0 -y {output}".to_string()
    } else {
        "ffmpeg -hide_banner -loglevel error -f pulse -i default -y {output}".to_string()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AnkiSettings {
    pub enabled: bool,
    pub url: String,
    pub deck: String,
    pub note: String,
    pub tags: Vec<String>,
    pub duplicates: bool,
    pub duplicate_scope: String,
}

impl Default for AnkiSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: ANKICONNECT_URL.to_string(),
            deck: "Default".to_string(),
            note: String::new(),
            tags: vec!["cardsmith".to_string()],
            duplicates: false,
            duplicate_scope: "deck".to_string(),
        }
    }
}

/// Choices applied without prompting during a bulk run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BulkSettings {
    /// Prompt for every field even during bulk runs.
    pub freeform: bool,
    pub def: i32,
    pub exsen: i32,
    pub pos: i32,
    pub etym: i32,
    pub syn: i32,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            freeform: false,
            def: 1,
            exsen: 1,
            pos: 1,
            etym: 1,
            syn: 1,
        }
    }
}

impl BulkSettings {
    pub fn choice_for(&self, field: FieldName) -> i32 {
        match field {
            FieldName::Def => self.def,
            FieldName::Exsen => self.exsen,
            FieldName::Pos => self.pos,
            FieldName::Etym => self.etym,
            FieldName::Syn => self.syn,
            _ => 0,
        }
    }

    pub fn choice_mut(&mut self, field: FieldName) -> Option<&mut i32> {
        match field {
            FieldName::Def => Some(&mut self.def),
            FieldName::Exsen => Some(&mut self.exsen),
            FieldName::Pos => Some(&mut self.pos),
            FieldName::Etym => Some(&mut self.etym),
            FieldName::Syn => Some(&mut self.syn),
            _ => None,
        }
    }
}

/// Represents the deserialized structure of `config.toml`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    pub fields: FieldToggles,
    pub hide: HideSettings,
    pub display: DisplaySettings,
    pub sources: SourceSettings,
    pub card: CardSettings,
    pub anki: AnkiSettings,
    pub bulk: BulkSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_block_entry() -> CanonicalEntry {
        let mut builder = EntryBuilder::new("Test");
        builder
            .begin_phrase("mint", "/mɪnt/", "[Old English minte]")
            .begin_gram_block("noun", "mint-n.mp3")
            .push_definition("an aromatic plant", "‘mint tea’", false)
            .push_definition("the flavour of mint", "", true)
            .begin_gram_block("verb", "")
            .push_definition("make coins", "", false)
            .begin_phrase("Mint", "", "")
            .begin_gram_block("adjective", "")
            .push_definition("in pristine condition", "", false);
        builder.finish().unwrap()
    }

    #[test]
    fn test_builder_keeps_parallel_lists_aligned() {
        let entry = two_block_entry();
        assert_eq!(entry.definitions.len(), entry.example_sentences.len());
        assert_eq!(entry.definitions.len(), entry.subsenses.len());
        assert_eq!(entry.phrases.len(), entry.etymologies.len());
        assert_eq!(entry.grammatical_labels.len(), entry.audio_urls.len());
    }

    #[test]
    fn test_mappings_have_sentinel_and_are_monotonic() {
        let entry = two_block_entry();
        let n = entry.definitions.len();
        for mapping in [&entry.def_index_to_phrase_block, &entry.def_index_to_gram_block] {
            assert_eq!(mapping.len(), n + 1);
            assert!(mapping.windows(2).all(|pair| pair[0] <= pair[1]));
        }
        assert_eq!(entry.def_index_to_phrase_block, vec![0, 0, 0, 1, 2]);
        assert_eq!(entry.def_index_to_gram_block, vec![0, 0, 1, 2, 3]);
        assert_eq!(entry.phrase_sentinel(), entry.phrases.len());
        assert_eq!(entry.gram_sentinel(), entry.grammatical_labels.len());
    }

    #[test]
    fn test_sentinel_invariant_holds_for_any_definition_count() {
        for count in 1..12 {
            let mut builder = EntryBuilder::new("Test");
            builder.begin_phrase("word", "", "");
            for i in 0..count {
                if i % 3 == 0 {
                    builder.begin_gram_block(format!("label {}", i), "");
                }
                builder.push_definition(format!("definition {}", i), "", i % 2 == 1);
            }
            let entry = builder.finish().unwrap();
            assert_eq!(entry.def_index_to_phrase_block.len(), count + 1);
            assert_eq!(entry.def_index_to_gram_block.len(), count + 1);
        }
    }

    #[test]
    fn test_empty_builder_finishes_as_not_found() {
        let mut builder = EntryBuilder::new("Test");
        builder.begin_phrase("word", "", "");
        assert!(builder.finish().is_none());
    }

    #[test]
    fn test_audio_url_falls_back_to_first_available() {
        let entry = two_block_entry();
        assert_eq!(entry.audio_url_for(0), Some("mint-n.mp3"));
        assert_eq!(entry.audio_url_for(2), Some("mint-n.mp3"));
        assert_eq!(entry.audio_url_for(99), Some("mint-n.mp3"));
    }

    #[test]
    fn test_card_fields_order_and_missing_values() {
        let mut fields = CardFields::default();
        fields.set(FieldName::Phrase, "mint");
        fields.set(FieldName::Def, "a plant");
        let order = [FieldName::Phrase, FieldName::Audio, FieldName::Def];
        let values: Vec<&str> = fields.ordered(&order).collect();
        assert_eq!(values, vec!["mint", "", "a plant"]);
    }

    #[test]
    fn test_settings_round_trip_through_toml_with_defaults() {
        let partial = r#"
            [sources]
            dict = "idioms"
            audio = "-"

            [display]
            wrap = "cut"
        "#;
        let settings: Settings = toml::from_str(partial).unwrap();
        assert_eq!(settings.sources.dict, DictionaryName::Idioms);
        assert_eq!(settings.sources.audio, AudioSourceName::Off);
        assert_eq!(settings.display.wrap, WrapStyle::Cut);
        assert_eq!(settings.card.field_order, FieldName::ALL.to_vec());
        assert_eq!(settings.hide.mask, DEFAULT_MASK);
    }
}
