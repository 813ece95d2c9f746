// src/dictionaries/freedict.rs

use super::http::{HttpClient, encode};
use super::{AudioSource, Fetched, ScrapeAdapter, SourceError};
use crate::core::query::QueryFlags;
use crate::models::{AudioSourceName, CanonicalEntry, EntryBuilder};
use serde::Deserialize;

const API_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en/";

#[derive(Deserialize, Debug)]
pub(crate) struct ApiEntry {
    word: String,
    #[serde(default)]
    phonetic: Option<String>,
    #[serde(default)]
    phonetics: Vec<ApiPhonetic>,
    #[serde(default)]
    origin: Option<String>,
    #[serde(default)]
    meanings: Vec<ApiMeaning>,
}

#[derive(Deserialize, Debug)]
struct ApiPhonetic {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    audio: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiMeaning {
    #[serde(rename = "partOfSpeech", default)]
    part_of_speech: String,
    #[serde(default)]
    definitions: Vec<ApiDefinition>,
}

#[derive(Deserialize, Debug)]
struct ApiDefinition {
    definition: String,
    #[serde(default)]
    example: Option<String>,
}

impl ApiEntry {
    fn phonetic(&self) -> String {
        self.phonetic
            .iter()
            .chain(self.phonetics.iter().filter_map(|p| p.text.as_ref()))
            .find(|text| !text.trim().is_empty())
            .cloned()
            .unwrap_or_default()
    }

    /// American recordings first, then whatever is there.
    fn audio_url(&self) -> String {
        let urls: Vec<&str> = self
            .phonetics
            .iter()
            .filter_map(|p| p.audio.as_deref())
            .filter(|url| !url.is_empty())
            .collect();
        urls.iter()
            .find(|url| url.contains("-us."))
            .or_else(|| urls.first())
            .map(|url| url.to_string())
            .unwrap_or_default()
    }

    fn has_label(&self, label: &str) -> bool {
        self.meanings
            .iter()
            .any(|meaning| meaning.part_of_speech.eq_ignore_ascii_case(label))
    }
}

/// Groups the API entries by spelling: one headword block per distinct
/// spelling, one grammatical block per meaning.
pub(crate) fn build_entry(entries: &[ApiEntry]) -> Option<CanonicalEntry> {
    let mut groups: Vec<(&str, Vec<&ApiEntry>)> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|(word, _)| *word == entry.word) {
            Some((_, members)) => members.push(entry),
            None => groups.push((entry.word.as_str(), vec![entry])),
        }
    }

    let mut builder = EntryBuilder::new("Free Dictionary");
    for (word, members) in groups {
        let phonetic = members
            .iter()
            .map(|entry| entry.phonetic())
            .find(|phonetic| !phonetic.is_empty())
            .unwrap_or_default();
        let origins: Vec<&str> = members
            .iter()
            .filter_map(|entry| entry.origin.as_deref())
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .collect();
        let etymology = if origins.is_empty() {
            String::new()
        } else {
            format!("[{}]", origins.join(" "))
        };
        builder.begin_phrase(word, phonetic, etymology);

        for entry in members {
            let audio = entry.audio_url();
            for meaning in &entry.meanings {
                if meaning.definitions.is_empty() {
                    continue;
                }
                builder.begin_gram_block(meaning.part_of_speech.trim(), audio.as_str());
                for definition in &meaning.definitions {
                    let example = definition
                        .example
                        .as_deref()
                        .map(str::trim)
                        .filter(|example| !example.is_empty())
                        .map(|example| format!("‘{}’", example))
                        .unwrap_or_default();
                    builder.push_definition(definition.definition.as_str(), example, false);
                }
            }
        }
    }
    builder.finish()
}

/// The Free Dictionary API (dictionaryapi.dev).
#[derive(Debug, Clone)]
pub struct Freedict {
    client: HttpClient,
}

impl Freedict {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    fn request(&self, query: &str) -> Result<Option<Vec<ApiEntry>>, SourceError> {
        self.client
            .get_json(&format!("{}{}", API_URL, encode(query.trim())))
    }
}

impl ScrapeAdapter for Freedict {
    fn title(&self) -> &str {
        "Free Dictionary"
    }

    fn allows_thesaurus(&self) -> bool {
        true
    }

    fn supplies_audio(&self) -> bool {
        true
    }

    fn fetch(&self, query: &str, _flags: &QueryFlags) -> Result<Fetched, SourceError> {
        let Some(entries) = self.request(query)? else {
            return Ok(Fetched::NotFound);
        };
        Ok(build_entry(&entries).map_or(Fetched::NotFound, Fetched::Entry))
    }
}

impl AudioSource for Freedict {
    fn name(&self) -> AudioSourceName {
        AudioSourceName::Freedict
    }

    fn resolve_audio(&self, phrase: &str, pos_hint: Option<&str>) -> Result<Option<String>, SourceError> {
        let entries = self.request(phrase)?.unwrap_or_default();
        Ok(pick_audio(&entries, pos_hint))
    }
}

/// Prefers a recording from an entry that has the hinted part of speech.
fn pick_audio(entries: &[ApiEntry], pos_hint: Option<&str>) -> Option<String> {
    let with_audio = || {
        entries
            .iter()
            .map(|entry| (entry, entry.audio_url()))
            .filter(|(_, url)| !url.is_empty())
    };
    pos_hint
        .and_then(|hint| with_audio().find(|(entry, _)| entry.has_label(hint)))
        .or_else(|| with_audio().next())
        .map(|(_, url)| url)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &str = r#"[
        {
            "word": "mint",
            "phonetic": "/mɪnt/",
            "phonetics": [
                {"text": "/mɪnt/", "audio": ""},
                {"text": "/mɪnt/", "audio": "https://audio.example/mint-uk.mp3"},
                {"audio": "https://audio.example/mint-us.mp3"}
            ],
            "origin": "Old English minte.",
            "meanings": [
                {"partOfSpeech": "noun", "definitions": [
                    {"definition": "An aromatic plant.", "example": "mint tea"},
                    {"definition": "A peppermint sweet."}
                ]},
                {"partOfSpeech": "verb", "definitions": []}
            ]
        },
        {
            "word": "mint",
            "phonetics": [],
            "origin": "Latin moneta.",
            "meanings": [
                {"partOfSpeech": "verb", "definitions": [
                    {"definition": "Make coins."}
                ]}
            ]
        },
        {
            "word": "Mint",
            "meanings": [
                {"partOfSpeech": "adjective", "definitions": [
                    {"definition": "Pristine.", "example": "  "}
                ]}
            ]
        }
    ]"#;

    fn entries() -> Vec<ApiEntry> {
        serde_json::from_str(RESPONSE).unwrap()
    }

    #[test]
    fn test_entries_are_grouped_by_spelling() {
        let entry = build_entry(&entries()).unwrap();

        assert_eq!(entry.phrases, vec!["mint", "Mint"]);
        assert_eq!(entry.phonetics, vec!["/mɪnt/", ""]);
        assert_eq!(
            entry.etymologies,
            vec!["[Old English minte. Latin moneta.]", ""]
        );
        assert_eq!(entry.grammatical_labels, vec!["noun", "verb", "adjective"]);
        assert_eq!(
            entry.definitions,
            vec!["An aromatic plant.", "A peppermint sweet.", "Make coins.", "Pristine."]
        );
        assert_eq!(entry.example_sentences, vec!["‘mint tea’", "", "", ""]);
        assert_eq!(entry.def_index_to_phrase_block, vec![0, 0, 0, 1, 2]);
        assert_eq!(entry.def_index_to_gram_block, vec![0, 0, 1, 2, 3]);
    }

    #[test]
    fn test_american_audio_is_preferred() {
        let entry = build_entry(&entries()).unwrap();
        assert_eq!(entry.audio_urls[0], "https://audio.example/mint-us.mp3");
        assert_eq!(entry.audio_urls[1], "");
        assert_eq!(entry.audio_url_for(1), Some("https://audio.example/mint-us.mp3"));
    }

    #[test]
    fn test_audio_hint_falls_back_to_any_recording() {
        let entries = entries();
        assert_eq!(
            pick_audio(&entries, Some("adjective")).as_deref(),
            Some("https://audio.example/mint-us.mp3")
        );
        assert_eq!(pick_audio(&[], Some("noun")), None);
    }

    #[test]
    fn test_empty_response_is_not_an_entry() {
        assert!(build_entry(&[]).is_none());
    }
}
