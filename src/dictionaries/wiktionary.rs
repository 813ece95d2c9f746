// src/dictionaries/wiktionary.rs

use super::http::{HttpClient, encode};
use super::{Fetched, ScrapeAdapter, SourceError, strip_markup};
use crate::core::query::QueryFlags;
use crate::models::EntryBuilder;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;

const API_URL: &str = "https://en.wiktionary.org/api/rest_v1/page/definition/";

lazy_static! {
    // The lemma a "form of" definition points to, taken from its link title.
    static ref FORM_OF_RE: Regex =
        Regex::new(r#"form-of-definition-link[^>]*>(?:<[^>]*>)*?<a[^>]*title="([^"]+)""#).unwrap();
}

#[derive(Deserialize, Debug)]
pub(crate) struct Usage {
    #[serde(rename = "partOfSpeech", default)]
    part_of_speech: String,
    #[serde(default)]
    definitions: Vec<Definition>,
}

#[derive(Deserialize, Debug)]
struct Definition {
    #[serde(default)]
    definition: String,
    #[serde(rename = "parsedExamples", default)]
    parsed_examples: Vec<ParsedExample>,
    #[serde(default)]
    examples: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct ParsedExample {
    #[serde(default)]
    example: String,
}

impl Definition {
    fn example(&self) -> String {
        self.parsed_examples
            .iter()
            .map(|parsed| parsed.example.as_str())
            .chain(self.examples.iter().map(String::as_str))
            .map(strip_markup)
            .find(|example| !example.is_empty())
            .map(|example| format!("‘{}’", example))
            .unwrap_or_default()
    }

    fn form_of_target(&self) -> Option<String> {
        FORM_OF_RE
            .captures(&self.definition)
            .and_then(|captures| captures.get(1))
            .map(|target| target.as_str().to_string())
    }
}

/// Maps the English usages of a definition page.
///
/// A page whose every definition is a "form of" another lemma becomes a
/// redirect to the first lemma.
pub(crate) fn build_fetched(phrase: &str, usages: &[Usage]) -> Fetched {
    let definitions: Vec<&Definition> = usages
        .iter()
        .flat_map(|usage| usage.definitions.iter())
        .filter(|definition| !strip_markup(&definition.definition).is_empty())
        .collect();
    if definitions.is_empty() {
        return Fetched::NotFound;
    }

    let targets: Vec<Option<String>> = definitions.iter().map(|d| d.form_of_target()).collect();
    if targets.iter().all(Option::is_some) {
        if let Some(Some(target)) = targets.into_iter().next() {
            return Fetched::Redirect(target);
        }
    }

    let mut builder = EntryBuilder::new("Wiktionary Idioms");
    builder.begin_phrase(phrase, "", "");
    for usage in usages {
        let mut opened = false;
        for definition in &usage.definitions {
            let text = strip_markup(&definition.definition);
            if text.is_empty() {
                continue;
            }
            if !opened {
                builder.begin_gram_block(usage.part_of_speech.to_lowercase(), "");
                opened = true;
            }
            builder.push_definition(text, definition.example(), false);
        }
    }
    builder.finish().map_or(Fetched::NotFound, Fetched::Entry)
}

/// Idioms and phrases from the Wiktionary REST definition endpoint.
#[derive(Debug, Clone)]
pub struct Idioms {
    client: HttpClient,
}

impl Idioms {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl ScrapeAdapter for Idioms {
    fn title(&self) -> &str {
        "Wiktionary Idioms"
    }

    fn allows_thesaurus(&self) -> bool {
        false
    }

    fn supplies_audio(&self) -> bool {
        false
    }

    fn fetch(&self, query: &str, _flags: &QueryFlags) -> Result<Fetched, SourceError> {
        let title = query.trim().replace(' ', "_");
        let url = format!("{}{}", API_URL, encode(&title));
        let Some(mut languages) = self.client.get_json::<HashMap<String, Vec<Usage>>>(&url)? else {
            return Ok(Fetched::NotFound);
        };
        let usages = languages.remove("en").unwrap_or_default();
        Ok(build_fetched(query.trim(), &usages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usages(json: &str) -> Vec<Usage> {
        let mut languages: HashMap<String, Vec<Usage>> = serde_json::from_str(json).unwrap();
        languages.remove("en").unwrap_or_default()
    }

    #[test]
    fn test_definitions_are_stripped_and_grouped() {
        let json = r#"{
            "en": [
                {"partOfSpeech": "Phrase", "language": "English", "definitions": [
                    {"definition": "<i>(idiomatic)</i> Good luck; used to wish a <a href=\"/wiki/performer\">performer</a> well.",
                     "parsedExamples": [{"example": "<b>Break a leg</b> tonight!"}]},
                    {"definition": ""}
                ]},
                {"partOfSpeech": "Verb", "definitions": [
                    {"definition": "To literally fracture a leg.", "examples": ["He broke a leg skiing."]}
                ]}
            ],
            "de": [
                {"partOfSpeech": "Noun", "definitions": [{"definition": "ignored"}]}
            ]
        }"#;

        let Fetched::Entry(entry) = build_fetched("break a leg", &usages(json)) else {
            panic!("expected an entry");
        };

        assert_eq!(entry.phrases, vec!["break a leg"]);
        assert_eq!(entry.grammatical_labels, vec!["phrase", "verb"]);
        assert_eq!(
            entry.definitions,
            vec![
                "(idiomatic) Good luck; used to wish a performer well.",
                "To literally fracture a leg."
            ]
        );
        assert_eq!(
            entry.example_sentences,
            vec!["‘Break a leg tonight!’", "‘He broke a leg skiing.’"]
        );
        assert_eq!(entry.audio_urls, vec!["", ""]);
        assert_eq!(entry.def_index_to_gram_block, vec![0, 1, 2]);
    }

    #[test]
    fn test_form_of_pages_redirect_to_the_lemma() {
        let json = r#"{"en": [{"partOfSpeech": "Verb", "definitions": [
            {"definition": "<span class=\"form-of-definition use-with-mention\">simple past of <span class=\"form-of-definition-link\"><i class=\"Latn mention\" lang=\"en\"><a rel=\"mw:WikiLink\" href=\"/wiki/go#English\" title=\"go\">go</a></i></span></span>"}
        ]}]}"#;
        assert_eq!(
            build_fetched("went", &usages(json)),
            Fetched::Redirect("go".to_string())
        );
    }

    #[test]
    fn test_pages_without_english_definitions_are_not_found() {
        let json = r#"{"fr": [{"partOfSpeech": "Noun", "definitions": [{"definition": "chat"}]}]}"#;
        assert_eq!(build_fetched("chat", &usages(json)), Fetched::NotFound);
    }
}
