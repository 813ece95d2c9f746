// src/dictionaries/datamuse.rs

use super::http::{HttpClient, encode};
use super::{Fetched, ScrapeAdapter, SourceError};
use crate::constants::SYNONYMS_PER_CANDIDATE;
use crate::core::query::QueryFlags;
use crate::models::EntryBuilder;
use serde::Deserialize;

const API_URL: &str = "https://api.datamuse.com/words";

#[derive(Deserialize, Debug)]
pub(crate) struct Word {
    word: String,
    #[serde(default)]
    tags: Vec<String>,
}

impl Word {
    fn label(&self) -> &'static str {
        self.tags
            .iter()
            .find_map(|tag| match tag.as_str() {
                "n" => Some("noun"),
                "v" => Some("verb"),
                "adj" => Some("adjective"),
                "adv" => Some("adverb"),
                _ => None,
            })
            .unwrap_or("synonyms")
    }
}

/// Synonyms grouped by part of speech; each candidate holds a handful of
/// synonyms so a single choice picks a whole group.
pub(crate) fn build_fetched(phrase: &str, words: &[Word]) -> Fetched {
    let mut groups: Vec<(&'static str, Vec<&str>)> = Vec::new();
    for word in words {
        let label = word.label();
        match groups.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, members)) => members.push(word.word.as_str()),
            None => groups.push((label, vec![word.word.as_str()])),
        }
    }

    let mut builder = EntryBuilder::new("Thesaurus");
    builder.begin_phrase(phrase, "", "");
    for (label, members) in groups {
        builder.begin_gram_block(label, "");
        for chunk in members.chunks(SYNONYMS_PER_CANDIDATE) {
            builder.push_definition(chunk.join(", "), "", false);
        }
    }
    builder.finish().map_or(Fetched::NotFound, Fetched::Entry)
}

/// Synonym lookups through the Datamuse API.
#[derive(Debug, Clone)]
pub struct Thesaurus {
    client: HttpClient,
}

impl Thesaurus {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl ScrapeAdapter for Thesaurus {
    fn title(&self) -> &str {
        "Thesaurus"
    }

    fn allows_thesaurus(&self) -> bool {
        false
    }

    fn supplies_audio(&self) -> bool {
        false
    }

    fn fetch(&self, query: &str, _flags: &QueryFlags) -> Result<Fetched, SourceError> {
        let url = format!("{}?rel_syn={}&md=p&max=64", API_URL, encode(query.trim()));
        let words: Vec<Word> = self.client.get_json(&url)?.unwrap_or_default();
        Ok(build_fetched(query.trim(), &words))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonyms_are_grouped_and_chunked() {
        let mut json = String::from("[");
        for i in 0..10 {
            json.push_str(&format!(r#"{{"word": "n{}", "score": 100, "tags": ["syn", "n"]}},"#, i));
        }
        json.push_str(r#"{"word": "quickly", "tags": ["adv"]}, {"word": "odd"}]"#);
        let words: Vec<Word> = serde_json::from_str(&json).unwrap();

        let Fetched::Entry(entry) = build_fetched("fast", &words) else {
            panic!("expected an entry");
        };

        assert_eq!(entry.grammatical_labels, vec!["noun", "adverb", "synonyms"]);
        assert_eq!(entry.definitions.len(), 4);
        assert_eq!(entry.definitions[0], "n0, n1, n2, n3, n4, n5, n6, n7");
        assert_eq!(entry.definitions[1], "n8, n9");
        assert_eq!(entry.definitions[2], "quickly");
        assert_eq!(entry.def_index_to_gram_block, vec![0, 0, 1, 2, 3]);
    }

    #[test]
    fn test_no_synonyms_is_not_found() {
        assert_eq!(build_fetched("xyzzy", &[]), Fetched::NotFound);
    }
}
