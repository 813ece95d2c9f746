// src/core/flags.rs

//! Grammatical filters (`-n`, `-v`, `-adj`, ...) and the entry filtering they drive.

use crate::models::{CanonicalEntry, EntryBuilder};
use std::collections::BTreeSet;

/// Query flag → the label word it selects.
const LABEL_FLAGS: &[(&str, &str)] = &[
    ("n", "noun"),
    ("noun", "noun"),
    ("v", "verb"),
    ("verb", "verb"),
    ("a", "adjective"),
    ("adj", "adjective"),
    ("adjective", "adjective"),
    ("adv", "adverb"),
    ("adverb", "adverb"),
    ("prep", "preposition"),
    ("preposition", "preposition"),
    ("pron", "pronoun"),
    ("pronoun", "pronoun"),
    ("conj", "conjunction"),
    ("conjunction", "conjunction"),
    ("int", "interjection"),
    ("interjection", "interjection"),
    ("abbr", "abbreviation"),
    ("abbreviation", "abbreviation"),
    ("phr", "phrase"),
    ("phrase", "phrase"),
    ("idiom", "idiom"),
    ("idioms", "idiom"),
    ("trans", "transitive"),
    ("transitive", "transitive"),
    ("intrans", "intransitive"),
    ("intransitive", "intransitive"),
];

/// Maps a query flag to its label word.
pub fn label_for_flag(flag: &str) -> Option<&'static str> {
    LABEL_FLAGS
        .iter()
        .find(|(name, _)| *name == flag)
        .map(|(_, label)| *label)
}

/// The set of label words a query asked for. Empty means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GramFilter {
    labels: BTreeSet<&'static str>,
}

impl GramFilter {
    pub fn from_flags<'a>(flags: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            labels: flags.into_iter().filter_map(label_for_flag).collect(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.labels.is_empty()
    }

    /// A block is kept when any word of its label is one of the requested labels.
    pub fn matches(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        label
            .split(|c: char| !c.is_alphabetic())
            .any(|word| self.labels.contains(word))
    }

    /// First requested label, used as the pronunciation hint for audio.
    pub fn primary(&self) -> Option<&'static str> {
        self.labels.iter().next().copied()
    }

    /// Drops the grammatical blocks the filter does not match.
    ///
    /// When nothing would survive, the entry is returned unfiltered.
    /// Block ordinals are renumbered, so the mappings stay dense.
    pub fn filter_entry(&self, entry: CanonicalEntry) -> CanonicalEntry {
        if !self.is_active() {
            return entry;
        }

        let keep_block: Vec<bool> = entry
            .grammatical_labels
            .iter()
            .map(|label| self.matches(label))
            .collect();
        if !keep_block.iter().any(|&keep| keep) {
            log::debug!("Grammatical filter matched nothing; showing every block.");
            return entry;
        }

        let mut builder = EntryBuilder::new(entry.source.clone());
        let mut open_phrase = None;
        let mut open_gram = None;

        for (i, definition) in entry.definitions.iter().enumerate() {
            let (Some(&phrase_block), Some(&gram_block)) = (
                entry.def_index_to_phrase_block.get(i),
                entry.def_index_to_gram_block.get(i),
            ) else {
                continue;
            };
            if !keep_block.get(gram_block).copied().unwrap_or(false) {
                continue;
            }

            if open_phrase != Some(phrase_block) {
                builder.begin_phrase(
                    entry.phrases.get(phrase_block).cloned().unwrap_or_default(),
                    entry.phonetics.get(phrase_block).cloned().unwrap_or_default(),
                    entry.etymologies.get(phrase_block).cloned().unwrap_or_default(),
                );
                open_phrase = Some(phrase_block);
                open_gram = None;
            }
            if open_gram != Some(gram_block) {
                builder.begin_gram_block(
                    entry.grammatical_labels.get(gram_block).cloned().unwrap_or_default(),
                    entry.audio_urls.get(gram_block).cloned().unwrap_or_default(),
                );
                open_gram = Some(gram_block);
            }
            builder.push_definition(
                definition.as_str(),
                entry.example_sentences.get(i).cloned().unwrap_or_default(),
                entry.subsenses.get(i).copied().unwrap_or(false),
            );
        }

        builder.finish().unwrap_or(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mint() -> CanonicalEntry {
        let mut builder = EntryBuilder::new("Test");
        builder
            .begin_phrase("mint", "", "[minte]")
            .begin_gram_block("noun", "n.mp3")
            .push_definition("a plant", "", false)
            .push_definition("a flavour", "", true)
            .begin_gram_block("transitive verb", "v.mp3")
            .push_definition("make coins", "", false)
            .begin_phrase("mint", "", "[mynet]")
            .begin_gram_block("adjective", "")
            .push_definition("pristine", "", false);
        builder.finish().unwrap()
    }

    #[test]
    fn test_flags_map_to_labels() {
        let filter = GramFilter::from_flags(["n", "adj", "fd", "rec"]);
        assert!(filter.is_active());
        assert!(filter.matches("Noun"));
        assert!(filter.matches("adjective"));
        assert!(!filter.matches("verb"));
        assert!(!GramFilter::from_flags(["fd"]).is_active());
    }

    #[test]
    fn test_filter_keeps_matching_blocks_and_renumbers() {
        // --- Execute ---
        let filtered = GramFilter::from_flags(["v"]).filter_entry(mint());

        // --- Assert ---
        assert_eq!(filtered.definitions, vec!["make coins"]);
        assert_eq!(filtered.grammatical_labels, vec!["transitive verb"]);
        assert_eq!(filtered.audio_urls, vec!["v.mp3"]);
        assert_eq!(filtered.etymologies, vec!["[minte]"]);
        assert_eq!(filtered.def_index_to_phrase_block, vec![0, 1]);
        assert_eq!(filtered.def_index_to_gram_block, vec![0, 1]);
    }

    #[test]
    fn test_filter_spanning_headword_blocks() {
        let filtered = GramFilter::from_flags(["n", "adj"]).filter_entry(mint());
        assert_eq!(filtered.definitions, vec!["a plant", "a flavour", "pristine"]);
        assert_eq!(filtered.subsenses, vec![false, true, false]);
        assert_eq!(filtered.def_index_to_phrase_block, vec![0, 0, 1, 2]);
        assert_eq!(filtered.def_index_to_gram_block, vec![0, 0, 1, 2]);
    }

    #[test]
    fn test_filter_that_matches_nothing_fails_open() {
        let entry = mint();
        assert_eq!(GramFilter::from_flags(["adv"]).filter_entry(entry.clone()), entry);
    }
}
