// src/core/hide.rs

use crate::constants::HIDE_PLACEHOLDER;
use crate::models::HideSettings;

/// Words too common to be worth hiding.
const STOP_WORDS: &[&str] = &[
    "the", "and", "a", "is", "an", "it", "or", "be", "do", "does", "not", "if", "he",
];

/// Only hidden when `HideSettings::prepositions` is on.
pub const PREPOSITIONS: &[&str] = &[
    "about", "above", "across", "after", "against", "along", "among", "around", "as", "at",
    "before", "behind", "below", "beneath", "beside", "between", "beyond", "by", "despite",
    "down", "during", "except", "for", "from", "in", "inside", "into", "like", "near", "of",
    "off", "on", "onto", "opposite", "out", "outside", "over", "past", "round", "since", "than",
    "through", "to", "towards", "under", "underneath", "unlike", "until", "up", "upon", "via",
    "with", "within", "without",
];

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Replaces the lowercase, capitalized and uppercase spellings of `word`.
fn case_replace(content: &str, word: &str, replacement: &str) -> String {
    content
        .replace(word, replacement)
        .replace(&capitalize(word), replacement)
        .replace(&word.to_uppercase(), replacement)
}

/// The inflected forms masked as whole words: silent-e verbs take "-ing"
/// (and "-ie" verbs "-ying"), words ending in "y" take "-ies" and "-ied".
fn inflections(word: &str) -> Vec<String> {
    let mut forms = Vec::new();
    if let Some(stem) = word.strip_suffix('e') {
        forms.push(format!("{}ing", stem));
        if let Some(stem) = word.strip_suffix("ie") {
            forms.push(format!("{}ying", stem));
        }
    } else if let Some(stem) = word.strip_suffix('y') {
        forms.push(format!("{}ies", stem));
        forms.push(format!("{}ied", stem));
    }
    forms
}

fn is_hideable(word: &str, settings: &HideSettings) -> bool {
    if STOP_WORDS.contains(&word) {
        return false;
    }
    settings.prepositions || !PREPOSITIONS.contains(&word)
}

/// Masks every occurrence of the words of `phrase` in `content`.
///
/// Each match is first replaced by `mask` followed by a placeholder
/// character, which keeps later replacements from matching inside a mask.
/// The placeholder is then removed (keep endings) or used to drop the rest
/// of the word it is attached to.
pub fn hide(content: &str, phrase: &str, settings: &HideSettings) -> String {
    let marker = format!("{}{}", settings.mask, HIDE_PLACEHOLDER);
    let mut result = content.to_string();

    let phrase = phrase.to_lowercase();
    for word in phrase.split_whitespace() {
        if !is_hideable(word, settings) {
            continue;
        }
        result = case_replace(&result, word, &marker);
        for form in inflections(word) {
            result = case_replace(&result, &form, &marker);
        }
    }

    if settings.keep_endings {
        result.replace(HIDE_PLACEHOLDER, "")
    } else {
        drop_word_endings(&result)
    }
}

/// "We weren't ...\u{E000}ed for this." -> "We weren't ... for this."
///
/// Everything attached to a mask up to the next space, period or colon goes.
fn drop_word_endings(content: &str) -> String {
    let mut pieces = content.split(HIDE_PLACEHOLDER);
    let mut result = pieces.next().unwrap_or_default().to_string();
    for piece in pieces {
        result.push_str(piece.trim_start_matches(|c| !matches!(c, ' ' | '.' | ':')));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(keep_endings: bool) -> HideSettings {
        HideSettings {
            mask: "...".to_string(),
            keep_endings,
            prepositions: false,
            ..HideSettings::default()
        }
    }

    #[test]
    fn test_hides_the_headword_only() {
        let result = hide("The cat is running.", "cat", &settings(false));
        assert_eq!(result, "The ... is running.");
    }

    #[test]
    fn test_hides_every_case_variant() {
        let result = hide("Cat, cat and CAT.", "cat", &settings(true));
        assert_eq!(result, "..., ... and ....");
    }

    #[test]
    fn test_result_does_not_depend_on_phrase_casing() {
        let content = "Making tea, she makes a MAKE-shift stove.";
        let expected = hide(content, "make", &settings(false));
        assert_eq!(hide(content, "MAKE", &settings(false)), expected);
        assert_eq!(hide(content, "Make", &settings(false)), expected);
    }

    #[test]
    fn test_keep_endings_leaves_suffixes_visible() {
        let result = hide("She makes cats purr.", "make cat", &settings(true));
        assert_eq!(result, "She ...s ...s purr.");
    }

    #[test]
    fn test_hide_whole_word_drops_suffixes() {
        let result = hide("She makes cats purr: cats.", "make cat", &settings(false));
        assert_eq!(result, "She ... ... purr: ....");
    }

    #[test]
    fn test_hide_whole_word_drops_apostrophes_and_hyphenated_tails() {
        let s = settings(false);
        assert_eq!(hide("The cat's toy.", "cat", &s), "The ... toy.");
        assert_eq!(hide("A MAKE-shift stove.", "make", &s), "A ... stove.");
    }

    #[test]
    fn test_inflected_forms_are_masked_whole() {
        let s = settings(true);
        assert_eq!(hide("Stop making noise.", "make", &s), "Stop ... noise.");
        assert_eq!(hide("He was lying there.", "lie", &s), "He was ... there.");
        assert_eq!(hide("Prices varied, and varies.", "vary", &s), "Prices ..., and ....");
    }

    #[test]
    fn test_stop_words_and_prepositions_are_skipped() {
        let s = settings(true);
        assert_eq!(hide("give up on it", "give up", &s), "... up on it");

        let with_preps = HideSettings { prepositions: true, ..s };
        assert_eq!(hide("give up on it", "give up", &with_preps), "... ... on it");
        assert_eq!(hide("the end", "the end", &with_preps), "the ...");
    }

    #[test]
    fn test_hiding_is_idempotent() {
        let contents = [
            "The cat is running.",
            "Making tea, she makes a MAKE-shift stove.",
            "Prices varied: the variety varies.",
            "He gave up and gave in.",
        ];
        let phrases = ["cat", "make", "vary", "give up", "tea stove"];
        for keep_endings in [true, false] {
            let s = settings(keep_endings);
            for content in contents {
                for phrase in phrases {
                    let once = hide(content, phrase, &s);
                    assert_eq!(hide(&once, phrase, &s), once, "{:?} / {:?}", content, phrase);
                }
            }
        }
    }
}
