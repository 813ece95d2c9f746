// src/core/query.rs

use crate::core::flags::GramFilter;
use crate::models::DictionaryName;

/// A parsed search line: `<query> [-flag ...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// What the dictionaries are asked about.
    pub phrase: String,
    /// Set when the phrase was marked inside a sentence: `a <phrase> in context`.
    pub sentence: Option<String>,
    pub flags: QueryFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFlags {
    /// Dictionaries named on the line, in order. Empty means "use the configured one".
    pub dictionaries: Vec<DictionaryName>,
    pub gram: GramFilter,
    pub filter_subsenses: bool,
    pub record: bool,
    /// Every flag as typed, without its leading dashes.
    pub raw: Vec<String>,
}

impl QueryFlags {
    pub fn parse<'a>(flags: impl IntoIterator<Item = &'a str>) -> Self {
        let raw: Vec<String> = flags
            .into_iter()
            .map(|flag| flag.trim().trim_start_matches('-').to_lowercase())
            .filter(|flag| !flag.is_empty())
            .collect();

        let mut dictionaries = Vec::new();
        for flag in &raw {
            if let Some(dict) = dictionary_flag(flag) {
                if !dictionaries.contains(&dict) {
                    dictionaries.push(dict);
                }
            }
        }

        Self {
            dictionaries,
            gram: GramFilter::from_flags(raw.iter().map(String::as_str)),
            filter_subsenses: raw.iter().any(|f| f == "f" || f == "fsubdefs"),
            record: raw.iter().any(|f| f == "rec" || f == "record"),
            raw,
        }
    }
}

/// Only the short and long dictionary flags; `-i` must not be taken for a
/// grammatical flag and `-f` is the sub-sense filter.
fn dictionary_flag(flag: &str) -> Option<DictionaryName> {
    match flag {
        "fd" | "freedict" => Some(DictionaryName::Freedict),
        "i" | "idiom" | "idioms" => Some(DictionaryName::Idioms),
        _ => None,
    }
}

/// Splits a search line into the query and its flags.
///
/// Returns `None` for lines without a usable phrase, including an empty
/// `<>` marker.
pub fn parse_query(line: &str) -> Option<Query> {
    let mut parts = line.split(" -");
    let head = parts.next().unwrap_or_default().trim();
    let flags = QueryFlags::parse(parts);

    let (phrase, sentence) = match (head.find('<'), head.rfind('>')) {
        (Some(open), Some(close)) if open < close => {
            let inner = head.get(open + 1..close).unwrap_or_default().trim();
            (inner.to_string(), Some(head.to_string()))
        }
        _ => (head.to_string(), None),
    };

    if phrase.is_empty() {
        return None;
    }
    Some(Query {
        phrase,
        sentence,
        flags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_query_with_flags() {
        let query = parse_query("mint -n -fd -rec").unwrap();
        assert_eq!(query.phrase, "mint");
        assert_eq!(query.sentence, None);
        assert_eq!(query.flags.dictionaries, vec![DictionaryName::Freedict]);
        assert!(query.flags.gram.matches("noun"));
        assert!(query.flags.record);
        assert!(!query.flags.filter_subsenses);
    }

    #[test]
    fn test_hyphenated_words_are_not_flags() {
        let query = parse_query("well-being -f").unwrap();
        assert_eq!(query.phrase, "well-being");
        assert!(query.flags.filter_subsenses);
    }

    #[test]
    fn test_phrase_marked_inside_sentence() {
        let query = parse_query("They <ran out of> milk yesterday. -i").unwrap();
        assert_eq!(query.phrase, "ran out of");
        assert_eq!(query.sentence.as_deref(), Some("They <ran out of> milk yesterday."));
        assert_eq!(query.flags.dictionaries, vec![DictionaryName::Idioms]);
    }

    #[test]
    fn test_several_dictionaries_fan_out_in_order() {
        let query = parse_query("break a leg -i -fd --idioms").unwrap();
        assert_eq!(
            query.flags.dictionaries,
            vec![DictionaryName::Idioms, DictionaryName::Freedict]
        );
    }

    #[test]
    fn test_empty_phrases_are_rejected() {
        assert!(parse_query("   ").is_none());
        assert!(parse_query("an empty <> marker").is_none());
    }
}
