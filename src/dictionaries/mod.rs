// src/dictionaries/mod.rs

//! Dictionary sources.
//!
//! Every source reduces its own response format to a [`CanonicalEntry`]
//! behind [`ScrapeAdapter`]. Pronunciation lookups sit behind [`AudioSource`].

pub mod commons;
pub mod datamuse;
pub mod freedict;
pub mod http;
pub mod wiktionary;

use crate::constants::MAX_REDIRECTS;
use crate::core::query::QueryFlags;
use crate::models::{AudioSourceName, CanonicalEntry, DictionaryName};
use http::HttpClient;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("No entry found for '{0}'")]
    NotFound(String),
    #[error("Could not establish a connection: {0}")]
    Connectivity(String),
    #[error("Connection timed out")]
    Timeout,
    #[error("Unexpected HTTP status {0}")]
    Status(u16),
    #[error("Could not read the response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Connectivity(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

/// What a single request to a source produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Entry(CanonicalEntry),
    /// The page only points at another headword.
    Redirect(String),
    NotFound,
}

/// What a lookup produced after following redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(CanonicalEntry),
    Redirected { from: String, entry: CanonicalEntry },
    NotFound,
}

impl Lookup {
    pub fn into_entry(self) -> Option<CanonicalEntry> {
        match self {
            Self::Found(entry) | Self::Redirected { entry, .. } => Some(entry),
            Self::NotFound => None,
        }
    }
}

pub trait ScrapeAdapter {
    /// Display name, used as the title of the rendered entry.
    fn title(&self) -> &str;

    /// Whether a thesaurus lookup should follow this source's entry.
    fn allows_thesaurus(&self) -> bool;

    /// Whether entries carry their own pronunciation urls.
    fn supplies_audio(&self) -> bool;

    fn fetch(&self, query: &str, flags: &QueryFlags) -> Result<Fetched, SourceError>;
}

/// Fetches `query`, following at most [`MAX_REDIRECTS`] redirects.
pub fn lookup(adapter: &dyn ScrapeAdapter, query: &str, flags: &QueryFlags) -> Result<Lookup, SourceError> {
    let mut current = query.to_string();
    for depth in 0..=MAX_REDIRECTS {
        log::debug!("Querying {} for '{}' (depth {})", adapter.title(), current, depth);
        match adapter.fetch(&current, flags)? {
            Fetched::Entry(entry) if depth == 0 => return Ok(Lookup::Found(entry)),
            Fetched::Entry(entry) => {
                return Ok(Lookup::Redirected {
                    from: query.to_string(),
                    entry,
                });
            }
            Fetched::Redirect(target) => {
                if target.eq_ignore_ascii_case(&current) {
                    break;
                }
                log::debug!("'{}' redirects to '{}'", current, target);
                current = target;
            }
            Fetched::NotFound => break,
        }
    }
    Ok(Lookup::NotFound)
}

pub trait AudioSource {
    fn name(&self) -> AudioSourceName;

    /// Finds a pronunciation url for `phrase`. `pos_hint` is a label word
    /// (`noun`, `verb`, ...) used to pick between homographs.
    fn resolve_audio(&self, phrase: &str, pos_hint: Option<&str>) -> Result<Option<String>, SourceError>;
}

/// Every source the pipeline can reach.
pub struct Sources {
    pub dictionaries: HashMap<DictionaryName, Box<dyn ScrapeAdapter>>,
    pub thesaurus: Option<Box<dyn ScrapeAdapter>>,
    pub audio: Vec<Box<dyn AudioSource>>,
}

impl std::fmt::Debug for Sources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sources")
            .field("dictionaries", &self.dictionaries.keys().collect::<Vec<_>>())
            .field("thesaurus", &self.thesaurus.as_ref().map(|t| t.title().to_string()))
            .field("audio", &self.audio.iter().map(|a| a.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl Sources {
    /// The online sources, sharing one HTTP client.
    pub fn online() -> Result<Self, SourceError> {
        let client = HttpClient::new()?;
        let mut dictionaries: HashMap<DictionaryName, Box<dyn ScrapeAdapter>> = HashMap::new();
        dictionaries.insert(
            DictionaryName::Freedict,
            Box::new(freedict::Freedict::new(client.clone())),
        );
        dictionaries.insert(
            DictionaryName::Idioms,
            Box::new(wiktionary::Idioms::new(client.clone())),
        );

        Ok(Self {
            dictionaries,
            thesaurus: Some(Box::new(datamuse::Thesaurus::new(client.clone()))),
            audio: vec![
                Box::new(freedict::Freedict::new(client.clone())),
                Box::new(commons::Commons::new(client)),
            ],
        })
    }

    pub fn dictionary(&self, name: DictionaryName) -> Option<&dyn ScrapeAdapter> {
        self.dictionaries.get(&name).map(|adapter| adapter.as_ref())
    }

    pub fn audio_source(&self, name: AudioSourceName) -> Option<&dyn AudioSource> {
        self.audio
            .iter()
            .find(|source| source.name() == name)
            .map(|source| source.as_ref())
    }
}

lazy_static! {
    static ref TAG_RE: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref SPACES_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Removes markup tags and decodes the common HTML entities.
pub fn strip_markup(html: &str) -> String {
    let text = TAG_RE.replace_all(html, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    SPACES_RE.replace_all(text.trim(), " ").into_owned()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::EntryBuilder;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Canned responses keyed by query; unknown queries are not found.
    pub(crate) struct FakeAdapter {
        pub title: &'static str,
        pub thesaurus: bool,
        pub audio: bool,
        pub responses: HashMap<String, Fetched>,
        pub calls: RefCell<Vec<String>>,
    }

    impl FakeAdapter {
        pub(crate) fn new(title: &'static str) -> Self {
            Self {
                title,
                thesaurus: false,
                audio: true,
                responses: HashMap::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub(crate) fn with(mut self, query: &str, fetched: Fetched) -> Self {
            self.responses.insert(query.to_string(), fetched);
            self
        }
    }

    impl ScrapeAdapter for FakeAdapter {
        fn title(&self) -> &str {
            self.title
        }
        fn allows_thesaurus(&self) -> bool {
            self.thesaurus
        }
        fn supplies_audio(&self) -> bool {
            self.audio
        }
        fn fetch(&self, query: &str, _flags: &QueryFlags) -> Result<Fetched, SourceError> {
            self.calls.borrow_mut().push(query.to_string());
            Ok(self.responses.get(query).cloned().unwrap_or(Fetched::NotFound))
        }
    }

    pub(crate) fn simple_entry(source: &str, phrase: &str, definitions: &[&str]) -> CanonicalEntry {
        let mut builder = EntryBuilder::new(source);
        builder.begin_phrase(phrase, "", "").begin_gram_block("noun", "");
        for definition in definitions {
            builder.push_definition(*definition, "", false);
        }
        builder.finish().unwrap()
    }

    #[test]
    fn test_lookup_returns_direct_hits() {
        let entry = simple_entry("Fake", "cat", &["a feline"]);
        let adapter = FakeAdapter::new("Fake").with("cat", Fetched::Entry(entry.clone()));
        let result = lookup(&adapter, "cat", &QueryFlags::default()).unwrap();
        assert_eq!(result, Lookup::Found(entry));
    }

    #[test]
    fn test_lookup_follows_redirects() {
        let entry = simple_entry("Fake", "go", &["to move"]);
        let adapter = FakeAdapter::new("Fake")
            .with("went", Fetched::Redirect("go".to_string()))
            .with("go", Fetched::Entry(entry.clone()));
        let result = lookup(&adapter, "went", &QueryFlags::default()).unwrap();
        assert_eq!(
            result,
            Lookup::Redirected {
                from: "went".to_string(),
                entry
            }
        );
    }

    #[test]
    fn test_redirect_chains_are_bounded() {
        let adapter = FakeAdapter::new("Fake")
            .with("a", Fetched::Redirect("b".to_string()))
            .with("b", Fetched::Redirect("c".to_string()))
            .with("c", Fetched::Redirect("d".to_string()))
            .with("d", Fetched::Entry(simple_entry("Fake", "d", &["dee"])));
        let result = lookup(&adapter, "a", &QueryFlags::default()).unwrap();
        assert_eq!(result, Lookup::NotFound);
        assert_eq!(adapter.calls.borrow().len(), MAX_REDIRECTS + 1);
    }

    #[test]
    fn test_self_redirect_stops_immediately() {
        let adapter = FakeAdapter::new("Fake").with("loop", Fetched::Redirect("Loop".to_string()));
        assert_eq!(lookup(&adapter, "loop", &QueryFlags::default()).unwrap(), Lookup::NotFound);
        assert_eq!(adapter.calls.borrow().len(), 1);
    }

    #[test]
    fn test_strip_markup() {
        let html = r#"<i>To</i> <a href="/wiki/x">break</a> &quot;a leg&quot;   &amp; more"#;
        assert_eq!(strip_markup(html), "To break \"a leg\" & more");
    }
}
