// src/constants.rs

/// The name of the application directory inside the system config directory.
pub const APP_DIR: &str = "cardsmith";

/// The name of the settings file (in ~/.config/cardsmith/).
pub const CONFIG_FILENAME: &str = "config.toml";

/// Cached field names of AnkiConnect note types (in ~/.config/cardsmith/).
pub const NOTE_FIELDS_FILENAME: &str = "note_fields.toml";

/// Default name of the tab-separated card file.
pub const DEFAULT_CARD_FILE: &str = "cardsmith_cards.txt";

/// Default text inserted where a hidden phrase was.
pub const DEFAULT_MASK: &str = "...";

pub const DEFAULT_TEXT_WIDTH: usize = 79;
pub const MAX_INDENT: usize = 20;

/// Narrowest width the wrapper is asked to fill.
pub const MIN_TEXT_WIDTH: usize = 20;

pub const ANKICONNECT_URL: &str = "http://127.0.0.1:8765";
pub const ANKICONNECT_VERSION: u32 = 6;

/// Request timeout for dictionary and audio requests, in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 10;

pub const USER_AGENT: &str = concat!("cardsmith/", env!("CARGO_PKG_VERSION"));

/// How many "see other entry" redirects a single lookup may follow.
pub const MAX_REDIRECTS: usize = 2;

/// Synonyms grouped into a single thesaurus candidate.
pub const SYNONYMS_PER_CANDIDATE: usize = 8;

/// Marks where a hidden phrase was, until the mask replaces it.
/// A private-use code point so it can never appear in dictionary text.
pub const HIDE_PLACEHOLDER: char = '\u{E000}';

/// Colors used to format definitions into HTML.
pub const DEF_INDEX_COLOR: &str = "#4EAA72";
pub const SENTENCE_HIGHLIGHT_COLOR: &str = "#91cb7d";
