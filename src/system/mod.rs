//! # System Interaction Layer
//!
//! Everything that leaves the process once a card is assembled.
//!
//! ## Modules
//!
//! - **`anki`**: The AnkiConnect client, the note-field mapping and its cache.
//! - **`audio`**: Downloads pronunciation files into the audio directory and
//!   turns them into `[sound:...]` references.
//! - **`card_file`**: The tab-separated card file (append and delete-last).
//! - **`executor`**: Spawns and stops the external encoder used by `-rec`.

pub mod anki;
pub mod audio;
pub mod card_file;
pub mod executor;
