// src/system/audio.rs

use crate::core::paths::{self, PathError};
use crate::core::pipeline::AudioStore;
use crate::dictionaries::SourceError;
use crate::dictionaries::http::HttpClient;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Could not download '{url}': {source}")]
    Download {
        url: String,
        #[source]
        source: SourceError,
    },
    #[error("'{0}' does not name an audio file")]
    NoFileName(String),
}

/// The reference Anki expects in a field to play a media file.
pub fn sound_tag(file_name: &str) -> String {
    format!("[sound:{}]", file_name)
}

/// The local file name for an audio url: its last path segment, without
/// query string and with anything unsafe in a file name replaced.
pub fn file_name_for(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next()?;
    let decoded = percent_encoding::percent_decode_str(segment).decode_utf8_lossy();
    let name: String = decoded
        .chars()
        .map(|c| if c.is_alphanumeric() || "._-".contains(c) { c } else { '_' })
        .collect();
    if name.trim_matches(['.', '_']).is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Downloads pronunciation files into the audio directory.
#[derive(Debug, Clone)]
pub struct AudioDownloader {
    dir: PathBuf,
    client: HttpClient,
}

impl AudioDownloader {
    pub fn new(dir: PathBuf, client: HttpClient) -> Self {
        Self { dir, client }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Saves `url` and returns the file name. Files already present are
    /// not downloaded again.
    pub fn download(&self, url: &str) -> Result<String, AudioError> {
        let name = file_name_for(url).ok_or_else(|| AudioError::NoFileName(url.to_string()))?;
        let dest = self.dir.join(&name);
        if dest.exists() {
            log::debug!("'{}' already downloaded", name);
            return Ok(name);
        }
        paths::ensure_dir(&self.dir)?;
        self.client
            .download(url, &dest)
            .map_err(|e| AudioError::Download {
                url: url.to_string(),
                source: e,
            })?;
        Ok(name)
    }
}

impl AudioStore for AudioDownloader {
    fn store(&self, url: &str) -> anyhow::Result<String> {
        Ok(sound_tag(&self.download(url)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_is_the_last_segment() {
        assert_eq!(
            file_name_for("https://audio.example/media/mint-us.mp3?x=1").as_deref(),
            Some("mint-us.mp3")
        );
        assert_eq!(
            file_name_for("https://commons.wikimedia.org/wiki/Special:FilePath/En%2Dus%2Dgive%5Fup%2Eogg")
                .as_deref(),
            Some("En-us-give_up.ogg")
        );
        assert_eq!(file_name_for("https://audio.example/"), None);
    }

    #[test]
    fn test_unsafe_characters_are_replaced() {
        assert_eq!(
            file_name_for("https://a.example/x/it%27s%20ok.mp3").as_deref(),
            Some("it_s_ok.mp3")
        );
    }

    #[test]
    fn test_existing_files_are_not_downloaded_again() {
        // --- Setup ---
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mint-us.mp3"), b"ogg").unwrap();
        let downloader = AudioDownloader::new(dir.path().to_path_buf(), HttpClient::new().unwrap());

        // --- Execute ---
        // The host does not resolve; only the existing file can satisfy this.
        let stored = downloader.store("https://audio.invalid/mint-us.mp3").unwrap();

        // --- Assert ---
        assert_eq!(stored, "[sound:mint-us.mp3]");
    }
}
