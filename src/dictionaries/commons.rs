// src/dictionaries/commons.rs

use super::http::{HttpClient, encode};
use super::{AudioSource, SourceError};
use crate::models::AudioSourceName;

const FILE_PATH_URL: &str = "https://commons.wikimedia.org/wiki/Special:FilePath/";

/// Pronunciation recordings hosted on Wikimedia Commons (`En-us-<word>.ogg`).
#[derive(Debug, Clone)]
pub struct Commons {
    client: HttpClient,
}

impl Commons {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

/// Commons file names use underscores for spaces.
pub(crate) fn file_url(phrase: &str) -> String {
    let words = phrase.split_whitespace().collect::<Vec<_>>().join("_");
    format!("{}{}", FILE_PATH_URL, encode(&format!("En-us-{}.ogg", words)))
}

impl AudioSource for Commons {
    fn name(&self) -> AudioSourceName {
        AudioSourceName::Commons
    }

    fn resolve_audio(&self, phrase: &str, _pos_hint: Option<&str>) -> Result<Option<String>, SourceError> {
        let url = file_url(phrase);
        if self.client.exists(&url)? {
            Ok(Some(url))
        } else {
            log::debug!("No Commons recording for '{}'", phrase);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url_for_phrase() {
        assert_eq!(
            file_url(" give  up "),
            "https://commons.wikimedia.org/wiki/Special:FilePath/En%2Dus%2Dgive%5Fup%2Eogg"
        );
    }
}
