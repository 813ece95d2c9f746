// src/dictionaries/http.rs

use super::SourceError;
use crate::constants::{HTTP_TIMEOUT_SECS, USER_AGENT};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Blocking HTTP client shared by every source. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// GETs a JSON document. A 404 is reported as `Ok(None)`.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>, SourceError> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send()?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let bytes = response.bytes()?;
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            status => Err(SourceError::Status(status.as_u16())),
        }
    }

    /// Whether `url` answers with a success status to a HEAD request.
    pub fn exists(&self, url: &str) -> Result<bool, SourceError> {
        log::debug!("HEAD {}", url);
        let response = self.client.head(url).send()?;
        Ok(response.status().is_success())
    }

    /// Downloads `url` into `dest`. The file only appears once complete.
    pub fn download(&self, url: &str, dest: &Path) -> Result<(), SourceError> {
        log::debug!("Downloading {} to '{}'", url, dest.display());
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }
        let bytes = response.bytes()?;

        let dir = dest
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let io_error = |e: std::io::Error| SourceError::Decode(e.to_string());
        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_error)?;
        temp.write_all(&bytes).map_err(io_error)?;
        temp.persist(dest).map_err(|e| io_error(e.error))?;
        Ok(())
    }
}

/// Percent-encodes one path segment or query value.
pub fn encode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}
