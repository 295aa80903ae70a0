//! Where rule documents come from.
//!
//! A [`RuleSource`] is chosen once from configuration and then fetched from
//! on every refresh. Sources hold no cached state: each fetch re-reads the
//! file or re-issues the request, so edits made outside the process are seen
//! on the next fetch.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ConfigError, RuleSourceError};
use crate::RuleDocument;

/// Request timeout for the remote source's HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The transport a rule document is fetched over.
#[derive(Debug, Clone)]
pub enum RuleSource {
    LocalFile(LocalFileSource),
    Remote(RemoteHttpSource),
}

impl RuleSource {
    /// Retrieve and decode the rule document.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSourceError::SourceUnavailable`] if the document cannot
    /// be read and [`RuleSourceError::MalformedDocument`] if it cannot be
    /// decoded.
    pub fn fetch(&self) -> Result<RuleDocument, RuleSourceError> {
        self.fetch_as()
    }

    /// Retrieve the document and decode it as `D`.
    ///
    /// # Errors
    ///
    /// See [`RuleSource::fetch`].
    pub fn fetch_as<D: DeserializeOwned>(&self) -> Result<D, RuleSourceError> {
        match self {
            RuleSource::LocalFile(source) => source.fetch_as(),
            RuleSource::Remote(source) => source.fetch_as(),
        }
    }
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSource::LocalFile(source) => write!(f, "{}", source.path.display()),
            RuleSource::Remote(source) => write!(f, "{}", source.url),
        }
    }
}

impl From<LocalFileSource> for RuleSource {
    fn from(source: LocalFileSource) -> Self {
        RuleSource::LocalFile(source)
    }
}

impl From<RemoteHttpSource> for RuleSource {
    fn from(source: RemoteHttpSource) -> Self {
        RuleSource::Remote(source)
    }
}

/// Reads a JSON rule document from the local file system.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    path: PathBuf,
}

impl LocalFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    ///
    /// See [`RuleSource::fetch`].
    pub fn fetch(&self) -> Result<RuleDocument, RuleSourceError> {
        self.fetch_as()
    }

    /// # Errors
    ///
    /// See [`RuleSource::fetch`].
    pub fn fetch_as<D: DeserializeOwned>(&self) -> Result<D, RuleSourceError> {
        let location = self.path.display();
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| RuleSourceError::unavailable(&location, e))?;
        debug!(path = %location, bytes = contents.len(), "read rule document");
        serde_json::from_str(&contents).map_err(|e| RuleSourceError::malformed(&location, e))
    }
}

/// Fetches a JSON rule document with an HTTP GET.
///
/// The response body may wrap the rules: `pointer` is a JSON pointer
/// (RFC 6901) selecting the node to decode, with the empty pointer selecting
/// the whole body.
#[derive(Debug, Clone)]
pub struct RemoteHttpSource {
    client: Client,
    url: Url,
    pointer: String,
}

impl RemoteHttpSource {
    /// Create a source with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the URL or pointer is invalid, or the HTTP
    /// client cannot be created.
    pub fn new(url: &str, pointer: impl Into<String>) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Self::with_client(client, url, pointer)
    }

    /// Create a source sharing an existing HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the URL or pointer is invalid.
    pub fn with_client(
        client: Client,
        url: &str,
        pointer: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let url = Url::parse(url).map_err(|e| ConfigError::InvalidProperty {
            key: crate::config::CONFIG_URL.to_owned(),
            reason: format!("'{url}' is not a valid URL: {e}"),
        })?;
        let pointer = pointer.into();
        validate_pointer(&pointer)?;
        Ok(Self {
            client,
            url,
            pointer,
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// # Errors
    ///
    /// See [`RuleSource::fetch`]. Any status other than `200 OK` is
    /// [`RuleSourceError::SourceUnavailable`].
    pub fn fetch(&self) -> Result<RuleDocument, RuleSourceError> {
        self.fetch_as()
    }

    /// # Errors
    ///
    /// See [`RemoteHttpSource::fetch`].
    pub fn fetch_as<D: DeserializeOwned>(&self) -> Result<D, RuleSourceError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .map_err(|e| RuleSourceError::unavailable(&self.url, e))?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(RuleSourceError::unavailable(
                &self.url,
                format!(
                    "Request to '{}' returned unexpected status code: '{}'",
                    self.url,
                    status.as_u16()
                ),
            ));
        }
        let body = response
            .text()
            .map_err(|e| RuleSourceError::unavailable(&self.url, e))?;
        debug!(url = %self.url, bytes = body.len(), "fetched rule document");
        extract_document(&body, &self.pointer).map_err(|e| RuleSourceError::malformed(&self.url, e))
    }
}

/// Parse `body` as JSON and decode the node at `pointer` as a `D`.
pub(crate) fn extract_document<D>(body: &str, pointer: &str) -> Result<D, String>
where
    D: DeserializeOwned,
{
    let tree: serde_json::Value = serde_json::from_str(body).map_err(|e| e.to_string())?;
    let node = tree
        .pointer(pointer)
        .ok_or_else(|| format!("JSON pointer '{pointer}' does not resolve to a value"))?;
    D::deserialize(node)
        .map_err(|e| format!("Failed to convert JSON tree node at '{pointer}': {e}"))
}

/// An empty pointer selects the whole document; anything else must start
/// with `/`.
pub(crate) fn validate_pointer(pointer: &str) -> Result<(), ConfigError> {
    if pointer.is_empty() || pointer.starts_with('/') {
        return Ok(());
    }
    Err(ConfigError::InvalidProperty {
        key: crate::config::JSON_POINTER.to_owned(),
        reason: format!("'{pointer}' is not a JSON pointer; it must be empty or start with '/'"),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const CATALOGS: &str = r#"{"catalogs": [{"catalog": "sales", "allow": "all"}]}"#;

    #[test]
    fn empty_pointer_selects_whole_document() {
        let doc: RuleDocument = extract_document(CATALOGS, "").unwrap();
        assert_eq!(doc.catalogs.unwrap().len(), 1);
    }

    #[test]
    fn pointer_selects_sub_document() {
        let body = r#"{"data": {"catalogs": [{"allow": "none"}]}, "other": {"unrelated": 1}}"#;
        let doc: RuleDocument = extract_document(body, "/data").unwrap();
        assert_eq!(doc.catalogs.unwrap().len(), 1);
        assert!(doc.schemas.is_none());
    }

    #[test]
    fn pointer_escapes() {
        let body = r#"{"a/b": {"c~d": {"queries": []}}}"#;
        let doc: RuleDocument = extract_document(body, "/a~1b/c~0d").unwrap();
        assert_eq!(doc.queries, Some(vec![]));
    }

    #[test]
    fn missing_pointer_target_is_malformed() {
        let err = extract_document::<RuleDocument>(CATALOGS, "/data").unwrap_err();
        assert!(err.contains("does not resolve"));
    }

    #[test]
    fn wrong_shape_at_pointer_is_malformed() {
        let err = extract_document::<RuleDocument>(r#"{"data": [1, 2]}"#, "/data").unwrap_err();
        assert!(err.starts_with("Failed to convert JSON tree node"));
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(extract_document::<RuleDocument>("{not json", "").is_err());
    }

    #[test]
    fn pointer_validation() {
        assert!(validate_pointer("").is_ok());
        assert!(validate_pointer("/data/rules").is_ok());
        assert!(validate_pointer("data").is_err());
    }

    #[test]
    fn local_file_reads_on_every_fetch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOGS.as_bytes()).unwrap();
        let source = LocalFileSource::new(file.path());
        assert_eq!(source.fetch().unwrap().catalogs.unwrap().len(), 1);

        std::fs::write(file.path(), "{}").unwrap();
        assert!(source.fetch().unwrap().catalogs.is_none());
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = LocalFileSource::new(dir.path().join("absent.json"));
        let err = source.fetch().unwrap_err();
        assert!(matches!(err, RuleSourceError::SourceUnavailable { .. }));
    }

    #[test]
    fn malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"catalogs": [{"allow": "sometimes"}]}"#).unwrap();
        let err = LocalFileSource::new(file.path()).fetch().unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn invalid_url_is_config_error() {
        let err = RemoteHttpSource::new("not a url", "").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidProperty { .. }));
    }

    #[test]
    fn display_names_location() {
        let source = RuleSource::from(LocalFileSource::new("/etc/rules.json"));
        assert_eq!(source.to_string(), "/etc/rules.json");
    }
}
