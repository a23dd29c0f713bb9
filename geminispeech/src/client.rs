//! Client construction and endpoint validation.

use std::time::Duration;

use aloud_speech::CloudError;
use url::Url;

use crate::Result;

/// Default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// The only hostname requests may be issued to. A constructed URL whose
/// host differs fails before any network activity.
pub const EXPECTED_HOST: &str = "generativelanguage.googleapis.com";

/// Default speech-generation model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// Maximum number of characters sent per request; longer text is truncated.
pub const MAX_TEXT_CHARS: usize = 5000;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Gemini Speech Generation API client.
///
/// Holds the connection pool and endpoint parameters; the API key is
/// supplied per call so credential edits apply without rebuilding.
pub struct Client {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) model: String,
    pub(crate) timeout: Duration,
}

impl Client {
    /// Returns a builder with default endpoint parameters.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Builds the `:generateContent` endpoint URL with the key as a query
    /// parameter and verifies its host against [`EXPECTED_HOST`].
    pub(crate) fn endpoint(&self, api_key: &str) -> Result<Url> {
        let raw = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let mut url = Url::parse(&raw)
            .map_err(|e| CloudError::Security(format!("unparseable endpoint: {e}")))?;
        url.query_pairs_mut().append_pair("key", api_key);

        // Re-parse what will actually be fetched; a URL assembled from
        // tampered parts must never leave the process.
        let parsed = Url::parse(url.as_str())
            .map_err(|e| CloudError::Security(format!("unparseable endpoint: {e}")))?;
        match parsed.host_str() {
            Some(host) if host == EXPECTED_HOST => Ok(parsed),
            Some(host) => Err(CloudError::Security(format!(
                "endpoint host {host:?} is not the Gemini API host"
            ))),
            None => Err(CloudError::Security("endpoint has no host".into())),
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        ClientBuilder::new().build()
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    base_url: String,
    model: String,
    timeout: Duration,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the base URL. The hostname pin ([`EXPECTED_HOST`]) still
    /// applies: a base URL pointing elsewhere fails at request time.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the speech model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Client {
        Client {
            http: reqwest::Client::new(),
            base_url: self.base_url.trim_end_matches('/').to_string(),
            model: self.model,
            timeout: self.timeout,
        }
    }
}
