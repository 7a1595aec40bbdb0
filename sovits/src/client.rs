//! GPT-SoVITS API client.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT},
    Client as ReqwestClient, Response,
};
use tracing::debug;

use super::{
    error::{Error, Result},
    types::{ApiErrorBody, TtsRequest, Version, SPLIT_METHODS},
    wav::decode_wav,
};

/// Default address of a locally started `api_v2.py`.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:9880";

/// Default maximum number of retries.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default request timeout. Long inputs on slow GPUs take minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// GPT-SoVITS API client.
///
/// # Example
///
/// ```rust,ignore
/// use giztoy_sovits::{Client, TtsRequest};
///
/// let client = Client::builder().base_url("http://gpu-box:9880").build()?;
/// let wav = client.synthesize(&request).await?;
/// ```
pub struct Client {
    http: ReqwestClient,
    base_url: String,
    version: Version,
    max_retries: u32,
    languages: Vec<String>,
    split_methods: Vec<String>,
}

impl Client {
    /// Creates a client for the default local server.
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    /// Creates a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model version the client validates languages against.
    pub fn version(&self) -> Version {
        self.version
    }

    pub(crate) fn language_list(&self) -> &[String] {
        &self.languages
    }

    pub(crate) fn split_method_list(&self) -> &[String] {
        &self.split_methods
    }

    /// Synthesizes the request into a WAV file.
    pub async fn synthesize(&self, req: &TtsRequest) -> Result<Bytes> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff(attempt)).await;
            }

            match self.do_synthesize(req).await {
                Ok(wav) => return Ok(wav),
                Err(e) if e.is_retryable() => {
                    debug!(attempt, error = %e, "sovits: retrying synthesis");
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Other("max retries exceeded".to_string())))
    }

    /// Synthesizes the request and decodes it into mono 16-bit samples.
    pub async fn synthesize_pcm(&self, req: &TtsRequest) -> Result<(u32, Vec<i16>)> {
        let wav = self.synthesize(req).await?;
        decode_wav(&wav)
    }

    async fn do_synthesize(&self, req: &TtsRequest) -> Result<Bytes> {
        let url = format!("{}/tts", self.base_url);
        let response = self
            .http
            .post(&url)
            .headers(default_headers())
            .json(req)
            .send()
            .await?;
        handle_response(response).await
    }
}

/// Maximum delay between retries.
const MAX_BACKOFF: Duration = Duration::from_secs(64);

/// Exponential backoff before the given retry: 1s, 2s, 4s, ... capped at 64s.
fn backoff(attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(6);
    Duration::from_secs(1u64 << exp).min(MAX_BACKOFF)
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("audio/wav"));
    headers.insert(USER_AGENT, HeaderValue::from_static("giztoy-sovits-rust/1.0"));
    headers
}

async fn handle_response(response: Response) -> Result<Bytes> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(parse_error(&body, status.as_u16()));
    }
    Ok(body)
}

fn parse_error(body: &[u8], http_status: u16) -> Error {
    match serde_json::from_slice::<ApiErrorBody>(body) {
        Ok(err) => Error::Api {
            http_status,
            message: err.message,
            exception: err.exception,
        },
        Err(_) => Error::api(http_status, String::from_utf8_lossy(body).to_string()),
    }
}

/// Builder for creating a GPT-SoVITS client.
pub struct ClientBuilder {
    base_url: String,
    version: Version,
    timeout: Duration,
    max_retries: u32,
    languages: Option<Vec<String>>,
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
            version: Version::default(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            languages: None,
        }
    }

    /// Sets the server address. A trailing slash is ignored.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the model version, which determines the accepted languages.
    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum number of retries for transient errors.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Overrides the accepted languages, e.g. for a customised server.
    pub fn languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.languages = Some(languages.into_iter().map(Into::into).collect());
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<Client> {
        let base_url = self.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(Error::Config("base_url must be non-empty".to_string()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!("base_url must be an http(s) URL: {base_url}")));
        }

        let http = ReqwestClient::builder().timeout(self.timeout).build()?;

        let languages = match self.languages {
            Some(langs) => langs.into_iter().map(|l| l.to_lowercase()).collect(),
            None => self.version.languages().iter().map(|l| l.to_string()).collect(),
        };

        Ok(Client {
            http,
            base_url,
            version: self.version,
            max_retries: self.max_retries,
            languages,
            split_methods: SPLIT_METHODS.iter().map(|m| m.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let client = Client::new().unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.version(), Version::V2);
        assert!(client.language_list().iter().any(|l| l == "yue"));
        assert_eq!(client.split_method_list().len(), 6);
    }

    #[test]
    fn test_builder_validation() {
        assert!(matches!(
            Client::builder().base_url("").build(),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Client::builder().base_url("gpu-box:9880").build(),
            Err(Error::Config(_))
        ));

        let client = Client::builder()
            .base_url("http://gpu-box:9880/")
            .version(Version::V1)
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://gpu-box:9880");
        assert!(!client.language_list().iter().any(|l| l == "ko"));
    }

    #[test]
    fn test_language_override() {
        let client = Client::builder().languages(["EN", "fr"]).build().unwrap();
        assert_eq!(client.language_list(), &["en".to_string(), "fr".to_string()]);
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff(1), Duration::from_secs(1));
        assert_eq!(backoff(3), Duration::from_secs(4));
        assert_eq!(backoff(7), MAX_BACKOFF);
        assert_eq!(backoff(65), MAX_BACKOFF);
        assert_eq!(backoff(u32::MAX), MAX_BACKOFF);
    }

    #[test]
    fn test_parse_error_body() {
        let err = parse_error(br#"{"message": "tts failed", "Exception": "CUDA OOM"}"#, 400);
        match err {
            Error::Api { http_status, message, exception } => {
                assert_eq!(http_status, 400);
                assert_eq!(message, "tts failed");
                assert_eq!(exception.as_deref(), Some("CUDA OOM"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = parse_error(b"Internal Server Error", 500);
        assert!(err.is_server_error());
        assert!(err.to_string().contains("Internal Server Error"));
    }
}
