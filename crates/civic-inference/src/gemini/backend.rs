//! Gemini generation backend with key rotation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use civic_core::{defaults, Error, GenerationBackend, Result};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info, instrument, warn};

use super::error::{to_civic_error, GeminiErrorCode};
use super::types::{GenerateContentRequest, GenerateContentResponse, GeminiErrorResponse};

/// Configuration for the Gemini backend.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`.
    pub base_url: String,
    pub model: String,
    /// Keys tried in rotation; rotation advances on every rate-limited reply.
    pub api_keys: Vec<String>,
    /// Retries after a rate-limited reply.
    pub max_retries: u32,
    /// Wait before retry `n` is `backoff_base * 2^n`.
    pub backoff_base: Duration,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::GEMINI_URL.to_string(),
            model: defaults::GEMINI_MODEL.to_string(),
            api_keys: Vec::new(),
            max_retries: defaults::AI_MAX_RETRIES,
            backoff_base: Duration::from_millis(defaults::AI_BACKOFF_BASE_MS),
            timeout: Duration::from_secs(defaults::AI_TIMEOUT_SECS),
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_keys", &format_args!("[{} redacted]", self.api_keys.len()))
            .field("max_retries", &self.max_retries)
            .field("backoff_base", &self.backoff_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiConfig {
    /// Create from environment variables.
    ///
    /// `GEMINI_API_KEYS` is a comma-separated list; blank entries are ignored.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            base_url: std::env::var(defaults::ENV_GEMINI_BASE_URL).unwrap_or(base.base_url),
            model: std::env::var(defaults::ENV_GEMINI_MODEL).unwrap_or(base.model),
            api_keys: std::env::var(defaults::ENV_GEMINI_API_KEYS)
                .map(|v| parse_key_list(&v))
                .unwrap_or_default(),
            max_retries: std::env::var(defaults::ENV_GEMINI_MAX_RETRIES)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(base.max_retries),
            backoff_base: std::env::var(defaults::ENV_GEMINI_BACKOFF_MS)
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(base.backoff_base),
            timeout: std::env::var(defaults::ENV_GEMINI_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(base.timeout),
        }
    }

    pub fn with_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.api_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Gemini `generateContent` backend.
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
    key_index: AtomicUsize,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "gemini",
            model = %config.model,
            key_count = config.api_keys.len(),
            "Initializing Gemini backend"
        );

        Ok(Self {
            client,
            config,
            key_index: AtomicUsize::new(0),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env())
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Index of the key the next request will use.
    pub fn current_key_index(&self) -> usize {
        match self.config.api_keys.len() {
            0 => 0,
            n => self.key_index.load(Ordering::SeqCst) % n,
        }
    }

    fn rotate_key(&self) -> usize {
        match self.config.api_keys.len() {
            0 | 1 => 0,
            n => (self.key_index.fetch_add(1, Ordering::SeqCst) + 1) % n,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn send(&self, request: &GenerateContentRequest) -> Result<Response> {
        let mut req = self.client.post(self.endpoint()).json(request);
        if let Some(key) = self.config.api_keys.get(self.current_key_index()) {
            req = req.query(&[("key", key)]);
        }
        req.send()
            .await
            .map_err(|e| Error::AiUnavailable(format!("Request failed: {}", e)))
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    #[instrument(
        skip(self, prompt),
        fields(subsystem = "inference", component = "gemini", op = "generate", model = %self.config.model, prompt_len = prompt.len())
    )]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest::from_prompt(prompt);

        let mut attempt = 0;
        let response = loop {
            let response = self.send(&request).await?;
            if response.status() != StatusCode::TOO_MANY_REQUESTS || attempt >= self.config.max_retries
            {
                break response;
            }

            let key_index = self.rotate_key();
            let wait = self.config.backoff(attempt);
            warn!(
                attempt = attempt + 1,
                key_index,
                wait_ms = wait.as_millis() as u64,
                "Rate limited, rotating key and backing off"
            );
            tokio::time::sleep(wait).await;
            attempt += 1;
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            let code = GeminiErrorCode::from_status(status.as_u16());
            warn!(status = status.as_u16(), error = %message, "Gemini request failed");
            return Err(to_civic_error(code, status.as_u16(), &message));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| Error::AiUnavailable(format!("Failed to parse response: {}", e)))?;

        let text = body
            .first_text()
            .ok_or_else(|| Error::AiUnavailable("No candidates returned".to_string()))?
            .to_string();

        debug!(response_len = text.len(), attempt, "Generation complete");
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeminiConfig::default();
        assert_eq!(config.base_url, defaults::GEMINI_URL);
        assert_eq!(config.model, "gemini-pro-latest");
        assert_eq!(config.max_retries, 3);
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn test_backoff_doubles() {
        let config = GeminiConfig::default();
        assert_eq!(config.backoff(0), Duration::from_millis(2000));
        assert_eq!(config.backoff(1), Duration::from_millis(4000));
        assert_eq!(config.backoff(2), Duration::from_millis(8000));
    }

    #[test]
    fn test_parse_key_list() {
        assert_eq!(parse_key_list(" k1, ,k2 ,"), vec!["k1", "k2"]);
        assert!(parse_key_list("").is_empty());
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = GeminiConfig::default().with_keys(["secret-one", "secret-two"]);
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[2 redacted]"));
    }

    #[test]
    fn test_key_rotation_wraps() {
        let backend =
            GeminiBackend::new(GeminiConfig::default().with_keys(["a", "b", "c"])).unwrap();
        assert_eq!(backend.current_key_index(), 0);
        assert_eq!(backend.rotate_key(), 1);
        assert_eq!(backend.rotate_key(), 2);
        assert_eq!(backend.rotate_key(), 0);
        assert_eq!(backend.current_key_index(), 0);
    }

    #[test]
    fn test_endpoint_includes_model() {
        let backend = GeminiBackend::new(GeminiConfig {
            base_url: "http://localhost:9000/v1beta/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            backend.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-pro-latest:generateContent"
        );
    }
}
