//! Configuration for a [`crate::NutritionAdvisor`].
//!
//! Everything the pipeline needs, including the secrets, travels in one
//! [`AdvisorConfig`] value. Nothing below the front-ends reads the process
//! environment, so each stage can be pointed at a mock server in tests.

use crate::credentials::Credentials;
use crate::error::AdvisorError;
use crate::pipeline::analyze::{CHAT_COMPLETIONS_URL, DEFAULT_MODEL};
use crate::pipeline::ocr::RECOGNIZE_BASE_URL;
use crate::progress::ProgressCallback;
use std::fmt;

/// Configuration for the OCR → LLM pipeline.
///
/// Built via [`AdvisorConfig::builder()`].
///
/// # Example
/// ```rust
/// use nutrition_advisor::{AdvisorConfig, Credentials};
///
/// let credentials = Credentials::new("ocr-token", "api-key").unwrap();
/// let config = AdvisorConfig::builder(credentials)
///     .model("glm-4")
///     .request_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "glm-4");
/// ```
#[derive(Clone)]
pub struct AdvisorConfig {
    /// OCR token and chat API key.
    pub credentials: Credentials,

    /// Table-OCR endpoint. The access token is appended as a query parameter.
    pub ocr_endpoint: String,

    /// Chat-completions endpoint.
    pub chat_endpoint: String,

    /// Chat model identifier. Default: `glm-4`.
    pub model: String,

    /// Sampling temperature. Default: `None` (service default).
    pub temperature: Option<f32>,

    /// Per-request timeout in seconds, applied to both services. Default: 60.
    ///
    /// Table OCR on a phone photo usually answers in 1–3 s; a GLM-4
    /// completion of a full nutrition report takes 10–30 s.
    pub request_timeout_secs: u64,

    /// Optional per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for AdvisorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvisorConfig")
            .field("credentials", &self.credentials)
            .field("ocr_endpoint", &self.ocr_endpoint)
            .field("chat_endpoint", &self.chat_endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn AdviceProgressCallback>"),
            )
            .finish()
    }
}

impl AdvisorConfig {
    /// Create a builder with default endpoints, model and timeout.
    pub fn builder(credentials: Credentials) -> AdvisorConfigBuilder {
        AdvisorConfigBuilder {
            config: Self {
                credentials,
                ocr_endpoint: RECOGNIZE_BASE_URL.to_string(),
                chat_endpoint: CHAT_COMPLETIONS_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                temperature: None,
                request_timeout_secs: 60,
                progress_callback: None,
            },
        }
    }
}

/// Builder for [`AdvisorConfig`].
#[derive(Debug)]
pub struct AdvisorConfigBuilder {
    config: AdvisorConfig,
}

impl AdvisorConfigBuilder {
    pub fn ocr_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.ocr_endpoint = url.into();
        self
    }

    pub fn chat_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.chat_endpoint = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 1.0));
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AdvisorConfig, AdvisorError> {
        let c = &self.config;
        for (name, url) in [("OCR endpoint", &c.ocr_endpoint), ("chat endpoint", &c.chat_endpoint)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AdvisorError::InvalidConfig(format!(
                    "{name} must be an HTTP/HTTPS URL, got '{url}'"
                )));
            }
        }
        if c.model.trim().is_empty() {
            return Err(AdvisorError::InvalidConfig("Model must not be empty".into()));
        }
        if c.request_timeout_secs == 0 {
            return Err(AdvisorError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
