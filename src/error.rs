//! Error types for the nutrition-advisor library.
//!
//! Every failure is fatal for the request that hit it: there are no retries
//! and no partial results. [`AdvisorError`] therefore carries enough context
//! for the front-ends to tell the user *which* stage failed, and
//! [`AdvisorError::category`] groups variants so the CLI can pick an exit
//! code and the web server an HTTP status without matching every variant.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The remote collaborator an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    /// Baidu table OCR.
    Ocr,
    /// Zhipu AI chat completions.
    Chat,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Ocr => f.write_str("Baidu OCR"),
            Service::Chat => f.write_str("Zhipu AI"),
        }
    }
}

/// Coarse grouping of [`AdvisorError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing or invalid configuration; raised before any network call.
    Configuration,
    /// Unusable image input; raised before the OCR call.
    Input,
    /// Either remote service failed or answered with something unusable.
    Remote,
    /// The result could not be written.
    Output,
    /// Anything else.
    Internal,
}

/// All errors returned by the nutrition-advisor library.
#[derive(Debug, Error)]
pub enum AdvisorError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// A secret is missing from every source.
    #[error("Missing {name}.\nPass {flag}, set {env_var}, or add \"{config_key}\" to the config file.")]
    MissingCredential {
        name: &'static str,
        flag: &'static str,
        env_var: &'static str,
        config_key: &'static str,
    },

    /// The config file exists but could not be parsed.
    #[error("Config file '{path}' is invalid: {detail}")]
    InvalidConfigFile { path: PathBuf, detail: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Image file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    ImageNotFound { path: PathBuf },

    /// Process does not have read permission on the image file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading the image.
    #[error("Failed to read image '{path}': {source}")]
    ImageReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The image contained zero bytes.
    #[error("Input image should not be empty")]
    EmptyImage,

    /// Uploaded bytes are not a decodable image.
    #[error("Could not decode image: {detail}")]
    ImageDecodeFailed { detail: String },

    /// Re-encoding the pixel grid as JPEG failed.
    #[error("JPEG encoding failed: {detail}")]
    ImageEncodeFailed { detail: String },

    // ── Remote service errors ─────────────────────────────────────────────
    /// Transport-level failure (DNS, connect, TLS, broken body).
    #[error("Request to {service} failed: {detail}\nCheck your internet connection.")]
    RequestFailed { service: Service, detail: String },

    /// The request exceeded the configured timeout.
    #[error("{service} request timed out after {secs}s\nIncrease --timeout.")]
    Timeout { service: Service, secs: u64 },

    /// Non-success HTTP status not covered by a more specific variant.
    #[error("{service} returned HTTP {status}: {detail}")]
    HttpStatus {
        service: Service,
        status: u16,
        detail: String,
    },

    /// Credentials were rejected.
    #[error("Authentication error from {service}: {detail}")]
    AuthError { service: Service, detail: String },

    /// Quota or rate limit exhausted.
    #[error("Rate limit exceeded for {service}: {detail}")]
    RateLimitExceeded { service: Service, detail: String },

    /// The service answered with an application-level error code.
    #[error("{service} API error {code}: {message}")]
    ApiError {
        service: Service,
        code: i64,
        message: String,
    },

    /// The OCR response contained no table.
    #[error("No table detected in the image.\nMake sure the photo shows the nutrition facts table.")]
    NoTableDetected,

    /// The response body did not have the expected shape.
    #[error("Malformed response from {service}: {detail}")]
    MalformedResponse { service: Service, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdvisorError {
    /// Which part of the taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        use AdvisorError::*;
        match self {
            MissingCredential { .. } | InvalidConfigFile { .. } | InvalidConfig(_) => {
                ErrorCategory::Configuration
            }
            ImageNotFound { .. }
            | PermissionDenied { .. }
            | ImageReadFailed { .. }
            | EmptyImage
            | ImageDecodeFailed { .. }
            | ImageEncodeFailed { .. } => ErrorCategory::Input,
            RequestFailed { .. }
            | Timeout { .. }
            | HttpStatus { .. }
            | AuthError { .. }
            | RateLimitExceeded { .. }
            | ApiError { .. }
            | NoTableDetected
            | MalformedResponse { .. } => ErrorCategory::Remote,
            OutputWriteFailed { .. } => ErrorCategory::Output,
            Internal(_) => ErrorCategory::Internal,
        }
    }

    /// The remote service involved, if any.
    pub fn service(&self) -> Option<Service> {
        use AdvisorError::*;
        match self {
            RequestFailed { service, .. }
            | Timeout { service, .. }
            | HttpStatus { service, .. }
            | AuthError { service, .. }
            | RateLimitExceeded { service, .. }
            | ApiError { service, .. }
            | MalformedResponse { service, .. } => Some(*service),
            NoTableDetected => Some(Service::Ocr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_display_names_every_source() {
        let e = AdvisorError::MissingCredential {
            name: "Baidu OCR token",
            flag: "--ocr_token",
            env_var: "BAIDU_OCR_TOKEN",
            config_key: "baidu_ocr_token",
        };
        let msg = e.to_string();
        assert!(msg.contains("--ocr_token"), "got: {msg}");
        assert!(msg.contains("BAIDU_OCR_TOKEN"), "got: {msg}");
        assert!(msg.contains("baidu_ocr_token"), "got: {msg}");
        assert_eq!(e.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn timeout_display() {
        let e = AdvisorError::Timeout {
            service: Service::Chat,
            secs: 30,
        };
        assert!(e.to_string().contains("Zhipu AI"));
        assert!(e.to_string().contains("30s"));
        assert_eq!(e.service(), Some(Service::Chat));
    }

    #[test]
    fn categories() {
        assert_eq!(AdvisorError::EmptyImage.category(), ErrorCategory::Input);
        assert_eq!(AdvisorError::NoTableDetected.category(), ErrorCategory::Remote);
        assert_eq!(AdvisorError::NoTableDetected.service(), Some(Service::Ocr));
        assert_eq!(
            AdvisorError::Internal("x".into()).category(),
            ErrorCategory::Internal
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let e = AdvisorError::OutputWriteFailed {
            path: "out.md".into(),
            source: io,
        };
        assert_eq!(e.category(), ErrorCategory::Output);
        assert_eq!(e.service(), None);
    }
}
