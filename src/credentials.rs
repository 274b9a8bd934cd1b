//! Credential resolution for the two remote services.
//!
//! Two secrets are needed: a Baidu OCR access token and a Zhipu AI API key.
//! Each is looked up in three places, later sources overriding earlier ones:
//!
//! ```text
//! config file (config.json) ──▶ environment ──▶ explicit argument
//!    baidu_ocr_token            BAIDU_OCR_TOKEN    --ocr_token
//!    zhipu_ai_apikey            ZHIPU_API_KEY      --zhipu_api_key
//! ```
//!
//! Empty values never override. The config file is only read when the
//! environment and arguments leave a secret missing. Resolution happens once,
//! up front, so a missing secret is reported before any request leaves the
//! machine.

use crate::error::AdvisorError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable holding the Baidu OCR access token.
pub const OCR_TOKEN_ENV: &str = "BAIDU_OCR_TOKEN";

/// Environment variable holding the Zhipu AI API key.
pub const API_KEY_ENV: &str = "ZHIPU_API_KEY";

/// Config file looked up by the binaries when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// A validated pair of secrets.
///
/// Both values are guaranteed non-empty. `Debug` never prints them.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    ocr_token: String,
    api_key: String,
}

impl Credentials {
    /// Build credentials, rejecting empty values.
    pub fn new(
        ocr_token: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, AdvisorError> {
        let ocr_token = ocr_token.into();
        let api_key = api_key.into();
        if ocr_token.trim().is_empty() {
            return Err(missing_ocr_token());
        }
        if api_key.trim().is_empty() {
            return Err(missing_api_key());
        }
        Ok(Self { ocr_token, api_key })
    }

    pub fn ocr_token(&self) -> &str {
        &self.ocr_token
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("ocr_token", &"<redacted>")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// On-disk JSON config: `{"baidu_ocr_token": "...", "zhipu_ai_apikey": "..."}`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub baidu_ocr_token: Option<String>,
    #[serde(default)]
    pub zhipu_ai_apikey: Option<String>,
}

impl ConfigFile {
    /// Load the config file at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist or cannot be read.
    /// A readable file that is not a JSON object of the expected shape is an
    /// error.
    pub fn load(path: &Path) -> Result<Option<Self>, AdvisorError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!("Config file {} not used: {}", path.display(), e);
                return Ok(None);
            }
        };

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| AdvisorError::InvalidConfigFile {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })
    }
}

/// Every place a secret may come from.
///
/// Front-ends fill `ocr_token` / `api_key` from their flags and
/// `config_file` from `--config`; the environment is consulted during
/// [`resolve`](Self::resolve).
#[derive(Debug, Default, Clone)]
pub struct CredentialSources {
    /// Explicit OCR token (highest priority).
    pub ocr_token: Option<String>,
    /// Explicit API key (highest priority).
    pub api_key: Option<String>,
    /// Optional JSON config file (lowest priority).
    pub config_file: Option<PathBuf>,
}

impl CredentialSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ocr_token(mut self, token: impl Into<String>) -> Self {
        self.ocr_token = Some(token.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<Credentials, AdvisorError> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve using `env` as the environment lookup.
    pub fn resolve_with<F>(&self, env: F) -> Result<Credentials, AdvisorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let ocr_token = [env(OCR_TOKEN_ENV), self.ocr_token.clone()]
            .into_iter()
            .fold(None, layer);
        let api_key = [env(API_KEY_ENV), self.api_key.clone()]
            .into_iter()
            .fold(None, layer);

        // The file is only read when something is still missing.
        let file = match self.config_file {
            Some(ref path) if ocr_token.is_none() || api_key.is_none() => {
                ConfigFile::load(path)?.unwrap_or_default()
            }
            Some(ref path) => {
                debug!("Config file {} not needed", path.display());
                ConfigFile::default()
            }
            None => ConfigFile::default(),
        };

        let ocr_token = layer(file.baidu_ocr_token.and_then(non_empty), ocr_token)
            .ok_or_else(missing_ocr_token)?;
        let api_key = layer(file.zhipu_ai_apikey.and_then(non_empty), api_key)
            .ok_or_else(missing_api_key)?;

        Credentials::new(ocr_token, api_key)
    }
}

/// Later non-empty values win.
fn layer(current: Option<String>, next: Option<String>) -> Option<String> {
    match next {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => current,
    }
}

fn non_empty(v: String) -> Option<String> {
    (!v.trim().is_empty()).then_some(v)
}

fn missing_ocr_token() -> AdvisorError {
    AdvisorError::MissingCredential {
        name: "Baidu OCR token",
        flag: "--ocr_token",
        env_var: OCR_TOKEN_ENV,
        config_key: "baidu_ocr_token",
    }
}

fn missing_api_key() -> AdvisorError {
    AdvisorError::MissingCredential {
        name: "Zhipu AI API key",
        flag: "--zhipu_api_key",
        env_var: API_KEY_ENV,
        config_key: "zhipu_ai_apikey",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn config_file(json: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(json.as_bytes()).unwrap();
        f
    }

    #[test]
    fn explicit_overrides_env_overrides_file() {
        let file = config_file(r#"{"baidu_ocr_token": "file-ocr", "zhipu_ai_apikey": "file-key"}"#);
        let env = env_of(&[(OCR_TOKEN_ENV, "env-ocr"), (API_KEY_ENV, "env-key")]);

        let only_file = CredentialSources::new().config_file(file.path());
        let creds = only_file.resolve_with(|_| None).unwrap();
        assert_eq!(creds.ocr_token(), "file-ocr");
        assert_eq!(creds.api_key(), "file-key");

        let creds = only_file.resolve_with(&env).unwrap();
        assert_eq!(creds.ocr_token(), "env-ocr");
        assert_eq!(creds.api_key(), "env-key");

        let creds = only_file
            .clone()
            .ocr_token("arg-ocr")
            .resolve_with(&env)
            .unwrap();
        assert_eq!(creds.ocr_token(), "arg-ocr");
        assert_eq!(creds.api_key(), "env-key");
    }

    #[test]
    fn sources_can_be_mixed_per_secret() {
        let file = config_file(r#"{"zhipu_ai_apikey": "file-key"}"#);
        let creds = CredentialSources::new()
            .config_file(file.path())
            .resolve_with(env_of(&[(OCR_TOKEN_ENV, "env-ocr")]))
            .unwrap();
        assert_eq!(creds.ocr_token(), "env-ocr");
        assert_eq!(creds.api_key(), "file-key");
    }

    #[test]
    fn empty_values_do_not_override() {
        let env = env_of(&[(OCR_TOKEN_ENV, "env-ocr"), (API_KEY_ENV, "env-key")]);
        let creds = CredentialSources::new()
            .ocr_token("")
            .api_key("  ")
            .resolve_with(env)
            .unwrap();
        assert_eq!(creds.ocr_token(), "env-ocr");
        assert_eq!(creds.api_key(), "env-key");
    }

    #[test]
    fn missing_everything_is_a_configuration_error() {
        let err = CredentialSources::new().resolve_with(|_| None).unwrap_err();
        assert!(
            matches!(err, AdvisorError::MissingCredential { flag: "--ocr_token", .. }),
            "got: {err:?}"
        );

        let err = CredentialSources::new()
            .ocr_token("tok")
            .resolve_with(|_| None)
            .unwrap_err();
        assert!(
            matches!(err, AdvisorError::MissingCredential { flag: "--zhipu_api_key", .. }),
            "got: {err:?}"
        );
    }

    #[test]
    fn absent_config_file_is_ignored() {
        let creds = CredentialSources::new()
            .config_file("/definitely/not/here/config.json")
            .ocr_token("tok")
            .api_key("key")
            .resolve_with(|_| None)
            .unwrap();
        assert_eq!(creds.ocr_token(), "tok");
    }

    #[test]
    fn malformed_config_file_is_reported_when_needed() {
        let file = config_file("not json at all");
        let err = CredentialSources::new()
            .config_file(file.path())
            .ocr_token("tok")
            .resolve_with(|_| None)
            .unwrap_err();
        assert!(matches!(err, AdvisorError::InvalidConfigFile { .. }));
    }

    #[test]
    fn malformed_config_file_is_skipped_when_flags_and_env_cover_both() {
        let file = config_file("{ not json");
        let creds = CredentialSources::new()
            .config_file(file.path())
            .ocr_token("tok")
            .resolve_with(env_of(&[(API_KEY_ENV, "env-key")]))
            .unwrap();
        assert_eq!(creds.ocr_token(), "tok");
        assert_eq!(creds.api_key(), "env-key");
    }

    #[test]
    fn debug_redacts_secrets() {
        let creds = Credentials::new("secret-token", "secret-key").unwrap();
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("secret"), "got: {dbg}");
    }
}
