//! Pieces shared by the `nutrition-advisor` and `nutrition-advisor-web`
//! binaries: credential flags, logging setup and exit codes.

use crate::credentials::{CredentialSources, DEFAULT_CONFIG_FILE};
use crate::error::{AdvisorError, ErrorCategory};
use clap::Args;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Credential flags.
///
/// Flag names keep their underscore spelling (`--ocr_token`) so existing
/// scripts keep working. The environment is consulted during resolution,
/// not by clap, so the config file can sit below it in priority.
#[derive(Args, Debug, Clone)]
pub struct CredentialArgs {
    /// Token for the Baidu OCR service. Falls back to BAIDU_OCR_TOKEN.
    #[arg(long = "ocr_token", value_name = "TOKEN")]
    pub ocr_token: Option<String>,

    /// API key for Zhipu AI GLM-4. Falls back to ZHIPU_API_KEY.
    #[arg(long = "zhipu_api_key", value_name = "KEY")]
    pub zhipu_api_key: Option<String>,

    /// JSON config file with `baidu_ocr_token` / `zhipu_ai_apikey`. Ignored if absent.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

impl CredentialArgs {
    pub fn sources(&self) -> CredentialSources {
        CredentialSources {
            ocr_token: self.ocr_token.clone(),
            api_key: self.zhipu_api_key.clone(),
            config_file: Some(self.config.clone()),
        }
    }
}

/// Install a stderr `tracing` subscriber. `RUST_LOG` wins when set.
pub fn init_tracing(verbose: bool, quiet: bool, default_level: &str) {
    let filter = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        default_level
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();
}

/// Process exit status for an error chain.
///
/// Configuration 2, input 3, remote service 4, output 5, anything else 1.
pub fn exit_status(err: &anyhow::Error) -> u8 {
    let category = err
        .chain()
        .find_map(|e| e.downcast_ref::<AdvisorError>())
        .map(AdvisorError::category);

    match category {
        Some(ErrorCategory::Configuration) => 2,
        Some(ErrorCategory::Input) => 3,
        Some(ErrorCategory::Remote) => 4,
        Some(ErrorCategory::Output) => 5,
        Some(ErrorCategory::Internal) | None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        credentials: CredentialArgs,
    }

    #[test]
    fn underscore_flags_parse() {
        let cli = TestCli::parse_from(["test", "--ocr_token", "tok", "--zhipu_api_key", "key"]);
        let sources = cli.credentials.sources();
        assert_eq!(sources.ocr_token.as_deref(), Some("tok"));
        assert_eq!(sources.api_key.as_deref(), Some("key"));
        assert_eq!(sources.config_file, Some(PathBuf::from("config.json")));
    }

    #[test]
    fn exit_status_follows_category_through_context() {
        let err = Err::<(), _>(AdvisorError::EmptyImage)
            .context("Failed to load image")
            .unwrap_err();
        assert_eq!(exit_status(&err), 3);

        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_status(&err), 1);
    }
}
