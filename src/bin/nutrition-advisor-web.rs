//! Web form binary for nutrition-advisor.
//!
//! Serves one page with an image upload and a Markdown result area, backed
//! by the same pipeline as the CLI.

use anyhow::{Context, Result};
use clap::Parser;
use nutrition_advisor::cli::{exit_status, init_tracing, CredentialArgs};
use nutrition_advisor::{web, AdvisorConfig, NutritionAdvisor};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tracing::info;

const AFTER_HELP: &str = r#"EXAMPLES:
  nutrition-advisor-web --ocr_token <BAIDU OCR TOKEN> --zhipu_api_key <ZHIPU AI API KEY>

  # Offer an example label on the page, listen on a random port
  nutrition-advisor-web --example test.png --port 0

You can also set the environment variables BAIDU_OCR_TOKEN and ZHIPU_API_KEY
instead of passing them as arguments.
"#;

/// Nutrition Advisor web demo.
#[derive(Parser, Debug)]
#[command(
    name = "nutrition-advisor-web",
    version,
    about = "Nutrition Advisor web demo",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    credentials: CredentialArgs,

    /// Address to bind.
    #[arg(long, env = "NUTRITION_ADVISOR_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind; 0 lets the OS pick one.
    #[arg(long, env = "NUTRITION_ADVISOR_PORT", default_value_t = 7860)]
    port: u16,

    /// Example label image offered on the page.
    #[arg(long, value_name = "PATH")]
    example: Option<PathBuf>,

    /// Chat model ID.
    #[arg(long, env = "NUTRITION_ADVISOR_MODEL", default_value = "glm-4")]
    model: String,

    /// Per-request timeout in seconds for each remote call.
    #[arg(long, env = "NUTRITION_ADVISOR_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, false, "info");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let credentials = cli
        .credentials
        .sources()
        .resolve()
        .context("Please provide OCR token and Zhipu API key")?;

    let config = AdvisorConfig::builder(credentials)
        .model(cli.model.as_str())
        .request_timeout_secs(cli.timeout)
        .build()
        .context("Invalid configuration")?;
    let advisor = NutritionAdvisor::new(config)?;

    let example = match cli.example {
        Some(ref path) => Some(
            tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read example image {}", path.display()))?,
        ),
        None => None,
    };

    let listener = TcpListener::bind((cli.host.as_str(), cli.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", cli.host, cli.port))?;
    let addr = listener.local_addr().context("Listener has no local address")?;
    eprintln!("Running on local URL:  http://{addr}");
    info!("Example image: {}", example.is_some());

    web::serve(listener, web::router(advisor, example))
        .await
        .context("Web server stopped")?;
    Ok(())
}
