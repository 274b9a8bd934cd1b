//! CLI binary for nutrition-advisor.
//!
//! A thin shim over the library crate: resolve credentials, run OCR and the
//! analysis on one image, print or save the Markdown.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use nutrition_advisor::cli::{exit_status, init_tracing, CredentialArgs};
use nutrition_advisor::{
    write_output, AdviceProgressCallback, AdvisorConfig, ImageSource, NutritionAdvisor,
    ProgressCallback, Stage,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── Spinner driven by stage events ───────────────────────────────────────────

struct SpinnerCallback {
    bar: ProgressBar,
    /// Last stage this run executes; the bar is cleared once it completes.
    last: Stage,
}

impl SpinnerCallback {
    fn new(last: Stage) -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar, last })
    }
}

impl AdviceProgressCallback for SpinnerCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed: Duration) {
        self.bar.println(format!(
            "  {} {:<24} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.1}s", elapsed.as_secs_f64())),
        ));
        if stage == self.last {
            self.bar.finish_and_clear();
        }
    }

    fn on_stage_error(&self, stage: Stage, _error: &str) {
        self.bar.println(format!("  {} {}", red("✗"), stage));
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print advice to the console
  nutrition-advisor --ocr_token <BAIDU OCR TOKEN> --zhipu_api_key <ZHIPU AI API KEY> --img_path label.png

  # Save advice to a file
  nutrition-advisor --img_path label.png -o advice.md

  # Only show what the OCR service read
  nutrition-advisor --img_path label.png --ocr-only

CREDENTIALS (later sources win):
  1. config.json        {"baidu_ocr_token": "...", "zhipu_ai_apikey": "..."}
  2. BAIDU_OCR_TOKEN, ZHIPU_API_KEY environment variables
  3. --ocr_token, --zhipu_api_key flags

EXIT CODES:
  0 success   2 configuration   3 bad image   4 remote service   5 output   1 other

Note: if --output is not specified, the result is printed to the console.
"#;

/// Nutrition advice from a photo of a nutrition facts table.
#[derive(Parser, Debug)]
#[command(
    name = "nutrition-advisor",
    version,
    about = "Nutrition Advisor",
    long_about = "Reads a nutrition facts table with Baidu table OCR and asks Zhipu AI GLM-4 \
for per-100g values, low-sugar / high-protein / low-fat classification and fitness advice, \
formatted as Markdown.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    credentials: CredentialArgs,

    /// Path to the image file to be processed.
    #[arg(long = "img_path", value_name = "PATH", default_value = "test.png")]
    img_path: PathBuf,

    /// Output path for the result. Printed to the console if not specified.
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Chat model ID.
    #[arg(long, env = "NUTRITION_ADVISOR_MODEL", default_value = "glm-4")]
    model: String,

    /// Per-request timeout in seconds for each remote call.
    #[arg(long, env = "NUTRITION_ADVISOR_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Print the recognised label text and skip the analysis.
    #[arg(long)]
    ocr_only: bool,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // The spinner gives all the feedback that matters; keep INFO logs out of its way.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.verbose;
    init_tracing(cli.verbose, cli.quiet || show_progress, "info");

    match run(cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", red("error:"));
            ExitCode::from(exit_status(&e))
        }
    }
}

async fn run(cli: Cli, show_progress: bool) -> Result<()> {
    // ── Credentials first: nothing touches the network without them ──────
    let credentials = cli
        .credentials
        .sources()
        .resolve()
        .context("Please provide OCR token and Zhipu API key")?;

    let mut builder = AdvisorConfig::builder(credentials)
        .model(cli.model.as_str())
        .request_timeout_secs(cli.timeout);
    if show_progress {
        let last = if cli.ocr_only {
            Stage::RecognizeText
        } else {
            Stage::AnalyzeNutrition
        };
        builder = builder.progress_callback(SpinnerCallback::new(last) as ProgressCallback);
    }
    let config = builder.build().context("Invalid configuration")?;
    let advisor = NutritionAdvisor::new(config)?;

    // ── Stages run one by one so --ocr-only can stop halfway ─────────────
    let image = advisor
        .load_image(ImageSource::FromPath(cli.img_path.clone()))
        .await
        .with_context(|| format!("Failed to load {}", cli.img_path.display()))?;

    let text = advisor
        .recognize_text(&image)
        .await
        .context("Text recognition failed")?;

    let result = if cli.ocr_only {
        text
    } else {
        advisor
            .analyze_nutrition(&text)
            .await
            .context("Nutrition analysis failed")?
    };

    // ── Output ───────────────────────────────────────────────────────────
    match cli.output {
        Some(ref path) => {
            write_output(path, &result).await?;
            if !cli.quiet {
                eprintln!("{}  →  {}", green("✔"), path.display());
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(result.as_bytes())
                .context("Failed to write to stdout")?;
            if !result.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }

    Ok(())
}
