//! # nutrition-advisor
//!
//! Photograph the nutrition facts table on a food package, get back a
//! Markdown assessment: per-100g values, low-sugar / high-protein / low-fat
//! classification, and fitness advice.
//!
//! The crate does no recognition or reasoning itself. It glues two remote
//! services together:
//!
//! ```text
//! photo
//!  │
//!  ├─ 1. Input    read a path or take bytes; reject empty images
//!  ├─ 2. OCR      Baidu table OCR → cell texts flattened into one string
//!  ├─ 3. Analyze  scripted GLM-4 conversation (Zhipu AI) → Markdown
//!  └─ 4. Output   stdout, a file, or the web form
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nutrition_advisor::{AdvisorConfig, CredentialSources, ImageSource, NutritionAdvisor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // BAIDU_OCR_TOKEN / ZHIPU_API_KEY, optionally from config.json
//!     let credentials = CredentialSources::new().config_file("config.json").resolve()?;
//!     let advisor = NutritionAdvisor::new(AdvisorConfig::builder(credentials).build()?)?;
//!     let advice = advisor.give_advice(ImageSource::FromPath("label.png".into())).await?;
//!     println!("{advice}");
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | `nutrition-advisor` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `web`   | on      | `nutrition-advisor-web` binary and [`web`] module (axum + pulldown-cmark) |
//!
//! Disable both when using only the library:
//! ```toml
//! nutrition-advisor = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod advisor;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
#[cfg(feature = "web")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use advisor::{write_output, NutritionAdvisor};
pub use config::{AdvisorConfig, AdvisorConfigBuilder};
pub use credentials::{ConfigFile, CredentialSources, Credentials};
pub use error::{AdvisorError, ErrorCategory, Service};
pub use pipeline::input::ImageSource;
pub use progress::{AdviceProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
