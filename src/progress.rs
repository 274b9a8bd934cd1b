//! Progress-callback trait for per-stage pipeline events.
//!
//! Inject an [`Arc<dyn AdviceProgressCallback>`] via
//! [`crate::config::AdvisorConfigBuilder::progress_callback`] to be told when
//! each stage starts, finishes, or fails. The CLI drives its spinner from
//! these events; library users can forward them to logs or a UI.
//!
//! # Example
//!
//! ```rust
//! use nutrition_advisor::{AdviceProgressCallback, Stage};
//! use std::sync::{Arc, Mutex};
//! use std::time::Duration;
//!
//! #[derive(Default)]
//! struct Recorder(Mutex<Vec<Stage>>);
//!
//! impl AdviceProgressCallback for Recorder {
//!     fn on_stage_complete(&self, stage: Stage, _elapsed: Duration) {
//!         self.0.lock().unwrap().push(stage);
//!     }
//! }
//!
//! let recorder = Arc::new(Recorder::default());
//! recorder.on_stage_complete(Stage::RecognizeText, Duration::from_millis(5));
//! assert_eq!(recorder.0.lock().unwrap().as_slice(), &[Stage::RecognizeText]);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// One step of the advice pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reading and validating the image.
    LoadImage,
    /// Calling the table-OCR service.
    RecognizeText,
    /// Calling the chat-completion service.
    AnalyzeNutrition,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::LoadImage => f.write_str("Loading image"),
            Stage::RecognizeText => f.write_str("Recognizing label text"),
            Stage::AnalyzeNutrition => f.write_str("Analyzing nutrition"),
        }
    }
}

/// Called by the pipeline as it moves through each [`Stage`].
///
/// All methods default to no-ops. Implementations must be `Send + Sync`
/// because the web front-end shares one advisor across requests.
pub trait AdviceProgressCallback: Send + Sync {
    /// A stage is about to run.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// A stage finished successfully.
    fn on_stage_complete(&self, stage: Stage, elapsed: Duration) {
        let _ = (stage, elapsed);
    }

    /// A stage failed; the pipeline stops after this call.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// Shared handle stored in [`crate::config::AdvisorConfig`].
pub type ProgressCallback = Arc<dyn AdviceProgressCallback>;

/// Callback that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressCallback;

impl AdviceProgressCallback for NoopProgressCallback {}
