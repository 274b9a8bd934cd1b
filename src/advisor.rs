//! The orchestrator: image → OCR text → Markdown advice.
//!
//! [`NutritionAdvisor`] owns its configuration and one `reqwest::Client`
//! (built with the configured timeout). It holds no other state, so one
//! instance can be shared behind an `Arc` by concurrent web requests.

use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::pipeline::input::{self, ImageSource};
use crate::pipeline::{analyze, ocr};
use crate::progress::Stage;
use std::future::Future;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

/// Nutrition-label advisor.
///
/// # Example
/// ```rust,no_run
/// use nutrition_advisor::{AdvisorConfig, CredentialSources, ImageSource, NutritionAdvisor};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = CredentialSources::new().resolve()?;
/// let advisor = NutritionAdvisor::new(AdvisorConfig::builder(credentials).build()?)?;
/// let markdown = advisor.give_advice(ImageSource::FromPath("label.jpg".into())).await?;
/// println!("{markdown}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NutritionAdvisor {
    config: AdvisorConfig,
    client: reqwest::Client,
}

impl NutritionAdvisor {
    /// Create an advisor. No network activity happens here.
    pub fn new(config: AdvisorConfig) -> Result<Self, AdvisorError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AdvisorError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Read and validate the image without calling any service.
    pub async fn load_image(&self, source: ImageSource) -> Result<Vec<u8>, AdvisorError> {
        self.stage(Stage::LoadImage, input::load_image(source)).await
    }

    /// Run table OCR on already-loaded image bytes.
    pub async fn recognize_text(&self, image: &[u8]) -> Result<String, AdvisorError> {
        self.stage(
            Stage::RecognizeText,
            ocr::recognize_text(&self.client, &self.config, image),
        )
        .await
    }

    /// Ask the chat model to assess the recognised label text.
    pub async fn analyze_nutrition(&self, nutrition_text: &str) -> Result<String, AdvisorError> {
        self.stage(
            Stage::AnalyzeNutrition,
            analyze::analyze_nutrition(&self.client, &self.config, nutrition_text),
        )
        .await
    }

    /// Load → recognise → analyse. Returns the model's Markdown untouched.
    pub async fn give_advice(&self, source: ImageSource) -> Result<String, AdvisorError> {
        let start = Instant::now();
        let image = self.load_image(source).await?;
        let text = self.recognize_text(&image).await?;
        let advice = self.analyze_nutrition(&text).await?;
        info!("Advice ready in {}ms", start.elapsed().as_millis());
        Ok(advice)
    }

    /// Run [`give_advice`](Self::give_advice) and write the result to `output_path`.
    pub async fn give_advice_to_file(
        &self,
        source: ImageSource,
        output_path: impl AsRef<Path>,
    ) -> Result<(), AdvisorError> {
        let advice = self.give_advice(source).await?;
        write_output(output_path.as_ref(), &advice).await
    }

    /// Synchronous wrapper around [`give_advice`](Self::give_advice).
    ///
    /// Creates a temporary tokio runtime internally; do not call from inside
    /// an async context.
    pub fn give_advice_sync(&self, source: ImageSource) -> Result<String, AdvisorError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| AdvisorError::Internal(format!("Failed to create tokio runtime: {e}")))?
            .block_on(self.give_advice(source))
    }

    /// Run one stage, reporting start/complete/error to the progress callback.
    async fn stage<T, F>(&self, stage: Stage, fut: F) -> Result<T, AdvisorError>
    where
        F: Future<Output = Result<T, AdvisorError>>,
    {
        let cb = self.config.progress_callback.as_ref();
        if let Some(cb) = cb {
            cb.on_stage_start(stage);
        }
        let start = Instant::now();
        let result = fut.await;
        if let Some(cb) = cb {
            match &result {
                Ok(_) => cb.on_stage_complete(stage, start.elapsed()),
                Err(e) => cb.on_stage_error(stage, &e.to_string()),
            }
        }
        result
    }
}

/// Write `markdown` to `path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn write_output(path: &Path, markdown: &str) -> Result<(), AdvisorError> {
    let fail = |source| AdvisorError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, markdown).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Credentials;
    use crate::progress::AdviceProgressCallback;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl AdviceProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.0.lock().unwrap().push(format!("start {stage:?}"));
        }
        fn on_stage_error(&self, stage: Stage, _error: &str) {
            self.0.lock().unwrap().push(format!("error {stage:?}"));
        }
    }

    fn advisor(cb: Arc<Recorder>) -> NutritionAdvisor {
        let config = AdvisorConfig::builder(Credentials::new("tok", "key").unwrap())
            // Unroutable: any accidental request fails fast instead of leaving the machine.
            .ocr_endpoint("http://127.0.0.1:9/ocr")
            .chat_endpoint("http://127.0.0.1:9/chat")
            .progress_callback(cb)
            .build()
            .unwrap();
        NutritionAdvisor::new(config).unwrap()
    }

    #[tokio::test]
    async fn empty_image_stops_before_ocr() {
        let recorder = Arc::new(Recorder::default());
        let err = advisor(recorder.clone())
            .give_advice(ImageSource::FromBytes(Vec::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::EmptyImage));
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["start LoadImage".to_string(), "error LoadImage".to_string()]
        );
    }

    #[test]
    fn sync_wrapper_reports_input_errors() {
        let recorder = Arc::new(Recorder::default());
        let result = advisor(recorder).give_advice_sync(ImageSource::FromPath("/no/such/label.png".into()));
        let err = tokio_test::assert_err!(result);
        assert!(matches!(err, AdvisorError::ImageNotFound { .. }));
    }

    #[tokio::test]
    async fn write_output_creates_parents_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/advice.md");
        write_output(&path, "# 建议\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# 建议\n");
        assert!(!dir.path().join("reports/advice.md.tmp").exists());
    }
}
