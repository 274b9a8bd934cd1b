//! Single-page web form over the advisor.
//!
//! ```text
//! GET  /                    upload form + Markdown output area
//! POST /api/advice          multipart field `image` → {markdown, html}
//! GET  /example             the configured example image (404 if none)
//! POST /api/advice/example  run the pipeline on the example image
//! ```
//!
//! Uploads are decoded and re-encoded as JPEG before they reach the
//! orchestrator. Requests share one [`NutritionAdvisor`] and nothing else.

use crate::advisor::NutritionAdvisor;
use crate::error::{AdvisorError, ErrorCategory};
use crate::pipeline::encode::normalize_upload;
use crate::pipeline::input::ImageSource;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Form field carrying the image.
pub const IMAGE_FIELD: &str = "image";

#[derive(Clone)]
struct AppState {
    advisor: Arc<NutritionAdvisor>,
    example: Option<Arc<Vec<u8>>>,
}

/// Successful response body.
#[derive(Debug, Serialize)]
pub struct AdviceResponse {
    pub markdown: String,
    pub html: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    category: ErrorCategory,
}

/// [`AdvisorError`] rendered as a JSON HTTP response.
struct ApiError(AdvisorError);

impl From<AdvisorError> for ApiError {
    fn from(e: AdvisorError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let category = self.0.category();
        let status = match category {
            ErrorCategory::Input => StatusCode::BAD_REQUEST,
            ErrorCategory::Remote => StatusCode::BAD_GATEWAY,
            ErrorCategory::Configuration | ErrorCategory::Output | ErrorCategory::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        warn!("Request failed ({status}): {}", self.0);
        let body = ErrorResponse {
            error: self.0.to_string(),
            category,
        };
        (status, Json(body)).into_response()
    }
}

/// Build the router. `example` is an optional image offered on the page.
pub fn router(advisor: NutritionAdvisor, example: Option<Vec<u8>>) -> Router {
    let state = AppState {
        advisor: Arc::new(advisor),
        example: example.map(Arc::new),
    };

    Router::new()
        .route("/", get(index))
        .route("/example", get(example_image))
        .route("/api/advice", post(advise_upload))
        .route("/api/advice/example", post(advise_example))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Serve `app` on an already-bound listener until the process stops.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{addr}");
    }
    axum::serve(listener, app).await
}

/// Render Markdown as HTML, escaping any raw HTML the model produced.
///
/// Link and image targets with a scheme other than http, https or mailto
/// are blanked.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) => Event::Text(raw),
        Event::Start(tag) => Event::Start(safe_tag(tag)),
        Event::End(tag) => Event::End(safe_tag(tag)),
        other => other,
    });

    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn safe_tag(tag: Tag<'_>) -> Tag<'_> {
    match tag {
        Tag::Link(kind, dest, title) => Tag::Link(kind, safe_url(dest), title),
        Tag::Image(kind, dest, title) => Tag::Image(kind, safe_url(dest), title),
        other => other,
    }
}

fn safe_url(dest: CowStr<'_>) -> CowStr<'_> {
    if is_allowed_url(&dest) {
        dest
    } else {
        debug!("Blanked link target with disallowed scheme");
        CowStr::Borrowed("")
    }
}

/// Relative URLs and http, https, mailto pass.
fn is_allowed_url(url: &str) -> bool {
    // Browsers ignore whitespace and control characters inside a scheme.
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    let scheme = match cleaned.find([':', '/', '?', '#']) {
        Some(idx) if cleaned[idx..].starts_with(':') => &cleaned[..idx],
        _ => return true,
    };
    ["http", "https", "mailto"]
        .iter()
        .any(|allowed| scheme.eq_ignore_ascii_case(allowed))
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let example = if state.example.is_some() {
        EXAMPLE_BUTTON
    } else {
        ""
    };
    Html(INDEX_PAGE.replace("{{example}}", example))
}

async fn example_image(State(state): State<AppState>) -> Response {
    match state.example {
        Some(bytes) => {
            let mime = match image::guess_format(&bytes) {
                Ok(image::ImageFormat::Png) => "image/png",
                _ => "image/jpeg",
            };
            ([(header::CONTENT_TYPE, mime)], bytes.to_vec()).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn advise_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AdviceResponse>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        if field.name() == Some(IMAGE_FIELD) {
            upload = Some(field.bytes().await.map_err(bad_upload)?);
            break;
        }
    }

    let bytes = upload.ok_or(AdvisorError::EmptyImage)?;
    if bytes.is_empty() {
        return Err(AdvisorError::EmptyImage.into());
    }
    advise(&state.advisor, &bytes).await
}

async fn advise_example(State(state): State<AppState>) -> Result<Json<AdviceResponse>, ApiError> {
    let bytes = state.example.ok_or(AdvisorError::EmptyImage)?;
    advise(&state.advisor, &bytes).await
}

async fn advise(advisor: &NutritionAdvisor, bytes: &[u8]) -> Result<Json<AdviceResponse>, ApiError> {
    // Decoding a large photo takes seconds; keep it off the async workers.
    let upload = bytes.to_vec();
    let jpeg = tokio::task::spawn_blocking(move || normalize_upload(&upload))
        .await
        .map_err(|e| AdvisorError::Internal(format!("Image task panicked: {e}")))??;
    let markdown = advisor.give_advice(ImageSource::FromBytes(jpeg)).await?;
    let html = render_markdown(&markdown);
    Ok(Json(AdviceResponse { markdown, html }))
}

fn bad_upload(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError(AdvisorError::ImageDecodeFailed {
        detail: format!("invalid upload: {e}"),
    })
}

const EXAMPLE_BUTTON: &str = r#"<div class="example">
      <img src="/example" alt="example label">
      <button type="button" id="use-example">Use example</button>
    </div>"#;

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Nutrition Advisor</title>
  <style>
    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; background: #f4f6f8; }
    main { display: flex; gap: 24px; padding: 24px; flex-wrap: wrap; }
    section { background: #fff; border-radius: 8px; padding: 20px; flex: 1 1 380px; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
    h2 { margin-top: 0; font-size: 1em; color: #555; }
    #preview { max-width: 100%; margin-top: 12px; display: none; }
    .example img { max-width: 120px; display: block; margin: 12px 0 6px; }
    button { padding: 8px 18px; border: 0; border-radius: 6px; background: #ff7c00; color: #fff; cursor: pointer; }
    button:disabled { opacity: .5; cursor: wait; }
    #advice table { border-collapse: collapse; }
    #advice td, #advice th { border: 1px solid #ddd; padding: 4px 8px; }
    .error { color: #b00020; white-space: pre-wrap; }
  </style>
</head>
<body>
  <main>
    <section>
      <h2>Nutrition label</h2>
      <form id="form">
        <input type="file" id="image" name="image" accept="image/*" required>
        <img id="preview" alt="">
        <p><button type="submit" id="submit">Submit</button></p>
      </form>
      {{example}}
    </section>
    <section>
      <h2>Advice</h2>
      <div id="advice"></div>
    </section>
  </main>
  <script>
    const advice = document.getElementById('advice');
    const submit = document.getElementById('submit');
    const input = document.getElementById('image');
    const preview = document.getElementById('preview');

    input.addEventListener('change', () => {
      if (input.files[0]) {
        preview.src = URL.createObjectURL(input.files[0]);
        preview.style.display = 'block';
      }
    });

    async function run(url, body) {
      submit.disabled = true;
      advice.textContent = 'Analyzing…';
      try {
        const res = await fetch(url, { method: 'POST', body });
        const data = await res.json();
        if (res.ok) {
          advice.innerHTML = data.html;
        } else {
          advice.innerHTML = '';
          const p = document.createElement('p');
          p.className = 'error';
          p.textContent = data.error;
          advice.appendChild(p);
        }
      } catch (e) {
        advice.textContent = String(e);
      } finally {
        submit.disabled = false;
      }
    }

    document.getElementById('form').addEventListener('submit', (ev) => {
      ev.preventDefault();
      const body = new FormData();
      body.append('image', input.files[0]);
      run('/api/advice', body);
    });

    const example = document.getElementById('use-example');
    if (example) {
      example.addEventListener('click', () => run('/api/advice/example', null));
    }
  </script>
</body>
</html>
"#;
