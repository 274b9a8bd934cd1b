//! Local stand-ins for the Baidu OCR and Zhipu chat endpoints.
//!
//! Each mock counts its calls and keeps the last request it saw, so tests
//! can assert both on what the library sent and on whether it sent anything.

#![allow(dead_code)]

use axum::extract::{Form, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use nutrition_advisor::{AdvisorConfig, Credentials, NutritionAdvisor};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const OCR_TOKEN: &str = "test-ocr-token";
pub const API_KEY: &str = "test-api-key";

/// What a mock endpoint answers with.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl MockReply {
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A table-OCR reply whose first table body holds `cells`.
pub fn ocr_table(cells: &[&str]) -> MockReply {
    let body: Vec<serde_json::Value> = cells
        .iter()
        .enumerate()
        .map(|(i, words)| serde_json::json!({"row_start": i, "col_start": 0, "words": words}))
        .collect();
    MockReply::json(serde_json::json!({
        "log_id": 1_234_567_890u64,
        "table_num": 1,
        "tables_result": [{"header": [], "body": body, "footer": []}]
    }))
}

/// A chat-completion reply carrying `content`.
pub fn chat_reply(content: &str) -> MockReply {
    MockReply::json(serde_json::json!({
        "id": "8311",
        "model": "glm-4",
        "choices": [{"index": 0, "finish_reason": "stop",
                     "message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 420, "completion_tokens": 310, "total_tokens": 730}
    }))
}

/// A captured OCR request.
#[derive(Debug, Clone)]
pub struct OcrRequest {
    pub query: HashMap<String, String>,
    pub form: HashMap<String, String>,
}

/// A captured chat request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub authorization: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct Shared {
    ocr_reply: MockReply,
    chat_reply: MockReply,
    ocr_calls: Arc<AtomicUsize>,
    chat_calls: Arc<AtomicUsize>,
    last_ocr: Arc<Mutex<Option<OcrRequest>>>,
    last_chat: Arc<Mutex<Option<ChatRequest>>>,
}

/// Handle to a running mock server.
pub struct MockServices {
    pub base_url: String,
    shared: Shared,
}

impl MockServices {
    pub async fn start(ocr_reply: MockReply, chat_reply: MockReply) -> Self {
        let shared = Shared {
            ocr_reply,
            chat_reply,
            ocr_calls: Arc::new(AtomicUsize::new(0)),
            chat_calls: Arc::new(AtomicUsize::new(0)),
            last_ocr: Arc::new(Mutex::new(None)),
            last_chat: Arc::new(Mutex::new(None)),
        };

        let app = Router::new()
            .route("/ocr", post(ocr))
            .route("/chat", post(chat))
            .with_state(shared.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            shared,
        }
    }

    pub fn ocr_url(&self) -> String {
        format!("{}/ocr", self.base_url)
    }

    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.base_url)
    }

    pub fn ocr_calls(&self) -> usize {
        self.shared.ocr_calls.load(Ordering::SeqCst)
    }

    pub fn chat_calls(&self) -> usize {
        self.shared.chat_calls.load(Ordering::SeqCst)
    }

    pub fn last_ocr(&self) -> OcrRequest {
        self.shared.last_ocr.lock().unwrap().clone().expect("no OCR request seen")
    }

    pub fn last_chat(&self) -> ChatRequest {
        self.shared.last_chat.lock().unwrap().clone().expect("no chat request seen")
    }

    /// Config pointing at this mock, with test credentials.
    pub fn config(&self) -> nutrition_advisor::AdvisorConfigBuilder {
        AdvisorConfig::builder(Credentials::new(OCR_TOKEN, API_KEY).unwrap())
            .ocr_endpoint(self.ocr_url())
            .chat_endpoint(self.chat_url())
            .request_timeout_secs(5)
    }

    pub fn advisor(&self) -> NutritionAdvisor {
        NutritionAdvisor::new(self.config().build().unwrap()).unwrap()
    }
}

async fn ocr(
    State(s): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    s.ocr_calls.fetch_add(1, Ordering::SeqCst);
    *s.last_ocr.lock().unwrap() = Some(OcrRequest { query, form });
    reply(&s.ocr_reply).await
}

async fn chat(State(s): State<Shared>, headers: HeaderMap, Json(body): Json<serde_json::Value>) -> Response {
    s.chat_calls.fetch_add(1, Ordering::SeqCst);
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *s.last_chat.lock().unwrap() = Some(ChatRequest { authorization, body });
    reply(&s.chat_reply).await
}

async fn reply(r: &MockReply) -> Response {
    if !r.delay.is_zero() {
        tokio::time::sleep(r.delay).await;
    }
    let status = StatusCode::from_u16(r.status).unwrap();
    (status, [(header::CONTENT_TYPE, "application/json")], r.body.clone()).into_response()
}

/// A tiny PNG, usable wherever real image bytes are needed.
pub fn png_label() -> Vec<u8> {
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([250, 250, 250])));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), ImageFormat::Png).unwrap();
    buf
}
