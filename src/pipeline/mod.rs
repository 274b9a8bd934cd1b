//! Pipeline stages for turning a label photo into nutrition advice.
//!
//! Each submodule implements one step; the front-ends may run them one by one.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ ocr ──▶ analyze
//! (path/bytes) (Baidu)  (GLM-4)
//!    ▲
//! encode (web uploads: pixels → JPEG)
//! ```
//!
//! 1. [`input`]     read and validate the image bytes
//! 2. [`encode`]    JPEG re-encoding for uploads, base64 for the OCR form
//! 3. [`ocr`]       table OCR call and cell flattening
//! 4. [`analyze`]   scripted chat completion; returns Markdown

pub mod analyze;
pub mod encode;
pub mod input;
pub mod ocr;
