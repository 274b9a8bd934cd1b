//! Table OCR: send the label photo to Baidu and flatten the recognised table.
//!
//! ## Wire format
//!
//! ```text
//! POST {endpoint}?access_token={token}
//! Content-Type: application/x-www-form-urlencoded
//!
//! image={base64}
//! ```
//!
//! The response carries `tables_result[*].body[*].words`. Only the first
//! table's body is used; its cells are concatenated in service order with no
//! separator, so row and column structure is lost on purpose. The LLM reads
//! the flattened text well enough and it keeps the prompt short.
//!
//! Baidu reports API-level failures with HTTP 200 and an `error_code` field,
//! so the body has to be inspected before the table is looked up.

use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Service};
use crate::pipeline::encode::to_base64;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Baidu table-recognition endpoint.
pub const RECOGNIZE_BASE_URL: &str = "https://aip.baidubce.com/rest/2.0/ocr/v1/table";

#[derive(Debug, Deserialize)]
struct TableResponse {
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    error_msg: Option<String>,
    #[serde(default)]
    tables_result: Option<Vec<Table>>,
}

#[derive(Debug, Deserialize)]
struct Table {
    #[serde(default)]
    body: Option<Vec<Cell>>,
}

#[derive(Debug, Deserialize)]
struct Cell {
    #[serde(default)]
    words: String,
}

/// Recognise the nutrition table in `image` and return its text.
pub async fn recognize_text(
    client: &reqwest::Client,
    config: &AdvisorConfig,
    image: &[u8],
) -> Result<String, AdvisorError> {
    if image.is_empty() {
        return Err(AdvisorError::EmptyImage);
    }

    let start = Instant::now();
    let form = [("image", to_base64(image))];

    let response = client
        .post(&config.ocr_endpoint)
        .query(&[("access_token", config.credentials.ocr_token())])
        .form(&form)
        .send()
        .await
        .map_err(|e| transport_error(e, config.request_timeout_secs))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| transport_error(e, config.request_timeout_secs))?;

    if !status.is_success() {
        return Err(AdvisorError::HttpStatus {
            service: Service::Ocr,
            status: status.as_u16(),
            detail: truncate(&body, 200),
        });
    }

    let text = parse_table_response(&body)?;
    info!(
        "OCR recognised {} chars in {}ms",
        text.chars().count(),
        start.elapsed().as_millis()
    );
    if text.is_empty() {
        warn!("OCR found a table but no text in it");
    }
    Ok(text)
}

/// Extract and flatten the first table body from a raw OCR response.
pub fn parse_table_response(body: &str) -> Result<String, AdvisorError> {
    let parsed: TableResponse =
        serde_json::from_str(body).map_err(|e| AdvisorError::MalformedResponse {
            service: Service::Ocr,
            detail: format!("{e}: {}", truncate(body, 200)),
        })?;

    if let Some(code) = parsed.error_code {
        let message = parsed.error_msg.unwrap_or_default();
        return Err(api_error(code, message));
    }

    let table = parsed
        .tables_result
        .and_then(|tables| tables.into_iter().next())
        .ok_or(AdvisorError::NoTableDetected)?;

    let cells = table.body.ok_or_else(|| AdvisorError::MalformedResponse {
        service: Service::Ocr,
        detail: "table has no `body`".into(),
    })?;
    debug!("OCR table body has {} cells", cells.len());

    Ok(flatten_cells(cells.iter().map(|c| c.words.as_str())))
}

/// Concatenate cell texts with no separator and trim the result.
pub fn flatten_cells<'a>(cells: impl IntoIterator<Item = &'a str>) -> String {
    cells.into_iter().collect::<String>().trim().to_string()
}

/// Map a Baidu `error_code` onto the error taxonomy.
///
/// 110/111: access token invalid or expired.
/// 17/18/19: daily quota, QPS limit, total quota.
fn api_error(code: i64, message: String) -> AdvisorError {
    match code {
        110 | 111 => AdvisorError::AuthError {
            service: Service::Ocr,
            detail: message,
        },
        17 | 18 | 19 => AdvisorError::RateLimitExceeded {
            service: Service::Ocr,
            detail: message,
        },
        _ => AdvisorError::ApiError {
            service: Service::Ocr,
            code,
            message,
        },
    }
}

fn transport_error(e: reqwest::Error, timeout_secs: u64) -> AdvisorError {
    if e.is_timeout() {
        AdvisorError::Timeout {
            service: Service::Ocr,
            secs: timeout_secs,
        }
    } else {
        AdvisorError::RequestFailed {
            service: Service::Ocr,
            detail: e.to_string(),
        }
    }
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}\u{2026}", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenates_cells_without_separator() {
        let body = r#"{"log_id": 1, "table_num": 1, "tables_result": [
            {"header": [], "body": [{"words": "A", "row_start": 0}, {"words": "B", "row_start": 0}]}
        ]}"#;
        assert_eq!(parse_table_response(body).unwrap(), "AB");
    }

    #[test]
    fn trims_surrounding_whitespace_only() {
        assert_eq!(flatten_cells([" 能量", "100kJ ", "\n"]), "能量100kJ");
    }

    #[test]
    fn uses_only_the_first_table() {
        let body = r#"{"tables_result": [
            {"body": [{"words": "first"}]},
            {"body": [{"words": "second"}]}
        ]}"#;
        assert_eq!(parse_table_response(body).unwrap(), "first");
    }

    #[test]
    fn zero_tables_is_reported() {
        let err = parse_table_response(r#"{"table_num": 0, "tables_result": []}"#).unwrap_err();
        assert!(matches!(err, AdvisorError::NoTableDetected));

        let err = parse_table_response(r#"{"log_id": 7}"#).unwrap_err();
        assert!(matches!(err, AdvisorError::NoTableDetected));
    }

    #[test]
    fn table_without_body_is_malformed() {
        let err = parse_table_response(r#"{"tables_result": [{"header": []}]}"#).unwrap_err();
        assert!(matches!(err, AdvisorError::MalformedResponse { service: Service::Ocr, .. }));
    }

    #[test]
    fn non_json_is_malformed() {
        let err = parse_table_response("<html>gateway</html>").unwrap_err();
        assert!(matches!(err, AdvisorError::MalformedResponse { .. }));
    }

    #[test]
    fn error_codes_are_classified() {
        let err = parse_table_response(
            r#"{"error_code": 110, "error_msg": "Access token invalid or no longer valid"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AdvisorError::AuthError { service: Service::Ocr, .. }));

        let err = parse_table_response(r#"{"error_code": 18, "error_msg": "Open api qps request limit reached"}"#)
            .unwrap_err();
        assert!(matches!(err, AdvisorError::RateLimitExceeded { .. }));

        let err = parse_table_response(r#"{"error_code": 216201, "error_msg": "image format error"}"#)
            .unwrap_err();
        assert!(
            matches!(err, AdvisorError::ApiError { code: 216201, .. }),
            "got: {err:?}"
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("营养成分表", 2), "营养\u{2026}");
        assert_eq!(truncate("short", 10), "short");
    }
}
