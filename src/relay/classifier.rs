use serde_json::{json, Value};

use crate::error::RelayError;

/// Substrings Apps Script errors carry when the target sheet is missing or unwritable.
const SHEET_FAILURE_SIGNATURES: &[&str] = &["appendRow", "null", "Cannot read"];

/// True when an upstream body looks like an HTML document rather than data.
pub fn contains_markup(body: &str) -> bool {
    body.contains("<!DOCTYPE") || body.contains("<html")
}

/// Map a non-2xx destination response to the client-facing error.
/// 429 is the only status mirrored back to the browser.
pub fn classify_error_status(status: u16, body: &str) -> RelayError {
    if status == 429 {
        RelayError::RateLimited
    } else if contains_markup(body) {
        RelayError::HtmlErrorPage
    } else {
        RelayError::UpstreamStatus(status)
    }
}

/// Interpret a 2xx destination body. Success is assumed unless the body is an
/// HTML page or JSON that carries an explicit `error`.
pub fn interpret_success_body(text: &str) -> Result<Value, RelayError> {
    if text.is_empty() {
        return Ok(json!({ "ok": true }));
    }

    let data: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) if contains_markup(text) => return Err(RelayError::HtmlInsteadOfJson),
        Err(_) => return Ok(json!({ "ok": true })),
    };

    if data.is_null() {
        return Ok(json!({ "ok": true }));
    }

    match script_error(&data) {
        Some(err) => Err(classify_script_error(&err)),
        None => Ok(data),
    }
}

/// Apps Script `{ "error": ... }` payloads. Sheet failures get setup guidance,
/// anything else is passed through.
pub fn classify_script_error(err: &str) -> RelayError {
    if SHEET_FAILURE_SIGNATURES.iter().any(|sig| err.contains(sig)) {
        RelayError::SheetConfig
    } else {
        RelayError::Script(err.to_string())
    }
}

/// The `error` field as text when it is present and truthy.
/// `null`, `false`, `0` and `""` do not count as errors.
fn script_error(data: &Value) -> Option<String> {
    match data.get("error")? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        other => Some(other.to_string()),
    }
}
