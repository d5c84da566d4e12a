use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        failure(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
    }
}

/// Every way a waitlist submission can fail, each with the status and message
/// the browser sees.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("missing solanaAddress")]
    MissingAddress,

    #[error("server is not configured. Please set GOOGLE_SCRIPT_URL in .env")]
    NotConfigured,

    #[error("Request timeout. Please check your Google Script URL.")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Too many requests. Please wait a moment and try again.")]
    RateLimited,

    /// Non-success status with an HTML document body.
    #[error("Google Script returned HTML. Please check your deployment URL and ensure it's a Web App URL (ends with /exec).")]
    HtmlErrorPage,

    /// Success status but the body is an HTML document instead of JSON.
    #[error("Google Script returned HTML instead of JSON. Check deployment configuration.")]
    HtmlInsteadOfJson,

    #[error("Google Script error ({0}). Check server logs for details.")]
    UpstreamStatus(u16),

    #[error("Failed to read response from Google Script.")]
    UnreadableBody,

    #[error("Google Sheet configuration error. Please check: 1) Sheet name matches SHEET_NAME in script, 2) Sheet exists in spreadsheet, 3) Script has edit permissions.")]
    SheetConfig,

    #[error("Google Script error: {0}")]
    Script(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MissingAddress => StatusCode::BAD_REQUEST,
            RelayError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            RelayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            RelayError::Network(_)
            | RelayError::HtmlErrorPage
            | RelayError::HtmlInsteadOfJson
            | RelayError::UpstreamStatus(_)
            | RelayError::UnreadableBody
            | RelayError::SheetConfig
            | RelayError::Script(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> axum::response::Response {
        failure(self.status(), self.to_string())
    }
}

/// `{ "ok": false, "error": ... }` with the given status.
pub fn failure(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    let message = message.into();
    let message = if message.is_empty() {
        "internal_server_error".to_string()
    } else {
        message
    };
    (status, Json(json!({ "ok": false, "error": message }))).into_response()
}
