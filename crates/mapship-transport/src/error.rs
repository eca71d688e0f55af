use std::error::Error as StdError;
use std::fmt;

use mapship_retry::Retryable;
use serde::{Deserialize, Serialize};

/// Closed set of upload failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unknown,
    Duplicate,
    Timeout,
    BadRequest,
    EmptyFile,
    InvalidApiKey,
    ServerError,
    ConnectionRefused,
    NotFound,
}

impl ErrorCode {
    /// Whether a failure of this kind is worth another attempt.
    pub fn is_retryable(self) -> bool {
        match self {
            ErrorCode::Unknown
            | ErrorCode::Timeout
            | ErrorCode::ServerError
            | ErrorCode::ConnectionRefused => true,
            ErrorCode::Duplicate
            | ErrorCode::BadRequest
            | ErrorCode::EmptyFile
            | ErrorCode::InvalidApiKey
            | ErrorCode::NotFound => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Unknown => "unknown",
            ErrorCode::Duplicate => "duplicate",
            ErrorCode::Timeout => "timeout",
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::EmptyFile => "empty_file",
            ErrorCode::InvalidApiKey => "invalid_api_key",
            ErrorCode::ServerError => "server_error",
            ErrorCode::ConnectionRefused => "connection_refused",
            ErrorCode::NotFound => "not_found",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the status of an upload response.
///
/// Returns `None` for a successful upload (HTTP 200 only).
pub fn classify_status(status: u16) -> Option<ErrorCode> {
    match status {
        200 => None,
        401 => Some(ErrorCode::InvalidApiKey),
        409 => Some(ErrorCode::Duplicate),
        422 => Some(ErrorCode::EmptyFile),
        400..=499 => Some(ErrorCode::BadRequest),
        500..=599 => Some(ErrorCode::ServerError),
        _ => Some(ErrorCode::Unknown),
    }
}

/// Classify the status of a plain GET against a bundler.
///
/// Any 2xx is a success; a missing resource is reported as `NotFound` so the
/// caller can point at the entry point.
pub fn classify_fetch_status(status: u16) -> Option<ErrorCode> {
    match status {
        200..=299 => None,
        404 => Some(ErrorCode::NotFound),
        400..=499 => Some(ErrorCode::BadRequest),
        500..=599 => Some(ErrorCode::ServerError),
        _ => Some(ErrorCode::Unknown),
    }
}

/// A classified failure observed while talking to the ingestion endpoint or
/// a bundler.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub code: ErrorCode,
    pub retryable: bool,
    message: String,
    #[source]
    cause: Option<Box<dyn StdError + Send + Sync>>,
    /// Raw response body, captured for failures that carry one.
    pub response_text: Option<String>,
}

impl TransportError {
    /// New error whose retryability follows from its code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            retryable: code.is_retryable(),
            message: message.into(),
            cause: None,
            response_text: None,
        }
    }

    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn with_response_text(mut self, text: impl Into<String>) -> Self {
        self.response_text = Some(text.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }

    pub(crate) fn from_status(code: ErrorCode, status: u16, body: String) -> Self {
        Self::status_from(code, status, body, "upload API")
    }

    pub(crate) fn from_fetch_status(code: ErrorCode, status: u16, body: String) -> Self {
        Self::status_from(code, status, body, "bundle server")
    }

    fn status_from(code: ErrorCode, status: u16, body: String, origin: &str) -> Self {
        let err = Self::new(code, format!("HTTP status {status} received from {origin}"));
        if body.is_empty() {
            err
        } else {
            err.with_response_text(body)
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::Timeout
        } else if err.is_connect() {
            ErrorCode::ConnectionRefused
        } else {
            ErrorCode::Unknown
        };
        let message = match code {
            ErrorCode::Timeout => "request timed out".to_string(),
            ErrorCode::ConnectionRefused => format!("connection failed: {err}"),
            _ => format!("request failed: {err}"),
        };
        Self::new(code, message).with_cause(err)
    }
}

impl Retryable for TransportError {
    fn is_retryable(&self) -> bool {
        self.retryable
    }
}
