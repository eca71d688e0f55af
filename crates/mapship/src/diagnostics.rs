//! User-facing explanations for failed uploads and bundler fetches.

use mapship_transport::{ErrorCode, TransportError};

use crate::error::UploadError;

/// Which flags to suggest when the service already has a matching map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateHint {
    /// Browser and Node: `--overwrite` or drop `--no-overwrite`.
    OverwriteOrNoOverwrite,
    /// React Native: `--overwrite`.
    Overwrite,
}

/// Explain an upload failure from its error code.
pub fn format_error_log(err: &TransportError, hint: DuplicateHint) -> String {
    let response_text = err.response_text.as_deref().unwrap_or("");
    match err.code {
        ErrorCode::EmptyFile => "The uploaded source map was empty.".to_string(),
        ErrorCode::InvalidApiKey => "The provided API key was invalid.".to_string(),
        ErrorCode::BadRequest => format!(
            "The request was rejected by the server as invalid.\n\n  responseText = {response_text}"
        ),
        ErrorCode::Duplicate => {
            let flag = match hint {
                DuplicateHint::OverwriteOrNoOverwrite => {
                    "use the \"overwrite\" flag (or remove the \"no-overwrite\" flag)"
                }
                DuplicateHint::Overwrite => "use the \"overwrite\" flag",
            };
            format!(
                "A source map matching the same criteria has already been uploaded. If you want to replace it, {flag}."
            )
        }
        ErrorCode::ServerError => format!(
            "A server side error occurred while processing the upload.\n\n  responseText = {response_text}"
        ),
        ErrorCode::Timeout => "The request timed out.".to_string(),
        ErrorCode::Unknown | ErrorCode::ConnectionRefused | ErrorCode::NotFound => {
            "An unexpected error occurred.".to_string()
        }
    }
}

/// Explain a failed GET against a React Native bundler.
pub fn format_fetch_error(err: &TransportError, bundler_url: &str, entry_point: &str) -> String {
    match err.code {
        ErrorCode::ConnectionRefused => {
            format!("Unable to connect to {bundler_url}. Is the server running?")
        }
        ErrorCode::ServerError | ErrorCode::NotFound => format!(
            "Received an error from the server at {bundler_url}. Does the entry point file '{entry_point}' exist?"
        ),
        ErrorCode::Timeout => format!("The request to {bundler_url} timed out."),
        _ => format!("An unexpected error occurred during the request to {bundler_url}."),
    }
}

/// One log line for any upload failure.
pub fn describe_upload_error(err: &UploadError, hint: DuplicateHint) -> String {
    match err {
        UploadError::Transport(e) => format_error_log(e, hint),
        UploadError::Fetch {
            bundler_url,
            entry_point,
            source,
            ..
        } => format_fetch_error(source, bundler_url, entry_point),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(code: ErrorCode) -> TransportError {
        TransportError::new(code, "failed")
    }

    #[test]
    fn fixed_messages_per_code() {
        let hint = DuplicateHint::OverwriteOrNoOverwrite;
        assert_eq!(
            format_error_log(&err(ErrorCode::EmptyFile), hint),
            "The uploaded source map was empty."
        );
        assert_eq!(
            format_error_log(&err(ErrorCode::InvalidApiKey), hint),
            "The provided API key was invalid."
        );
        assert_eq!(
            format_error_log(&err(ErrorCode::Timeout), hint),
            "The request timed out."
        );
        assert_eq!(
            format_error_log(&err(ErrorCode::Unknown), hint),
            "An unexpected error occurred."
        );
    }

    #[test]
    fn rejection_messages_include_response_text() {
        let bad = err(ErrorCode::BadRequest).with_response_text("missing minifiedUrl");
        assert_eq!(
            format_error_log(&bad, DuplicateHint::Overwrite),
            "The request was rejected by the server as invalid.\n\n  responseText = missing minifiedUrl"
        );
        let server = err(ErrorCode::ServerError).with_response_text("oops");
        assert!(format_error_log(&server, DuplicateHint::Overwrite).ends_with("responseText = oops"));
    }

    #[test]
    fn duplicate_hint_depends_on_platform() {
        let dup = err(ErrorCode::Duplicate);
        assert!(
            format_error_log(&dup, DuplicateHint::OverwriteOrNoOverwrite)
                .contains("(or remove the \"no-overwrite\" flag)")
        );
        let rn = format_error_log(&dup, DuplicateHint::Overwrite);
        assert!(rn.ends_with("use the \"overwrite\" flag."));
        assert!(!rn.contains("no-overwrite"));
    }

    #[test]
    fn fetch_errors_point_at_bundler() {
        let url = "http://localhost:8081";
        assert_eq!(
            format_fetch_error(&err(ErrorCode::ConnectionRefused), url, "index.js"),
            "Unable to connect to http://localhost:8081. Is the server running?"
        );
        assert_eq!(
            format_fetch_error(&err(ErrorCode::NotFound), url, "index.js"),
            "Received an error from the server at http://localhost:8081. Does the entry point file 'index.js' exist?"
        );
        assert_eq!(
            format_fetch_error(&err(ErrorCode::Timeout), url, "index.js"),
            "The request to http://localhost:8081 timed out."
        );
        assert_eq!(
            format_fetch_error(&err(ErrorCode::BadRequest), url, "index.js"),
            "An unexpected error occurred during the request to http://localhost:8081."
        );
    }

    #[test]
    fn fetch_failures_use_fetch_wording() {
        let e = UploadError::Fetch {
            url: "http://localhost:8081/index.js.map?platform=ios&dev=false".into(),
            bundler_url: "http://localhost:8081".into(),
            entry_point: "index.js".into(),
            source: err(ErrorCode::ConnectionRefused),
        };
        assert_eq!(
            describe_upload_error(&e, DuplicateHint::Overwrite),
            "Unable to connect to http://localhost:8081. Is the server running?"
        );
    }

    #[test]
    fn non_transport_errors_use_display() {
        let e = UploadError::Validation("apiKey is required".into());
        assert_eq!(
            describe_upload_error(&e, DuplicateHint::Overwrite),
            "apiKey is required"
        );
    }
}
