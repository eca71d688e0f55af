use url::Url;

use crate::error::{Result, UploadError};

/// Ingestion service used when no endpoint is configured.
pub const DEFAULT_UPLOAD_ORIGIN: &str = "https://upload.bugsnag.com";

/// Path for Browser and Node uploads.
pub const SOURCE_MAP_PATH: &str = "/sourcemap";

/// Path for React Native uploads.
pub const REACT_NATIVE_PATH: &str = "/react-native-source-map";

/// Build the upload URL from a configured endpoint.
///
/// An endpoint that already carries a path is used as given; a bare origin
/// gets `path` appended.
pub fn build_endpoint_url(endpoint: &str, path: &str) -> Result<String> {
    let url = Url::parse(endpoint).map_err(|e| {
        UploadError::validation(format!("invalid endpoint \"{endpoint}\": {e}"))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UploadError::validation(format!(
            "invalid endpoint \"{endpoint}\": expected an http or https URL"
        )));
    }
    if url.path() != "/" {
        return Ok(url.to_string());
    }
    url.join(path)
        .map(String::from)
        .map_err(|e| UploadError::validation(format!("invalid endpoint \"{endpoint}\": {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_origin_gets_default_path() {
        assert_eq!(
            build_endpoint_url("https://upload.example.com", SOURCE_MAP_PATH).expect("url"),
            "https://upload.example.com/sourcemap"
        );
        assert_eq!(
            build_endpoint_url("http://localhost:9000/", REACT_NATIVE_PATH).expect("url"),
            "http://localhost:9000/react-native-source-map"
        );
    }

    #[test]
    fn endpoint_with_path_is_used_verbatim() {
        assert_eq!(
            build_endpoint_url("https://upload.example.com/custom", SOURCE_MAP_PATH).expect("url"),
            "https://upload.example.com/custom"
        );
    }

    #[test]
    fn default_origin_builds() {
        assert_eq!(
            build_endpoint_url(DEFAULT_UPLOAD_ORIGIN, SOURCE_MAP_PATH).expect("url"),
            "https://upload.bugsnag.com/sourcemap"
        );
    }

    #[test]
    fn malformed_endpoint_is_a_validation_error() {
        for bad in ["", "not a url", "upload.example.com", "ftp://files.example.com"] {
            let err = build_endpoint_url(bad, SOURCE_MAP_PATH).expect_err(bad);
            assert!(matches!(err, UploadError::Validation(_)), "{bad}");
        }
    }
}
