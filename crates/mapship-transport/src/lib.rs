//! Upload transport for mapship.
//!
//! [`TransportClient`] posts an [`UploadPayload`] as `multipart/form-data`,
//! classifies the response into a [`TransportError`], and retries retryable
//! failures at a fixed interval. It also performs the plain GET used to pull
//! a source map and bundle from a running React Native bundler.
//!
//! # Example
//!
//! ```no_run
//! use mapship_transport::{TransportClient, TransportOptions, UploadPayload, MinifiedPayload};
//! use mapship_types::{FileAttachment, NoopReporter};
//!
//! let client = TransportClient::new(TransportOptions::default());
//! let payload = UploadPayload::Browser(MinifiedPayload {
//!     api_key: "YOUR_API_KEY".to_string(),
//!     overwrite: false,
//!     version: None,
//!     minified_url: "https://example.com/app.js".to_string(),
//!     source_map: FileAttachment::new("app.js.map", "{}"),
//!     minified_file: None,
//! });
//! client.request("https://upload.example.com/sourcemap", &payload, &mut NoopReporter)?;
//! # Ok::<(), mapship_transport::TransportError>(())
//! ```

use std::time::Duration;

use mapship_retry::{RetryConfig, RetryExecutor};
use mapship_types::Reporter;

mod error;
mod payload;

pub use error::{ErrorCode, TransportError, classify_fetch_status, classify_status};
pub use payload::{MinifiedPayload, ReactNativePayload, UploadPayload};

/// Default socket timeout for one request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("mapship/", env!("CARGO_PKG_VERSION"));

/// Timeout and retry settings for a [`TransportClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retry: RetryConfig::default(),
        }
    }
}

/// Blocking HTTP client for uploads and bundler fetches.
#[derive(Debug, Clone)]
pub struct TransportClient {
    client: reqwest::blocking::Client,
    options: TransportOptions,
}

impl TransportClient {
    pub fn new(options: TransportOptions) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(options.timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());

        Self { client, options }
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Perform a single upload attempt.
    pub fn send(&self, endpoint: &str, payload: &UploadPayload) -> Result<(), TransportError> {
        let form = payload.to_form()?;
        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .map_err(TransportError::from_reqwest)?;

        let status = response.status().as_u16();
        match classify_status(status) {
            None => Ok(()),
            Some(code) => {
                let body = response.text().unwrap_or_default();
                Err(TransportError::from_status(code, status, body))
            }
        }
    }

    /// Upload with bounded, fixed-interval retry.
    ///
    /// The last error is returned unchanged once a non-retryable failure is
    /// seen or the attempt ceiling is reached.
    pub fn request(
        &self,
        endpoint: &str,
        payload: &UploadPayload,
        reporter: &mut dyn Reporter,
    ) -> Result<(), TransportError> {
        let executor = RetryExecutor::new(self.options.retry.clone());
        let max_attempts = self.options.retry.max_attempts.max(1);

        executor.run_with_hook(
            |_attempt| self.send(endpoint, payload),
            |attempt, err, delay| {
                reporter.debug(&format!(
                    "attempt {attempt} of {max_attempts} failed ({}): {err}; retrying in {}ms",
                    err.code,
                    delay.as_millis()
                ));
            },
        )
    }

    /// GET `url` and return the body as text.
    ///
    /// No retry is applied.
    pub fn fetch(&self, url: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(TransportError::from_reqwest)?;

        let status = response.status().as_u16();
        if let Some(code) = classify_fetch_status(status) {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::from_fetch_status(code, status, body));
        }

        response.text().map_err(TransportError::from_reqwest)
    }
}
