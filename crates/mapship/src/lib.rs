//! Source map upload pipeline.
//!
//! `mapship` prepares source maps for a crash-reporting service and uploads
//! them together with the minified or bundled output they describe:
//!
//! - [`transform`] embeds source text into `sourcesContent` and rewrites
//!   `sources` relative to the project root.
//! - [`version`] validates version flags and detects the app version from
//!   `package.json`.
//! - [`Uploader`] drives Browser, Node and React Native uploads, one file or
//!   a whole directory at a time, over the retrying
//!   [`mapship_transport::TransportClient`].
//!
//! # Example
//!
//! ```no_run
//! use mapship::{BrowserUploadOne, CommonOptions, Uploader, VersionInput};
//! use mapship_types::NoopReporter;
//!
//! let uploader = Uploader::default();
//! let opts = BrowserUploadOne::new(
//!     CommonOptions::new("YOUR_API_KEY").with_version(VersionInput::app_version("1.2.3")),
//!     "dist/app.js.map",
//!     "https://example.com/static/app.js",
//! )
//! .with_bundle("dist/app.js");
//! uploader.upload_browser_one(&opts, &mut NoopReporter)?;
//! # Ok::<(), mapship::UploadError>(())
//! ```

pub mod browser;
pub mod diagnostics;
pub mod endpoint;
pub mod error;
pub mod files;
mod minified;
pub mod node;
pub mod pipeline;
pub mod react_native;
pub mod sourcemap;
pub mod transform;
pub mod version;

pub use browser::{BrowserUploadMultiple, BrowserUploadOne};
pub use diagnostics::{DuplicateHint, format_error_log, format_fetch_error};
pub use endpoint::{DEFAULT_UPLOAD_ORIGIN, build_endpoint_url};
pub use error::UploadError;
pub use mapship_retry::RetryConfig;
pub use mapship_transport::{ErrorCode, TransportError, TransportOptions};
pub use node::{NodeUploadMultiple, NodeUploadOne};
pub use pipeline::{CommonOptions, Uploader};
pub use react_native::{ReactNativeUpload, SourceMapRetrieval};
pub use sourcemap::SourceMapDocument;
pub use version::{
    DetectedVersion, ManifestLookup, PackageJsonLookup, VersionInput, VersionRequest,
    VersionTarget,
};

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Read;
    use std::path::Path;
    use std::thread;
    use std::time::Duration;

    use mapship_retry::RetryConfig;
    use mapship_transport::TransportOptions;
    use mapship_types::Reporter;
    use tiny_http::{Response, Server, StatusCode};

    use crate::pipeline::Uploader;

    #[derive(Debug, Default)]
    pub struct CollectingReporter {
        pub debugs: Vec<String>,
        pub infos: Vec<String>,
        pub successes: Vec<String>,
        pub warns: Vec<String>,
        pub errors: Vec<String>,
    }

    impl Reporter for CollectingReporter {
        fn debug(&mut self, msg: &str) {
            self.debugs.push(msg.to_string());
        }

        fn info(&mut self, msg: &str) {
            self.infos.push(msg.to_string());
        }

        fn success(&mut self, msg: &str) {
            self.successes.push(msg.to_string());
        }

        fn warn(&mut self, msg: &str) {
            self.warns.push(msg.to_string());
        }

        fn error(&mut self, msg: &str) {
            self.errors.push(msg.to_string());
        }
    }

    /// A request as the ingestion service saw it.
    #[derive(Debug, Clone)]
    pub struct Captured {
        pub url: String,
        pub body: String,
    }

    impl Captured {
        /// Value of a plain text multipart field.
        pub fn field(&self, name: &str) -> Option<String> {
            let marker = format!("name=\"{name}\"\r\n\r\n");
            let start = self.body.find(&marker)? + marker.len();
            let rest = &self.body[start..];
            let end = rest.find("\r\n--")?;
            Some(rest[..end].to_string())
        }

        pub fn has_file(&self, filename: &str) -> bool {
            self.body.contains(&format!("filename=\"{filename}\""))
        }
    }

    /// Answer one request per status, then report what was received.
    pub fn spawn_upload_server(statuses: Vec<u16>) -> (String, thread::JoinHandle<Vec<Captured>>) {
        let server = Server::http("127.0.0.1:0").expect("server");
        let base_url = format!("http://{}", server.server_addr());
        let handle = thread::spawn(move || {
            let mut captured = Vec::new();
            for status in statuses {
                let mut req = match server.recv_timeout(Duration::from_secs(2)) {
                    Ok(Some(req)) => req,
                    _ => break,
                };
                let mut body = String::new();
                req.as_reader().read_to_string(&mut body).expect("body");
                captured.push(Captured {
                    url: req.url().to_string(),
                    body,
                });
                let resp = Response::from_string(format!("status {status}"))
                    .with_status_code(StatusCode(status));
                req.respond(resp).expect("respond");
            }
            captured
        });
        (base_url, handle)
    }

    pub fn fast_uploader() -> Uploader {
        Uploader::new(TransportOptions {
            timeout: Duration::from_secs(2),
            retry: RetryConfig {
                max_attempts: 3,
                interval: Duration::from_millis(5),
            },
        })
    }

    pub fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdir");
        }
        std::fs::write(path, content).expect("write");
    }
}
