//! The upload pipeline shared by every platform.
//!
//! A platform plugs in through [`PlatformAdapter`]: it says how to obtain the
//! source map and bundle, and how to shape them into an [`UploadPayload`].
//! [`upload_target`] does the rest: parse, transform, send, and log.

use std::path::{Path, PathBuf};
use std::time::Instant;

use mapship_transport::{TransportClient, TransportOptions, UploadPayload};
use mapship_types::{FileAttachment, Reporter, Version};

use crate::diagnostics::{DuplicateHint, describe_upload_error};
use crate::endpoint::{DEFAULT_UPLOAD_ORIGIN, build_endpoint_url};
use crate::error::{Result, UploadError};
use crate::files::absolute_project_root;
use crate::sourcemap::SourceMapDocument;
use crate::transform::transform_source_map;
use crate::version::{ManifestLookup, PackageJsonLookup, VersionInput, VersionRequest, VersionTarget};

/// Options every upload takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonOptions {
    pub api_key: String,
    pub overwrite: bool,
    /// Paths are resolved against, and source paths made relative to, this
    /// directory.
    pub project_root: PathBuf,
    /// Origin or full URL of the ingestion service.
    pub endpoint: String,
    pub version: VersionInput,
}

impl CommonOptions {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            overwrite: false,
            project_root: PathBuf::from("."),
            endpoint: DEFAULT_UPLOAD_ORIGIN.to_string(),
            version: VersionInput::default(),
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_project_root(mut self, project_root: impl Into<PathBuf>) -> Self {
        self.project_root = project_root.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_version(mut self, version: VersionInput) -> Self {
        self.version = version;
        self
    }
}

/// Reject a missing or blank string option.
pub(crate) fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(UploadError::validation(format!(
            "{name} is required and must be a non-empty string"
        )));
    }
    Ok(())
}

/// Result of the pre-flight checks: everything derived from the options
/// before any file is read or request made.
#[derive(Debug, Clone)]
pub(crate) struct Prepared {
    pub project_root: PathBuf,
    pub url: String,
    pub version: VersionRequest,
}

pub(crate) fn prepare(
    common: &CommonOptions,
    upload_path: &str,
    target: VersionTarget,
) -> Result<Prepared> {
    require("apiKey", &common.api_key)?;
    require("endpoint", &common.endpoint)?;
    let version = common.version.validate(target)?;
    let url = build_endpoint_url(&common.endpoint, upload_path)?;
    let project_root = absolute_project_root(&common.project_root)?;
    Ok(Prepared {
        project_root,
        url,
        version,
    })
}

/// A source map and optional bundle, ready to transform.
#[derive(Debug, Clone)]
pub(crate) struct RetrievedInputs {
    pub source_map_text: String,
    /// Where the map lives (or would live); sources resolve against its
    /// directory.
    pub source_map_path: PathBuf,
    /// Name sent to the service.
    pub source_map_name: String,
    pub bundle: Option<FileAttachment>,
}

pub(crate) trait PlatformAdapter {
    fn retrieve(
        &self,
        client: &TransportClient,
        project_root: &Path,
        reporter: &mut dyn Reporter,
    ) -> Result<RetrievedInputs>;

    fn shape(
        &self,
        source_map: FileAttachment,
        bundle: Option<FileAttachment>,
        version: Option<Version>,
    ) -> Result<UploadPayload>;
}

/// Run one target through retrieve, parse, transform, shape and send.
pub(crate) fn upload_target(
    adapter: &dyn PlatformAdapter,
    client: &TransportClient,
    prepared: &Prepared,
    version: Option<Version>,
    reporter: &mut dyn Reporter,
) -> Result<()> {
    let inputs = adapter.retrieve(client, &prepared.project_root, reporter)?;

    let mut doc = SourceMapDocument::parse(&inputs.source_map_text, &inputs.source_map_name)?;
    transform_source_map(
        &mut doc,
        &inputs.source_map_path,
        &prepared.project_root,
        reporter,
    );
    let source_map = FileAttachment::new(inputs.source_map_name, doc.to_json()?);
    let payload = adapter.shape(source_map, inputs.bundle, version)?;

    let uploaded = match payload.bundle() {
        Some(bundle) => format!("{} and {}", payload.source_map().filename, bundle.filename),
        None => payload.source_map().filename.clone(),
    };

    reporter.debug(&format!("Initiating upload to \"{}\"", prepared.url));
    let start = Instant::now();
    client.request(&prepared.url, &payload, reporter)?;
    reporter.success(&format!(
        "Success, uploaded {uploaded} to {} in {}ms",
        prepared.url,
        start.elapsed().as_millis()
    ));
    Ok(())
}

/// Log a failure with its explanation before handing it back.
pub(crate) fn report_failure<T>(
    result: Result<T>,
    hint: DuplicateHint,
    reporter: &mut dyn Reporter,
) -> Result<T> {
    if let Err(err) = &result {
        reporter.error(&describe_upload_error(err, hint));
    }
    result
}

/// Entry point for all uploads.
///
/// Holds the HTTP client and the manifest lookup used for
/// `--detect-app-version`; the per-platform operations live in the
/// `browser`, `node` and `react_native` modules.
pub struct Uploader {
    pub(crate) client: TransportClient,
    pub(crate) manifest: Box<dyn ManifestLookup>,
}

impl Uploader {
    pub fn new(options: TransportOptions) -> Self {
        Self {
            client: TransportClient::new(options),
            manifest: Box::new(PackageJsonLookup),
        }
    }

    /// Replace the `package.json` lookup used for version detection.
    pub fn with_manifest_lookup(mut self, lookup: impl ManifestLookup + 'static) -> Self {
        self.manifest = Box::new(lookup);
        self
    }

    pub fn client(&self) -> &TransportClient {
        &self.client
    }

    pub(crate) fn resolve_version(
        &self,
        prepared: &Prepared,
        reporter: &mut dyn Reporter,
    ) -> Result<Option<Version>> {
        prepared
            .version
            .resolve(&prepared.project_root, self.manifest.as_ref(), reporter)
    }
}

impl Default for Uploader {
    fn default() -> Self {
        Self::new(TransportOptions::default())
    }
}
