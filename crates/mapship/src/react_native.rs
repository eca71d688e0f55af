//! React Native uploads, from files on disk or fetched from a running
//! bundler.

use std::path::{Path, PathBuf};

use mapship_transport::{ReactNativePayload, TransportClient, UploadPayload};
use mapship_types::{FileAttachment, Platform, Reporter, Version};

use crate::diagnostics::DuplicateHint;
use crate::endpoint::REACT_NATIVE_PATH;
use crate::error::{Result, UploadError};
use crate::files::{read_text, resolve_path, virtual_filename};
use crate::pipeline::{
    CommonOptions, PlatformAdapter, RetrievedInputs, Uploader, prepare, report_failure, require,
    upload_target,
};
use crate::version::VersionTarget;

pub const DEFAULT_BUNDLER_URL: &str = "http://localhost:8081";
pub const DEFAULT_ENTRY_POINT: &str = "index.js";

/// Where the source map and bundle come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceMapRetrieval {
    /// Files already produced by a release build.
    Provided { source_map: PathBuf, bundle: PathBuf },
    /// Ask a running bundler (Metro) to build them.
    Fetch {
        bundler_url: String,
        entry_point: String,
    },
}

impl SourceMapRetrieval {
    pub fn provided(source_map: impl Into<PathBuf>, bundle: impl Into<PathBuf>) -> Self {
        SourceMapRetrieval::Provided {
            source_map: source_map.into(),
            bundle: bundle.into(),
        }
    }

    /// Fetch from the default bundler address and entry point.
    pub fn fetch() -> Self {
        SourceMapRetrieval::Fetch {
            bundler_url: DEFAULT_BUNDLER_URL.to_string(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactNativeUpload {
    pub common: CommonOptions,
    pub platform: Platform,
    pub dev: bool,
    pub retrieval: SourceMapRetrieval,
}

impl ReactNativeUpload {
    /// A release build upload. Unlike the other platforms, React Native
    /// uploads replace existing maps unless told otherwise.
    pub fn new(common: CommonOptions, platform: Platform, retrieval: SourceMapRetrieval) -> Self {
        Self {
            common: common.with_overwrite(true),
            platform,
            dev: false,
            retrieval,
        }
    }

    pub fn with_dev(mut self, dev: bool) -> Self {
        self.dev = dev;
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.common.overwrite = overwrite;
        self
    }

    fn build_kind(&self) -> &'static str {
        if self.dev { "dev" } else { "release" }
    }
}

/// URLs of the map and bundle a bundler serves for one entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BundlerUrls {
    pub source_map: String,
    pub bundle: String,
}

pub(crate) fn bundler_urls(
    bundler_url: &str,
    entry_point: &str,
    platform: Platform,
    dev: bool,
) -> BundlerUrls {
    let base = bundler_url.trim_end_matches('/');
    let entry = entry_point
        .strip_suffix(".js")
        .or_else(|| entry_point.strip_suffix(".bundle"))
        .unwrap_or(entry_point);
    let query = format!("platform={}&dev={dev}", platform.as_str());
    BundlerUrls {
        source_map: format!("{base}/{entry}.js.map?{query}"),
        bundle: format!("{base}/{entry}.bundle?{query}"),
    }
}

struct ReactNativeTarget<'a> {
    upload: &'a ReactNativeUpload,
}

/// GET one bundler resource, keeping what the diagnostics need on failure.
fn fetch_from_bundler(
    client: &TransportClient,
    url: &str,
    what: &str,
    bundler_url: &str,
    entry_point: &str,
    reporter: &mut dyn Reporter,
) -> Result<String> {
    reporter.debug(&format!("Fetching {what} from {url}"));
    client.fetch(url).map_err(|source| UploadError::Fetch {
        url: url.to_string(),
        bundler_url: bundler_url.to_string(),
        entry_point: entry_point.to_string(),
        source,
    })
}

impl PlatformAdapter for ReactNativeTarget<'_> {
    fn retrieve(
        &self,
        client: &TransportClient,
        project_root: &Path,
        reporter: &mut dyn Reporter,
    ) -> Result<RetrievedInputs> {
        match &self.upload.retrieval {
            SourceMapRetrieval::Provided { source_map, bundle } => {
                let map_path = resolve_path(project_root, source_map);
                let bundle_path = resolve_path(project_root, bundle);
                reporter.debug(&format!("Reading source map \"{}\"", map_path.display()));
                let source_map_text = read_text(&map_path, "source map")?;
                reporter.debug(&format!("Reading bundle file \"{}\"", bundle_path.display()));
                let bundle_text = read_text(&bundle_path, "bundle")?;
                Ok(RetrievedInputs {
                    source_map_text,
                    source_map_name: virtual_filename(&map_path, project_root),
                    source_map_path: map_path,
                    bundle: Some(FileAttachment::new(
                        virtual_filename(&bundle_path, project_root),
                        bundle_text,
                    )),
                })
            }
            SourceMapRetrieval::Fetch {
                bundler_url,
                entry_point,
            } => {
                let urls = bundler_urls(
                    bundler_url,
                    entry_point,
                    self.upload.platform,
                    self.upload.dev,
                );
                let source_map_text = fetch_from_bundler(
                    client,
                    &urls.source_map,
                    "source map",
                    bundler_url,
                    entry_point,
                    reporter,
                )?;
                let bundle_text = fetch_from_bundler(
                    client,
                    &urls.bundle,
                    "bundle",
                    bundler_url,
                    entry_point,
                    reporter,
                )?;
                Ok(RetrievedInputs {
                    source_map_text,
                    // Sources are resolved as if the map sat next to the entry point.
                    source_map_path: resolve_path(project_root, Path::new(entry_point)),
                    source_map_name: urls.source_map,
                    bundle: Some(FileAttachment::new(urls.bundle, bundle_text)),
                })
            }
        }
    }

    fn shape(
        &self,
        source_map: FileAttachment,
        bundle: Option<FileAttachment>,
        version: Option<Version>,
    ) -> Result<UploadPayload> {
        let version = version.ok_or_else(|| {
            UploadError::validation("React Native uploads require an app version or code bundle id")
        })?;
        let bundle = bundle.ok_or_else(|| {
            UploadError::validation("React Native uploads require a bundle")
        })?;
        Ok(UploadPayload::ReactNative(ReactNativePayload {
            api_key: self.upload.common.api_key.clone(),
            overwrite: self.upload.common.overwrite,
            platform: self.upload.platform,
            dev: self.upload.dev,
            version,
            source_map,
            bundle,
        }))
    }
}

impl Uploader {
    pub fn upload_react_native(
        &self,
        opts: &ReactNativeUpload,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        let result = self.react_native(opts, reporter);
        report_failure(result, DuplicateHint::Overwrite, reporter)
    }

    fn react_native(&self, opts: &ReactNativeUpload, reporter: &mut dyn Reporter) -> Result<()> {
        match &opts.retrieval {
            SourceMapRetrieval::Provided { source_map, bundle } => {
                require("sourceMap", &source_map.to_string_lossy())?;
                require("bundle", &bundle.to_string_lossy())?;
            }
            SourceMapRetrieval::Fetch {
                bundler_url,
                entry_point,
            } => {
                require("bundlerUrl", bundler_url)?;
                require("bundlerEntryPoint", entry_point)?;
                validate_bundler_url(bundler_url)?;
            }
        }
        let prepared = prepare(
            &opts.common,
            REACT_NATIVE_PATH,
            VersionTarget::ReactNative(opts.platform),
        )?;

        let verb = match opts.retrieval {
            SourceMapRetrieval::Provided { .. } => "Preparing upload of",
            SourceMapRetrieval::Fetch { .. } => "Fetching",
        };
        reporter.info(&format!(
            "{verb} React Native source map ({} / {})",
            opts.build_kind(),
            opts.platform
        ));

        let version = self.resolve_version(&prepared, reporter)?;
        let target = ReactNativeTarget { upload: opts };
        upload_target(&target, &self.client, &prepared, version, reporter)
    }
}

fn validate_bundler_url(bundler_url: &str) -> Result<()> {
    let parsed = url::Url::parse(bundler_url).map_err(|e| {
        UploadError::validation(format!("bundlerUrl \"{bundler_url}\" is not a valid URL: {e}"))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(UploadError::validation(format!(
            "bundlerUrl must use http or https, got \"{other}\""
        ))),
    }
}
