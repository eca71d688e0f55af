//! Browser uploads: a map for a script served from a URL.

use std::path::PathBuf;

use mapship_types::Reporter;

use crate::diagnostics::DuplicateHint;
use crate::endpoint::SOURCE_MAP_PATH;
use crate::error::Result;
use crate::files::{bundle_path_for, discover_source_maps, resolve_path, virtual_filename};
use crate::minified::{MinifiedKind, MinifiedTarget, run_batch};
use crate::pipeline::{CommonOptions, Uploader, prepare, report_failure, require, upload_target};
use crate::version::VersionTarget;

const HINT: DuplicateHint = DuplicateHint::OverwriteOrNoOverwrite;

/// Upload one source map (and optionally its minified file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserUploadOne {
    pub common: CommonOptions,
    pub source_map: PathBuf,
    /// URL the minified file is served from.
    pub bundle_url: String,
    pub bundle: Option<PathBuf>,
}

impl BrowserUploadOne {
    pub fn new(
        common: CommonOptions,
        source_map: impl Into<PathBuf>,
        bundle_url: impl Into<String>,
    ) -> Self {
        Self {
            common,
            source_map: source_map.into(),
            bundle_url: bundle_url.into(),
            bundle: None,
        }
    }

    pub fn with_bundle(mut self, bundle: impl Into<PathBuf>) -> Self {
        self.bundle = Some(bundle.into());
        self
    }
}

/// Upload every source map under a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserUploadMultiple {
    pub common: CommonOptions,
    pub directory: PathBuf,
    /// URL the directory is served from; each minified URL is this plus the
    /// file's path inside `directory`.
    pub base_url: String,
}

impl BrowserUploadMultiple {
    pub fn new(
        common: CommonOptions,
        directory: impl Into<PathBuf>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            common,
            directory: directory.into(),
            base_url: base_url.into(),
        }
    }
}

impl Uploader {
    pub fn upload_browser_one(
        &self,
        opts: &BrowserUploadOne,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        let result = self.browser_one(opts, reporter);
        report_failure(result, HINT, reporter)
    }

    pub fn upload_browser_multiple(
        &self,
        opts: &BrowserUploadMultiple,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        let result = self.browser_multiple(opts, reporter);
        report_failure(result, HINT, reporter)
    }

    fn browser_one(&self, opts: &BrowserUploadOne, reporter: &mut dyn Reporter) -> Result<()> {
        require("sourceMap", &opts.source_map.to_string_lossy())?;
        require("bundleUrl", &opts.bundle_url)?;
        let prepared = prepare(&opts.common, SOURCE_MAP_PATH, VersionTarget::Browser)?;

        reporter.info(&format!(
            "Preparing upload of browser source map for \"{}\"",
            opts.bundle_url
        ));

        let root = &prepared.project_root;
        let target = MinifiedTarget {
            kind: MinifiedKind::Browser,
            api_key: opts.common.api_key.clone(),
            overwrite: opts.common.overwrite,
            source_map: resolve_path(root, &opts.source_map),
            bundle: opts.bundle.as_ref().map(|b| resolve_path(root, b)),
            bundle_optional: false,
            minified_url: opts.bundle_url.clone(),
        };
        let version = self.resolve_version(&prepared, reporter)?;
        upload_target(&target, &self.client, &prepared, version, reporter)
    }

    fn browser_multiple(
        &self,
        opts: &BrowserUploadMultiple,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        require("directory", &opts.directory.to_string_lossy())?;
        require("baseUrl", &opts.base_url)?;
        let prepared = prepare(&opts.common, SOURCE_MAP_PATH, VersionTarget::Browser)?;

        reporter.info(&format!(
            "Preparing upload of browser source maps for \"{}\"",
            opts.base_url
        ));

        let search_dir = resolve_path(&prepared.project_root, &opts.directory);
        reporter.debug(&format!(
            "Searching for source maps \"{}\"",
            search_dir.display()
        ));
        let maps = discover_source_maps(&search_dir, false)?;

        let base_url = opts.base_url.trim_end_matches('/');
        run_batch(
            self,
            &prepared,
            &maps,
            |map| {
                let bundle = bundle_path_for(map);
                MinifiedTarget {
                    kind: MinifiedKind::Browser,
                    api_key: opts.common.api_key.clone(),
                    overwrite: opts.common.overwrite,
                    source_map: map.to_path_buf(),
                    minified_url: format!("{base_url}/{}", virtual_filename(&bundle, &search_dir)),
                    bundle: Some(bundle),
                    bundle_optional: true,
                }
            },
            reporter,
        )
    }
}
