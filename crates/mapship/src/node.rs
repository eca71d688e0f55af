//! Node uploads: server-side bundles, identified by path rather than URL.

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

/// Upload one source map and the bundle it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeUploadOne {
    pub common: CommonOptions,
    pub source_map: PathBuf,
    /// Path of the bundle as the running process sees it; also sent as the
    /// minified URL.
    pub bundle: PathBuf,
}

impl NodeUploadOne {
    pub fn new(
        common: CommonOptions,
        source_map: impl Into<PathBuf>,
        bundle: impl Into<PathBuf>,
    ) -> Self {
        Self {
            common,
            source_map: source_map.into(),
            bundle: bundle.into(),
        }
    }
}

/// Upload every source map under a directory, ignoring `node_modules`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeUploadMultiple {
    pub common: CommonOptions,
    pub directory: PathBuf,
}

impl NodeUploadMultiple {
    pub fn new(common: CommonOptions, directory: impl Into<PathBuf>) -> Self {
        Self {
            common,
            directory: directory.into(),
        }
    }
}

impl Uploader {
    pub fn upload_node_one(&self, opts: &NodeUploadOne, reporter: &mut dyn Reporter) -> Result<()> {
        let result = self.node_one(opts, reporter);
        report_failure(result, HINT, reporter)
    }

    pub fn upload_node_multiple(
        &self,
        opts: &NodeUploadMultiple,
        reporter: &mut dyn Reporter,
    ) -> Result<()> {
        let result = self.node_multiple(opts, reporter);
        report_failure(result, HINT, reporter)
    }

    fn node_one(&self, opts: &NodeUploadOne, reporter: &mut dyn Reporter) -> Result<()> {
        require("sourceMap", &opts.source_map.to_string_lossy())?;
        let bundle = opts.bundle.to_string_lossy();
        require("bundle", &bundle)?;
        let prepared = prepare(&opts.common, SOURCE_MAP_PATH, VersionTarget::Node)?;

        reporter.info(&format!("Preparing upload of node source map for \"{bundle}\""));

        let root = &prepared.project_root;
        let target = MinifiedTarget {
            kind: MinifiedKind::Node,
            api_key: opts.common.api_key.clone(),
            overwrite: opts.common.overwrite,
            source_map: resolve_path(root, &opts.source_map),
            bundle: Some(resolve_path(root, &opts.bundle)),
            bundle_optional: false,
            minified_url: bundle.replace('\\', "/"),
        };
        let version = self.resolve_version(&prepared, reporter)?;
        upload_target(&target, &self.client, &prepared, version, reporter)
    }

    fn node_multiple(&self, opts: &NodeUploadMultiple, reporter: &mut dyn Reporter) -> Result<()> {
        require("directory", &opts.directory.to_string_lossy())?;
        let prepared = prepare(&opts.common, SOURCE_MAP_PATH, VersionTarget::Node)?;

        reporter.info(&format!(
            "Preparing upload of node source maps for \"{}\"",
            opts.directory.display()
        ));

        let search_dir = resolve_path(&prepared.project_root, &opts.directory);
        reporter.debug(&format!(
            "Searching for source maps \"{}\"",
            search_dir.display()
        ));
        let maps = discover_source_maps(&search_dir, true)?;

        let root = prepared.project_root.clone();
        run_batch(
            self,
            &prepared,
            &maps,
            |map| {
                let bundle = bundle_path_for(map);
                MinifiedTarget {
                    kind: MinifiedKind::Node,
                    api_key: opts.common.api_key.clone(),
                    overwrite: opts.common.overwrite,
                    source_map: map.to_path_buf(),
                    minified_url: virtual_filename(&bundle, &root),
                    bundle: Some(bundle),
                    bundle_optional: true,
                }
            },
            reporter,
        )
    }
}
