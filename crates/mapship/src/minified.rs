//! Browser and Node uploads share one payload shape; this adapter serves both,
//! for single files and for directory batches.

use std::path::{Path, PathBuf};

use mapship_transport::{MinifiedPayload, TransportClient, UploadPayload};
use mapship_types::{FileAttachment, Reporter, Version};

use crate::error::Result;
use crate::files::{read_text, virtual_filename};
use crate::pipeline::{PlatformAdapter, Prepared, RetrievedInputs, Uploader, upload_target};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MinifiedKind {
    Browser,
    Node,
}

#[derive(Debug, Clone)]
pub(crate) struct MinifiedTarget {
    pub kind: MinifiedKind,
    pub api_key: String,
    pub overwrite: bool,
    pub source_map: PathBuf,
    pub bundle: Option<PathBuf>,
    /// Batch mode uploads the map alone when its bundle cannot be read.
    pub bundle_optional: bool,
    pub minified_url: String,
}

impl PlatformAdapter for MinifiedTarget {
    fn retrieve(
        &self,
        _client: &TransportClient,
        project_root: &Path,
        reporter: &mut dyn Reporter,
    ) -> Result<RetrievedInputs> {
        reporter.debug(&format!(
            "Reading source map \"{}\"",
            self.source_map.display()
        ));
        let source_map_text = read_text(&self.source_map, "source map")?;

        let bundle = match &self.bundle {
            None => None,
            Some(path) => {
                reporter.debug(&format!("Reading bundle file \"{}\"", path.display()));
                match read_text(path, "bundle") {
                    Ok(content) => Some(FileAttachment::new(
                        virtual_filename(path, project_root),
                        content,
                    )),
                    Err(err) if self.bundle_optional => {
                        reporter.warn(&format!("{err} Uploading the source map without it."));
                        None
                    }
                    Err(err) => return Err(err),
                }
            }
        };

        Ok(RetrievedInputs {
            source_map_text,
            source_map_path: self.source_map.clone(),
            source_map_name: virtual_filename(&self.source_map, project_root),
            bundle,
        })
    }

    fn shape(
        &self,
        source_map: FileAttachment,
        bundle: Option<FileAttachment>,
        version: Option<Version>,
    ) -> Result<UploadPayload> {
        let payload = MinifiedPayload {
            api_key: self.api_key.clone(),
            overwrite: self.overwrite,
            version,
            minified_url: self.minified_url.clone(),
            source_map,
            minified_file: bundle,
        };
        Ok(match self.kind {
            MinifiedKind::Browser => UploadPayload::Browser(payload),
            MinifiedKind::Node => UploadPayload::Node(payload),
        })
    }
}

/// Upload each discovered map in order, stopping at the first failure.
///
/// The version is resolved once for the whole batch.
pub(crate) fn run_batch(
    uploader: &Uploader,
    prepared: &Prepared,
    maps: &[PathBuf],
    mut target_for: impl FnMut(&Path) -> MinifiedTarget,
    reporter: &mut dyn Reporter,
) -> Result<()> {
    if maps.is_empty() {
        reporter.warn("No source maps found.");
        return Ok(());
    }

    reporter.debug(&format!("Found {} source map(s):", maps.len()));
    let names: Vec<String> = maps
        .iter()
        .map(|m| virtual_filename(m, &prepared.project_root))
        .collect();
    reporter.debug(&format!("  {}", names.join(", ")));

    let version = uploader.resolve_version(prepared, reporter)?;

    let total = maps.len();
    for (n, map) in maps.iter().enumerate() {
        reporter.info(&format!("{} of {total}", n + 1));
        let target = target_for(map);
        upload_target(&target, &uploader.client, prepared, version.clone(), reporter)?;
    }
    Ok(())
}
