//! Source map path normalization.
//!
//! Two passes run in order over the top-level map and each `sections[i].map`:
//! [`fill_sources_content`] embeds the text of every readable source, then
//! [`strip_project_root`] rewrites source paths relative to the project root
//! so the map no longer depends on the machine it was built on.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use mapship_types::Reporter;
use regex::{NoExpand, Regex};

use crate::files::{relative_slash_path, resolve_path};
use crate::sourcemap::SourceMapDocument;

/// Bundler-internal modules such as `webpack:///webpack/bootstrap`.
static SENTINEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^webpack://(.*)/webpack").expect("valid sentinel regex"));

/// `webpack://<namespace>/./`, which stands for the project root.
static NAMESPACE_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"webpack://.*/\./").expect("valid namespace regex"));

/// Whether `source` names a synthetic bundler module with no file behind it.
pub fn is_sentinel(source: &str) -> bool {
    SENTINEL_RE.is_match(source)
}

/// Absolute path a source entry refers to.
///
/// A `webpack://<namespace>/./` prefix is replaced by the project root, and
/// the result is resolved against the directory containing the map.
pub fn resolve_source(source: &str, map_dir: &Path, project_root: &Path) -> PathBuf {
    let root = format!("{}/", project_root.to_string_lossy());
    let rewritten = NAMESPACE_PREFIX_RE.replacen(source, 1, NoExpand(&root));
    resolve_path(map_dir, Path::new(rewritten.as_ref()))
}

/// Project-relative form of one source entry, or `None` when the entry is a
/// sentinel or resolves outside the project root (it is then kept as is).
pub fn strip_source(source: &str, map_dir: &Path, project_root: &Path) -> Option<String> {
    if is_sentinel(source) {
        return None;
    }
    let resolved = resolve_source(source, map_dir, project_root);
    relative_slash_path(&resolved, project_root)
}

fn map_dir(map_path: &Path) -> &Path {
    map_path.parent().unwrap_or_else(|| Path::new(""))
}

/// Populate `sourcesContent` so it lines up 1:1 with `sources`.
///
/// Unreadable sources and sentinels become `null`; a map whose
/// `sourcesContent` already has the right length is left alone.
pub fn fill_sources_content(
    doc: &mut SourceMapDocument,
    map_path: &Path,
    project_root: &Path,
    reporter: &mut dyn Reporter,
) {
    reporter.debug("Ensuring sourcesContent field is populated");
    fill_one(doc, map_path, project_root, reporter);
    for section in doc.section_maps_mut() {
        fill_one(section, map_path, project_root, reporter);
    }
}

fn fill_one(
    map: &mut SourceMapDocument,
    map_path: &Path,
    project_root: &Path,
    reporter: &mut dyn Reporter,
) {
    let Some(sources) = &map.sources else {
        return;
    };
    if map.sources_content.as_ref().map(Vec::len) == Some(sources.len()) {
        return;
    }

    let dir = map_dir(map_path);
    let content = sources
        .iter()
        .map(|source| {
            if is_sentinel(source) {
                return None;
            }
            let path = resolve_source(source, dir, project_root);
            match std::fs::read_to_string(&path) {
                Ok(text) => Some(text),
                Err(_) => {
                    reporter.warn(&format!(
                        "No source found for \"{source}\" when searching relative to the source map \"{}\"",
                        map_path.display()
                    ));
                    None
                }
            }
        })
        .collect();

    map.sources_content = Some(content);
}

/// Rewrite every non-sentinel source relative to the project root with `/`
/// separators.
///
/// Stripped sources are resolved against the map's directory on a second
/// pass, so this is only a fixed point for maps at the project root. Apply
/// it once per document.
pub fn strip_project_root(
    doc: &mut SourceMapDocument,
    map_path: &Path,
    project_root: &Path,
    reporter: &mut dyn Reporter,
) {
    reporter.debug("Stripping project root from sources");
    let dir = map_dir(map_path);
    strip_one(doc, dir, project_root);
    for section in doc.section_maps_mut() {
        strip_one(section, dir, project_root);
    }
}

fn strip_one(map: &mut SourceMapDocument, map_dir: &Path, project_root: &Path) {
    let Some(sources) = map.sources.as_mut() else {
        return;
    };
    for source in sources.iter_mut() {
        if let Some(stripped) = strip_source(source, map_dir, project_root) {
            *source = stripped;
        }
    }
}

/// Both passes, in the required order.
pub fn transform_source_map(
    doc: &mut SourceMapDocument,
    map_path: &Path,
    project_root: &Path,
    reporter: &mut dyn Reporter,
) {
    reporter.info("Applying transformations to source map");
    fill_sources_content(doc, map_path, project_root, reporter);
    strip_project_root(doc, map_path, project_root, reporter);
}
