//! Filesystem access: reading inputs, discovering maps, and the path helpers
//! used to build portable names.

use std::io;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Result, UploadError};

const MAP_SUFFIX: &str = ".map";
const CSS_MAP_SUFFIX: &str = ".css.map";

/// Short explanation of a failed file read.
pub fn describe_file_access_error(err: &io::Error) -> &'static str {
    match err.kind() {
        io::ErrorKind::NotFound => "No file exists at the provided path.",
        io::ErrorKind::IsADirectory => "The path contained a directory, not a file.",
        io::ErrorKind::PermissionDenied => {
            "This process did not have sufficient permissions to read the file."
        }
        _ => "Tried at the following location.",
    }
}

/// Read a UTF-8 text file. `what` names the file in the error ("source map",
/// "bundle").
pub fn read_text(path: &Path, what: &'static str) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| UploadError::FileAccess {
        what,
        path: path.to_path_buf(),
        source,
    })
}

/// Lexically resolve `.` and `..` without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            // `..` at the root stays at the root.
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve `path` against `base` the way a shell would, then normalize.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    normalize_path(&base.join(path))
}

/// Absolute, normalized form of the project root.
pub fn absolute_project_root(project_root: &Path) -> Result<PathBuf> {
    std::path::absolute(project_root)
        .map(|p| normalize_path(&p))
        .map_err(|source| UploadError::FileAccess {
            what: "project root",
            path: project_root.to_path_buf(),
            source,
        })
}

/// `path` relative to `base`, joined with forward slashes, or `None` when
/// `path` is outside `base`.
pub fn relative_slash_path(path: &Path, base: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    Some(to_slash(rel))
}

/// Join the components of `path` with `/`.
pub fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push_str(&prefix.as_os_str().to_string_lossy()),
            Component::RootDir => out.push('/'),
            Component::CurDir => {}
            Component::ParentDir | Component::Normal(_) => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&component.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

/// Name shown to the ingestion service for a local file: relative to the
/// project root when possible, otherwise the full path with `/` separators.
pub fn virtual_filename(path: &Path, project_root: &Path) -> String {
    relative_slash_path(path, project_root).unwrap_or_else(|| to_slash(path))
}

/// Sibling bundle of a source map: the map path without its `.map` suffix.
pub fn bundle_path_for(map_path: &Path) -> PathBuf {
    let text = map_path.to_string_lossy();
    match text.strip_suffix(MAP_SUFFIX) {
        Some(stripped) => PathBuf::from(stripped),
        None => map_path.to_path_buf(),
    }
}

fn is_uploadable_map(path: &Path) -> bool {
    let name = path.to_string_lossy();
    name.ends_with(MAP_SUFFIX) && !name.ends_with(CSS_MAP_SUFFIX)
}

/// Find `*.map` files under `dir`, skipping stylesheet maps and, when
/// asked, anything inside `node_modules`.
///
/// Results are in a stable order (directory walk sorted by file name).
pub fn discover_source_maps(dir: &Path, skip_node_modules: bool) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(skip_node_modules
                && entry.depth() > 0
                && entry.file_type().is_dir()
                && entry.file_name() == "node_modules")
        });

    let mut found = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| UploadError::Discovery {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_uploadable_map(entry.path()) {
            found.push(entry.into_path());
        }
    }
    Ok(found)
}
