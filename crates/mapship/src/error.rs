use std::io;
use std::path::PathBuf;

use mapship_transport::TransportError;

use crate::files::describe_file_access_error;

/// Everything that can stop an upload.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Rejected input, raised before any disk or network access.
    #[error("{0}")]
    Validation(String),

    #[error("the {what} \"{}\" could not be read. {}", path.display(), describe_file_access_error(source))]
    FileAccess {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("the source map was not valid JSON: \"{location}\"")]
    InvalidSourceMap {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read project manifest \"{}\": {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    #[error(
        "no app version could be detected from a package.json at or above \"{}\"; pass --app-version or --code-bundle-id",
        project_root.display()
    )]
    AppVersionNotDetected { project_root: PathBuf },

    #[error("failed to search for source maps in \"{}\"", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to serialize the transformed source map")]
    Serialize(#[source] serde_json::Error),

    /// A GET against a React Native bundler failed.
    #[error("failed to fetch \"{url}\": {source}")]
    Fetch {
        url: String,
        bundler_url: String,
        entry_point: String,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl UploadError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        UploadError::Validation(msg.into())
    }

    /// The classified transport failure, if that is what stopped the upload.
    pub fn as_transport(&self) -> Option<&TransportError> {
        match self {
            UploadError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T, E = UploadError> = std::result::Result<T, E>;
