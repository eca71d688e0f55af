//! Minimal source map model.
//!
//! Only `sources`, `sourcesContent` and `sections` are interpreted. Every
//! other member is carried through `extra` so it survives re-serialization.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, UploadError};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceMapDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Value>,
    #[serde(
        rename = "sourcesContent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sources_content: Option<Vec<Option<String>>>,
    /// Index map sections. Only one level is ever descended into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<Section>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<Box<SourceMapDocument>>,
    /// `offset`, `url`, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SourceMapDocument {
    /// Parse map text. `location` names the file or URL in the error.
    pub fn parse(text: &str, location: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|source| UploadError::InvalidSourceMap {
            location: location.to_string(),
            source,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(UploadError::Serialize)
    }

    /// Mutable access to each map in `sections`.
    pub(crate) fn section_maps_mut(&mut self) -> impl Iterator<Item = &mut SourceMapDocument> {
        self.sections
            .iter_mut()
            .flatten()
            .filter_map(|section| section.map.as_deref_mut())
    }
}
