use mapship_types::{FileAttachment, Platform, Version};
use reqwest::blocking::multipart::{Form, Part};

use crate::error::{ErrorCode, TransportError};

const SOURCE_MAP_MIME: &str = "application/json";
const BUNDLE_MIME: &str = "application/javascript";

/// Fields shared by the Browser and Node uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinifiedPayload {
    pub api_key: String,
    pub overwrite: bool,
    pub version: Option<Version>,
    /// URL (or path) the minified file is served from at runtime.
    pub minified_url: String,
    pub source_map: FileAttachment,
    pub minified_file: Option<FileAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactNativePayload {
    pub api_key: String,
    pub overwrite: bool,
    pub platform: Platform,
    pub dev: bool,
    pub version: Version,
    pub source_map: FileAttachment,
    pub bundle: FileAttachment,
}

/// Body of one upload, tagged by target platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPayload {
    Browser(MinifiedPayload),
    Node(MinifiedPayload),
    ReactNative(ReactNativePayload),
}

impl UploadPayload {
    pub fn source_map(&self) -> &FileAttachment {
        match self {
            UploadPayload::Browser(p) | UploadPayload::Node(p) => &p.source_map,
            UploadPayload::ReactNative(p) => &p.source_map,
        }
    }

    pub fn bundle(&self) -> Option<&FileAttachment> {
        match self {
            UploadPayload::Browser(p) | UploadPayload::Node(p) => p.minified_file.as_ref(),
            UploadPayload::ReactNative(p) => Some(&p.bundle),
        }
    }

    /// Text fields in the order they are written to the form.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        match self {
            UploadPayload::Browser(p) | UploadPayload::Node(p) => {
                fields.push(("apiKey", p.api_key.clone()));
                if let Some(version) = &p.version {
                    fields.extend(version.form_fields().into_iter().map(|(k, v)| (k, v.to_string())));
                }
                fields.push(("minifiedUrl", p.minified_url.clone()));
                // The service treats any value as true.
                if p.overwrite {
                    fields.push(("overwrite", "true".to_string()));
                }
            }
            UploadPayload::ReactNative(p) => {
                fields.push(("apiKey", p.api_key.clone()));
                fields.push(("platform", p.platform.as_str().to_string()));
                fields.push(("overwrite", p.overwrite.to_string()));
                fields.push(("dev", p.dev.to_string()));
                fields.extend(
                    p.version
                        .form_fields()
                        .into_iter()
                        .map(|(k, v)| (k, v.to_string())),
                );
            }
        }
        fields
    }

    /// Encode as a multipart form. Called once per attempt since a form is
    /// consumed by the request.
    pub fn to_form(&self) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for (name, value) in self.text_fields() {
            form = form.text(name, value);
        }

        let (map_field, bundle_field) = match self {
            UploadPayload::Browser(_) | UploadPayload::Node(_) => ("sourceMap", "minifiedFile"),
            UploadPayload::ReactNative(_) => ("sourceMap", "bundle"),
        };

        form = form.part(map_field, file_part(self.source_map(), SOURCE_MAP_MIME)?);
        if let Some(bundle) = self.bundle() {
            form = form.part(bundle_field, file_part(bundle, BUNDLE_MIME)?);
        }
        Ok(form)
    }
}

fn file_part(file: &FileAttachment, mime: &str) -> Result<Part, TransportError> {
    Part::text(file.content.clone())
        .file_name(file.filename.clone())
        .mime_str(mime)
        .map_err(|e| {
            TransportError::new(ErrorCode::Unknown, format!("invalid content type {mime}"))
                .with_cause(e)
        })
}

#[cfg(test)]
mod tests {
    use mapship_types::PlatformField;

    use super::*;

    fn browser(overwrite: bool) -> MinifiedPayload {
        MinifiedPayload {
            api_key: "123".to_string(),
            overwrite,
            version: Some(Version::app_version("1.2.3")),
            minified_url: "https://example.com/app.js".to_string(),
            source_map: FileAttachment::new("dist/app.js.map", "{}"),
            minified_file: None,
        }
    }

    #[test]
    fn browser_fields_omit_overwrite_when_false() {
        let fields = UploadPayload::Browser(browser(false)).text_fields();
        let names: Vec<_> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(names, vec!["apiKey", "appVersion", "minifiedUrl"]);

        let fields = UploadPayload::Browser(browser(true)).text_fields();
        assert!(fields.contains(&("overwrite", "true".to_string())));
    }

    #[test]
    fn minified_payload_carries_code_bundle_id() {
        let mut payload = browser(false);
        payload.version = Some(Version::code_bundle_id("b-1"));
        let fields = UploadPayload::Node(payload).text_fields();
        assert!(fields.contains(&("codeBundleId", "b-1".to_string())));
        assert!(!fields.iter().any(|(k, _)| *k == "appVersion"));
    }

    #[test]
    fn react_native_fields_always_send_flags() {
        let payload = UploadPayload::ReactNative(ReactNativePayload {
            api_key: "abc".to_string(),
            overwrite: false,
            platform: Platform::Android,
            dev: true,
            version: Version::AppVersion {
                app_version: "3.0.0".to_string(),
                platform_field: Some(PlatformField::AppVersionCode("30".to_string())),
            },
            source_map: FileAttachment::new("index.android.bundle.map", "{}"),
            bundle: FileAttachment::new("index.android.bundle", "var a;"),
        });

        assert_eq!(
            payload.text_fields(),
            vec![
                ("apiKey", "abc".to_string()),
                ("platform", "android".to_string()),
                ("overwrite", "false".to_string()),
                ("dev", "true".to_string()),
                ("appVersion", "3.0.0".to_string()),
                ("appVersionCode", "30".to_string()),
            ]
        );
        assert_eq!(payload.bundle().map(|b| b.filename.as_str()), Some("index.android.bundle"));
    }

    #[test]
    fn form_builds_with_optional_bundle() {
        let mut payload = browser(false);
        assert!(UploadPayload::Browser(payload.clone()).to_form().is_ok());

        payload.minified_file = Some(FileAttachment::new("dist/app.js", "var a;"));
        let form = UploadPayload::Browser(payload).to_form().expect("form");
        assert!(!form.boundary().is_empty());
    }
}
