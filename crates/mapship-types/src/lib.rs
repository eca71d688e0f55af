//! Core domain types for mapship.
//!
//! This crate provides the types shared by the transport, configuration and
//! upload crates: target platforms, the version representation attached to
//! every upload, file attachments, and the [`Reporter`] logging capability.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mobile platform a React Native bundle was built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    /// Wire name, as sent in the `platform` form field and bundler query.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "android" => Ok(Platform::Android),
            "ios" => Ok(Platform::Ios),
            other => Err(format!(
                "platform must be either \"android\" or \"ios\", got \"{other}\""
            )),
        }
    }
}

/// Platform-specific build identifier that accompanies an app version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PlatformField {
    /// Android `versionCode`.
    AppVersionCode(String),
    /// iOS `CFBundleVersion`.
    AppBundleVersion(String),
}

impl PlatformField {
    /// The only platform this field is valid for.
    pub fn platform(&self) -> Platform {
        match self {
            PlatformField::AppVersionCode(_) => Platform::Android,
            PlatformField::AppBundleVersion(_) => Platform::Ios,
        }
    }

    /// Multipart field name.
    pub fn field_name(&self) -> &'static str {
        match self {
            PlatformField::AppVersionCode(_) => "appVersionCode",
            PlatformField::AppBundleVersion(_) => "appBundleVersion",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            PlatformField::AppVersionCode(v) | PlatformField::AppBundleVersion(v) => v,
        }
    }
}

/// Identifies which build a source map belongs to.
///
/// An app version and a code bundle id are mutually exclusive, and a
/// platform field can only ride along with an app version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Version {
    AppVersion {
        app_version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        platform_field: Option<PlatformField>,
    },
    CodeBundleId {
        code_bundle_id: String,
    },
}

impl Version {
    pub fn app_version(value: impl Into<String>) -> Self {
        Version::AppVersion {
            app_version: value.into(),
            platform_field: None,
        }
    }

    pub fn code_bundle_id(value: impl Into<String>) -> Self {
        Version::CodeBundleId {
            code_bundle_id: value.into(),
        }
    }

    /// `(field name, value)` pairs to append to a multipart form.
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            Version::AppVersion {
                app_version,
                platform_field,
            } => {
                let mut fields = vec![("appVersion", app_version.as_str())];
                if let Some(field) = platform_field {
                    fields.push((field.field_name(), field.value()));
                }
                fields
            }
            Version::CodeBundleId { code_bundle_id } => {
                vec![("codeBundleId", code_bundle_id.as_str())]
            }
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::AppVersion {
                app_version,
                platform_field: None,
            } => write!(f, "app version {app_version}"),
            Version::AppVersion {
                app_version,
                platform_field: Some(field),
            } => write!(
                f,
                "app version {app_version} ({} {})",
                field.field_name(),
                field.value()
            ),
            Version::CodeBundleId { code_bundle_id } => {
                write!(f, "code bundle id {code_bundle_id}")
            }
        }
    }
}

/// A file sent as one multipart part.
///
/// `filename` is a virtual name shown to the ingestion service (a path
/// relative to the project root, or the URL a file was fetched from), never
/// the absolute path it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    pub filename: String,
    pub content: String,
}

impl FileAttachment {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Leveled logging capability handed to every component.
///
/// Implementors only need `info`, `warn` and `error`; the remaining levels
/// default to being dropped (`trace`, `debug`) or forwarded (`success`,
/// `fatal`).
pub trait Reporter {
    fn trace(&mut self, _msg: &str) {}
    fn debug(&mut self, _msg: &str) {}
    fn info(&mut self, msg: &str);
    fn success(&mut self, msg: &str) {
        self.info(msg);
    }
    fn warn(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
    fn fatal(&mut self, msg: &str) {
        self.error(msg);
    }
}

/// Reporter that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn info(&mut self, _msg: &str) {}
    fn warn(&mut self, _msg: &str) {}
    fn error(&mut self, _msg: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_parses_wire_names() {
        assert_eq!("android".parse::<Platform>(), Ok(Platform::Android));
        assert_eq!("ios".parse::<Platform>(), Ok(Platform::Ios));
        assert!("windows".parse::<Platform>().is_err());
        assert_eq!(Platform::Ios.to_string(), "ios");
    }

    #[test]
    fn platform_field_knows_its_platform() {
        let code = PlatformField::AppVersionCode("42".to_string());
        assert_eq!(code.platform(), Platform::Android);
        assert_eq!(code.field_name(), "appVersionCode");

        let bundle = PlatformField::AppBundleVersion("1.0.3".to_string());
        assert_eq!(bundle.platform(), Platform::Ios);
        assert_eq!(bundle.value(), "1.0.3");
    }

    #[test]
    fn app_version_form_fields_include_platform_field() {
        let version = Version::AppVersion {
            app_version: "2.1.0".to_string(),
            platform_field: Some(PlatformField::AppVersionCode("210".to_string())),
        };
        assert_eq!(
            version.form_fields(),
            vec![("appVersion", "2.1.0"), ("appVersionCode", "210")]
        );
    }

    #[test]
    fn code_bundle_id_form_fields_are_exclusive() {
        let version = Version::code_bundle_id("bundle-7");
        assert_eq!(version.form_fields(), vec![("codeBundleId", "bundle-7")]);
    }

    #[test]
    fn version_serializes_with_tagged_representation() {
        let version = Version::app_version("1.2.3");
        let json = serde_json::to_string(&version).expect("serialize");
        assert!(json.contains("\"type\":\"app_version\""));
        assert!(!json.contains("platform_field"));

        let parsed: Version = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, version);
    }

    #[test]
    fn version_display_is_human_readable() {
        assert_eq!(Version::app_version("1.0.0").to_string(), "app version 1.0.0");
        assert_eq!(
            Version::code_bundle_id("abc").to_string(),
            "code bundle id abc"
        );
    }

    #[derive(Default)]
    struct CollectingReporter {
        infos: Vec<String>,
        errors: Vec<String>,
    }

    impl Reporter for CollectingReporter {
        fn info(&mut self, msg: &str) {
            self.infos.push(msg.to_string());
        }

        fn warn(&mut self, _msg: &str) {}

        fn error(&mut self, msg: &str) {
            self.errors.push(msg.to_string());
        }
    }

    #[test]
    fn reporter_default_levels_forward_or_drop() {
        let mut reporter = CollectingReporter::default();
        reporter.debug("dropped");
        reporter.trace("dropped");
        reporter.success("done");
        reporter.fatal("boom");

        assert_eq!(reporter.infos, vec!["done".to_string()]);
        assert_eq!(reporter.errors, vec!["boom".to_string()]);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: a code bundle id never emits app version fields.
            #[test]
            fn code_bundle_id_never_emits_app_version(id in "[a-zA-Z0-9._-]{1,32}") {
                let version = Version::code_bundle_id(id.clone());
                let fields = version.form_fields();
                prop_assert_eq!(fields.len(), 1);
                prop_assert_eq!(fields[0], ("codeBundleId", id.as_str()));
            }
        }
    }
}
