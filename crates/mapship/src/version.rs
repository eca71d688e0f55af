//! Version resolution.
//!
//! Raw version flags are checked once, up front, by [`VersionInput::validate`]
//! which produces a [`VersionRequest`]. Only detection touches the disk, and
//! that happens later in [`VersionRequest::resolve`].

use std::path::{Path, PathBuf};

use mapship_types::{Platform, PlatformField, Reporter, Version};

use crate::error::{Result, UploadError};

/// Which upload the version is for; decides which platform fields are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionTarget {
    Browser,
    Node,
    ReactNative(Platform),
}

/// Version flags exactly as the caller supplied them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionInput {
    pub app_version: Option<String>,
    pub code_bundle_id: Option<String>,
    pub app_version_code: Option<String>,
    pub app_bundle_version: Option<String>,
    pub detect_app_version: bool,
}

/// A validated version request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRequest {
    /// Upload without a version.
    Unversioned,
    Explicit(Version),
    /// Read the version from the nearest `package.json`.
    Detect { platform_field: Option<PlatformField> },
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl VersionInput {
    pub fn app_version(value: impl Into<String>) -> Self {
        Self {
            app_version: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn code_bundle_id(value: impl Into<String>) -> Self {
        Self {
            code_bundle_id: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn detect() -> Self {
        Self {
            detect_app_version: true,
            ..Self::default()
        }
    }

    /// Check the combination of flags for `target` without any I/O.
    pub fn validate(&self, target: VersionTarget) -> Result<VersionRequest> {
        let app_version = present(&self.app_version);
        let code_bundle_id = present(&self.code_bundle_id);
        let version_code = present(&self.app_version_code);
        let bundle_version = present(&self.app_bundle_version);

        if code_bundle_id.is_some() {
            if app_version.is_some() {
                return Err(UploadError::validation(
                    "--app-version and --code-bundle-id cannot both be given",
                ));
            }
            if self.detect_app_version {
                return Err(UploadError::validation(
                    "--detect-app-version and --code-bundle-id cannot both be given",
                ));
            }
            if bundle_version.is_some() {
                return Err(UploadError::validation(
                    "--app-bundle-version and --code-bundle-id cannot both be given",
                ));
            }
            if version_code.is_some() {
                return Err(UploadError::validation(
                    "--app-version-code and --code-bundle-id cannot both be given",
                ));
            }
        }

        let platform_field = match target {
            VersionTarget::Browser | VersionTarget::Node => {
                if version_code.is_some() || bundle_version.is_some() {
                    return Err(UploadError::validation(
                        "--app-version-code and --app-bundle-version are only supported for React Native uploads",
                    ));
                }
                None
            }
            VersionTarget::ReactNative(platform) => {
                match (platform, version_code, bundle_version) {
                    (Platform::Ios, Some(_), _) => {
                        return Err(UploadError::validation(
                            "--app-version-code cannot be given with --platform \"ios\"",
                        ));
                    }
                    (Platform::Android, _, Some(_)) => {
                        return Err(UploadError::validation(
                            "--app-bundle-version cannot be given with --platform \"android\"",
                        ));
                    }
                    (Platform::Android, Some(code), None) => {
                        Some(PlatformField::AppVersionCode(code.to_string()))
                    }
                    (Platform::Ios, None, Some(bundle)) => {
                        Some(PlatformField::AppBundleVersion(bundle.to_string()))
                    }
                    _ => None,
                }
            }
        };

        if let Some(id) = code_bundle_id {
            return Ok(VersionRequest::Explicit(Version::code_bundle_id(id)));
        }
        if let Some(value) = app_version {
            return Ok(VersionRequest::Explicit(Version::AppVersion {
                app_version: value.to_string(),
                platform_field,
            }));
        }
        if self.detect_app_version {
            return Ok(VersionRequest::Detect { platform_field });
        }
        if matches!(target, VersionTarget::ReactNative(_)) {
            return Err(UploadError::validation(
                "Either --app-version or --code-bundle-id must be given (or pass --detect-app-version)",
            ));
        }
        if platform_field.is_some() {
            return Err(UploadError::validation(
                "--app-version-code and --app-bundle-version require --app-version",
            ));
        }
        Ok(VersionRequest::Unversioned)
    }
}

impl VersionRequest {
    /// Produce the version to attach, reading the project manifest when
    /// detection was requested.
    pub fn resolve(
        &self,
        project_root: &Path,
        lookup: &dyn ManifestLookup,
        reporter: &mut dyn Reporter,
    ) -> Result<Option<Version>> {
        match self {
            VersionRequest::Unversioned => Ok(None),
            VersionRequest::Explicit(version) => Ok(Some(version.clone())),
            VersionRequest::Detect { platform_field } => {
                let detected = lookup.find_version(project_root)?.ok_or_else(|| {
                    UploadError::AppVersionNotDetected {
                        project_root: project_root.to_path_buf(),
                    }
                })?;
                reporter.debug(&format!(
                    "Detected appVersion \"{}\" from {}",
                    detected.version,
                    detected.manifest.display()
                ));
                Ok(Some(Version::AppVersion {
                    app_version: detected.version,
                    platform_field: platform_field.clone(),
                }))
            }
        }
    }
}

/// A version read from a project manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedVersion {
    pub version: String,
    pub manifest: PathBuf,
}

/// Finds the version declared by the manifest nearest to a directory.
pub trait ManifestLookup {
    /// `Ok(None)` when there is no manifest or it declares no version.
    fn find_version(&self, start: &Path) -> Result<Option<DetectedVersion>>;
}

/// Walks up from the start directory to the first `package.json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PackageJsonLookup;

pub const PACKAGE_JSON: &str = "package.json";

impl ManifestLookup for PackageJsonLookup {
    fn find_version(&self, start: &Path) -> Result<Option<DetectedVersion>> {
        let Some(manifest) = start
            .ancestors()
            .map(|dir| dir.join(PACKAGE_JSON))
            .find(|candidate| candidate.is_file())
        else {
            return Ok(None);
        };

        let text = std::fs::read_to_string(&manifest).map_err(|e| UploadError::Manifest {
            path: manifest.clone(),
            reason: e.to_string(),
        })?;
        let json: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| UploadError::Manifest {
                path: manifest.clone(),
                reason: e.to_string(),
            })?;

        Ok(json
            .get("version")
            .and_then(serde_json::Value::as_str)
            .filter(|v| !v.is_empty())
            .map(|version| DetectedVersion {
                version: version.to_string(),
                manifest,
            }))
    }
}
