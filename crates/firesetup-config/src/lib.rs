//! Project configuration for firesetup
//!
//! The same flat set of keys comes either from command-line flags or from an
//! external JSON file. Validation runs before any remote call is made.

pub mod error;

pub use error::*;

use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::sync::LazyLock;

/// 6 to 30 lowercase letters, digits or hyphens; starts with a letter, no trailing hyphen
static PROJECT_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]{4,28}[a-z0-9]$").expect("valid regex"));

/// 4 to 30 letters, digits, hyphens, quotes, spaces or exclamation points
static PROJECT_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[A-Za-z0-9\-'" !]{4,30}$"#).expect("valid regex"));

/// Project setup parameters
///
/// Key names match the JSON configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SetupConfig {
    /// Path to the authorized-user credential file
    #[serde(default)]
    pub auth: Option<String>,
    #[serde(default)]
    pub gcp_project_id: Option<String>,
    #[serde(default)]
    pub gcp_project_name: Option<String>,
    #[serde(default)]
    pub android_package: Option<String>,
    #[serde(default)]
    pub android_app_name: Option<String>,
    #[serde(default)]
    pub android_config_path: Option<String>,
    /// Presence enables the iOS stages
    #[serde(default)]
    pub ios_bundle_id: Option<String>,
    #[serde(default)]
    pub ios_app_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub app_store_id: Option<String>,
    #[serde(default)]
    pub ios_config_path: Option<String>,
}

impl SetupConfig {
    /// Load an external JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: SetupConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(config.normalized())
    }

    /// Treat empty values as absent
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        Self {
            auth: clean(self.auth),
            gcp_project_id: clean(self.gcp_project_id),
            gcp_project_name: clean(self.gcp_project_name),
            android_package: clean(self.android_package),
            android_app_name: clean(self.android_app_name),
            android_config_path: clean(self.android_config_path),
            ios_bundle_id: clean(self.ios_bundle_id),
            ios_app_name: clean(self.ios_app_name),
            app_store_id: clean(self.app_store_id),
            ios_config_path: clean(self.ios_config_path),
        }
    }

    pub fn has_ios(&self) -> bool {
        self.ios_bundle_id.is_some()
    }

    /// Check required keys and formats
    ///
    /// `credential_required` is false when a bearer token is supplied
    /// directly and `auth` is not needed.
    pub fn validate(&self, credential_required: bool) -> Result<()> {
        let mut problems = Vec::new();

        if credential_required && self.auth.is_none() {
            problems.push("auth (path to the credential file) is required".to_string());
        }

        match &self.gcp_project_id {
            None => problems.push("gcp_project_id is required".to_string()),
            Some(id) if !is_valid_project_id(id) => problems.push(format!(
                "gcp_project_id {:?} must be 6 to 30 lowercase letters, digits or hyphens, \
                 start with a letter and not end with a hyphen",
                id
            )),
            Some(_) => {}
        }

        if let Some(name) = &self.gcp_project_name
            && !is_valid_project_name(name)
        {
            problems.push(format!(
                "gcp_project_name {:?} must be 4 to 30 letters, digits, hyphens, quotes, \
                 spaces or exclamation points",
                name
            ));
        }

        if self.android_package.is_none() {
            problems.push("android_package is required".to_string());
        }

        if !self.has_ios() {
            let orphans: Vec<&str> = [
                ("ios_app_name", &self.ios_app_name),
                ("app_store_id", &self.app_store_id),
                ("ios_config_path", &self.ios_config_path),
            ]
            .into_iter()
            .filter(|(_, value)| value.is_some())
            .map(|(key, _)| key)
            .collect();

            if !orphans.is_empty() {
                problems.push(format!(
                    "ios_bundle_id is required when using {}",
                    orphans.join(", ")
                ));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}

pub fn is_valid_project_id(id: &str) -> bool {
    PROJECT_ID_PATTERN.is_match(id)
}

pub fn is_valid_project_name(name: &str) -> bool {
    PROJECT_NAME_PATTERN.is_match(name)
}

/// App Store ids are numeric; accept them with or without quotes
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(text) => Ok(Some(text)),
        serde_json::Value::Number(number) => Ok(Some(number.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or a number, found {}",
            other
        ))),
    }
}
