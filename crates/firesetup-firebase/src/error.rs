//! Firebase provisioning error types

use crate::platform::Platform;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FirebaseError {
    #[error("Configuration for {platform} app {app_id} could not be fetched")]
    ArtifactUnavailable { platform: Platform, app_id: String },

    #[error("Listing of {platform} apps in project {project_id} has no usable app id")]
    MissingAppId {
        platform: Platform,
        project_id: String,
    },

    #[error("Invalid artifact filename: {0:?}")]
    InvalidFilename(String),

    #[error("Artifact payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Android artifact is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("iOS artifact is not a valid property list: {0}")]
    Plist(#[from] plist::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Cloud(#[from] firesetup_cloud::CloudError),
}

pub type Result<T> = std::result::Result<T, FirebaseError>;
