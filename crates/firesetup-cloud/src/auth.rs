//! Bearer token supply
//!
//! The remote-call layer only ever asks for the current token. Obtaining
//! and refreshing credentials happens outside this crate.

use crate::error::{CloudError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Source of the bearer token attached to every remote call
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns the token to use for the next request
    async fn access_token(&self) -> Result<String>;
}

/// A fixed token, e.g. from `gcloud auth print-access-token`
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Authorized-user credential as written by the external OAuth flow
#[derive(Clone, Deserialize)]
pub struct Credential {
    /// Current access token
    #[serde(alias = "access_token")]
    pub token: String,

    /// Refresh token, used only by the external refresh flow
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Expiry of `token`; absent means the supplier did not record one
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl Credential {
    pub fn is_expired(&self) -> bool {
        self.expiry.is_some_and(|expiry| Utc::now() >= expiry)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"***")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// Reads the credential file on every request so an external refresh is
/// picked up mid-run
#[derive(Debug, Clone)]
pub struct CredentialFile {
    path: PathBuf,
}

impl CredentialFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and parse the credential without checking expiry
    pub async fn load(&self) -> Result<Credential> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| CloudError::CredentialRead {
                path: self.path.clone(),
                source,
            })?;

        serde_json::from_str(&content).map_err(|source| CloudError::CredentialParse {
            path: self.path.clone(),
            source,
        })
    }
}

#[async_trait]
impl TokenProvider for CredentialFile {
    async fn access_token(&self) -> Result<String> {
        let credential = self.load().await?;

        if credential.is_expired() {
            let expired_at = credential
                .expiry
                .map(|e| e.to_rfc3339())
                .unwrap_or_default();
            return Err(CloudError::CredentialExpired {
                path: self.path.clone(),
                expired_at,
            });
        }

        Ok(credential.token)
    }
}
