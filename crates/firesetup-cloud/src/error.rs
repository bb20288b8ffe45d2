//! Cloud call error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the remote-call layer
///
/// The call executor itself never returns these for a failed HTTP exchange;
/// a failed exchange is a logged absence. These cover setup, credentials and
/// convergence.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(#[from] reqwest::Error),

    #[error("Failed to read credential file {path}: {source}")]
    CredentialRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid credential file {path}: {source}")]
    CredentialParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Credential in {path} expired at {expired_at}; refresh it and run again")]
    CredentialExpired { path: PathBuf, expired_at: String },

    #[error("{operation} did not converge after {attempts} attempts")]
    DidNotConverge { operation: String, attempts: u32 },
}

pub type Result<T> = std::result::Result<T, CloudError>;
