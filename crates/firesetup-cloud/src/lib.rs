//! firesetup remote-call layer
//!
//! Building blocks for talking to an eventually-consistent cloud backend:
//!
//! - [`CallExecutor`]: one authorized JSON request, retried with exponential
//!   backoff on transient statuses and connection errors
//! - [`poll`]: repeat a fetch with linear backoff until a predicate holds
//! - [`TokenProvider`]: injected bearer token supply
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            firesetup-firebase             │
//! │      (provisioner, typed API calls)       │
//! └──────────┬───────────────────┬───────────┘
//!            │                   │
//! ┌──────────▼──────────┐ ┌──────▼───────────┐
//! │    CallExecutor     │ │      poll        │
//! │ (exponential retry) │ │ (linear backoff) │
//! └──────────┬──────────┘ └──────────────────┘
//!            │
//! ┌──────────▼──────────┐
//! │    TokenProvider    │
//! └─────────────────────┘
//! ```

pub mod auth;
pub mod error;
pub mod executor;
pub mod poller;

// Re-exports
pub use auth::{Credential, CredentialFile, StaticToken, TokenProvider};
pub use error::{CloudError, Result};
pub use executor::{CallExecutor, CallResponse, RETRYABLE_STATUSES, RetryConfig};
pub use poller::{PollSchedule, poll};
