//! Google Cloud / Firebase provisioning for firesetup
//!
//! Creates a Google Cloud project, adds Firebase to it, registers Android
//! and iOS apps and downloads their configuration files
//! (`google-services.json`, `GoogleService-Info.plist`).
//!
//! # Example
//!
//! ```ignore
//! use firesetup_cloud::{CallExecutor, CredentialFile};
//! use firesetup_firebase::{AppSpec, AppTarget, Endpoints, FirebaseApi, ProvisionRequest, Provisioner};
//! use std::sync::Arc;
//!
//! let executor = CallExecutor::new(Arc::new(CredentialFile::new("token.json")))?;
//! let provisioner = Provisioner::new(FirebaseApi::new(executor, Endpoints::default()));
//!
//! let summary = provisioner
//!     .run(&ProvisionRequest {
//!         project_id: "my-test-project-123".into(),
//!         project_name: None,
//!         android: AppTarget::new(AppSpec::android("com.test.app.project"), None),
//!         ios: None,
//!     })
//!     .await?;
//! ```

pub mod api;
pub mod artifact;
pub mod error;
pub mod platform;
pub mod provisioner;

pub use api::{
    AppConfigFile, AppList, AppSummary, Endpoints, FIREBASE_BASE_URL, FirebaseApi,
    FirebaseProject, GCP_CRM_BASE_URL,
};
pub use error::{FirebaseError, Result};
pub use platform::{AppSpec, Platform};
pub use provisioner::{
    AppTarget, ProvisionRequest, ProvisionSummary, ProvisionedApp, Provisioner, Stage,
};
