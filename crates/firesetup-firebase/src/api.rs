//! Google Cloud Resource Manager / Firebase Management API client
//!
//! Thin typed layer over [`CallExecutor`]. Every call returns `None` when the
//! executor gave up or the response carried no usable data; the provisioner
//! decides what an absence means for the run.

use crate::platform::{AppSpec, Platform};
use firesetup_cloud::{CallExecutor, CallResponse};
use serde::Deserialize;
use serde_json::{Map, Value};

pub const GCP_CRM_BASE_URL: &str = "https://cloudresourcemanager.googleapis.com/v3";
pub const FIREBASE_BASE_URL: &str = "https://firebase.googleapis.com/v1beta1";

/// Lifecycle state reported for an active Firebase project
pub const PROJECT_STATE_ACTIVE: &str = "ACTIVE";

/// API base URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub resource_manager: String,
    pub firebase: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            resource_manager: GCP_CRM_BASE_URL.to_string(),
            firebase: FIREBASE_BASE_URL.to_string(),
        }
    }
}

impl Endpoints {
    fn firebase_project(&self, project_id: &str) -> String {
        format!("{}/projects/{}", self.firebase.trim_end_matches('/'), project_id)
    }

    fn apps(&self, project_id: &str, platform: Platform) -> String {
        format!(
            "{}/{}",
            self.firebase_project(project_id),
            platform.collection()
        )
    }
}

/// Firebase API client
pub struct FirebaseApi {
    executor: CallExecutor,
    endpoints: Endpoints,
}

impl FirebaseApi {
    pub fn new(executor: CallExecutor, endpoints: Endpoints) -> Self {
        Self {
            executor,
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Create a Google Cloud project (`projects.create`)
    pub async fn create_project(
        &self,
        project_id: &str,
        display_name: Option<&str>,
    ) -> Option<CallResponse> {
        let mut body = Map::new();
        body.insert("projectId".into(), Value::from(project_id));
        if let Some(name) = display_name {
            body.insert("displayName".into(), Value::from(name));
        }
        let body = Value::Object(body);

        tracing::info!("Creating Google Cloud project: {}", body);

        let url = format!(
            "{}/projects",
            self.endpoints.resource_manager.trim_end_matches('/')
        );
        self.executor.post(&url, &body).await
    }

    /// Bind Firebase to an existing Google Cloud project (`projects.addFirebase`)
    pub async fn add_firebase(&self, project_id: &str) -> Option<CallResponse> {
        tracing::info!("Adding Firebase to Google Cloud project {}", project_id);

        let url = format!("{}:addFirebase", self.endpoints.firebase_project(project_id));
        self.executor.post(&url, &Value::Object(Map::new())).await
    }

    /// Fetch a Firebase project (`projects.get`)
    pub async fn get_project(&self, project_id: &str) -> Option<FirebaseProject> {
        tracing::info!("Fetching Firebase project {}", project_id);

        self.executor
            .get(&self.endpoints.firebase_project(project_id))
            .await?
            .json()
    }

    /// Register an app (`androidApps.create` / `iosApps.create`)
    pub async fn create_app(&self, project_id: &str, app: &AppSpec) -> Option<CallResponse> {
        let body = app.create_body();

        tracing::info!(
            "Adding {} app {} to Firebase project {}",
            app.platform().display_name(),
            body,
            project_id
        );

        self.executor
            .post(&self.endpoints.apps(project_id, app.platform()), &body)
            .await
    }

    /// List registered apps of one platform (`androidApps.list` / `iosApps.list`)
    pub async fn list_apps(&self, project_id: &str, platform: Platform) -> Option<AppList> {
        tracing::info!(
            "Fetching {} apps of Firebase project {}",
            platform.display_name(),
            project_id
        );

        self.executor
            .get(&self.endpoints.apps(project_id, platform))
            .await?
            .json()
    }

    /// Fetch the configuration artifact of an app (`getConfig`)
    pub async fn get_app_config(
        &self,
        project_id: &str,
        platform: Platform,
        app_id: &str,
    ) -> Option<AppConfigFile> {
        tracing::info!(
            "Fetching configuration of {} app {}",
            platform.display_name(),
            app_id
        );

        let url = format!("{}/{}/config", self.endpoints.apps(project_id, platform), app_id);
        self.executor.get(&url).await?.json()
    }
}

// ============ API Types ============

/// `FirebaseProject` resource
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirebaseProject {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl FirebaseProject {
    /// The project is the requested one and reports `ACTIVE`
    pub fn is_active(&self, project_id: &str) -> bool {
        self.project_id.as_deref() == Some(project_id)
            && self.state.as_deref() == Some(PROJECT_STATE_ACTIVE)
    }
}

/// Response of `androidApps.list` / `iosApps.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppList {
    #[serde(default)]
    pub apps: Vec<AppSummary>,
}

impl AppList {
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

/// One entry of an app listing
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSummary {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub bundle_id: Option<String>,
}

/// Response of `getConfig`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfigFile {
    /// Base64-encoded artifact
    pub config_file_contents: String,
    /// Suggested file name, e.g. `google-services.json`
    pub config_filename: String,
}
