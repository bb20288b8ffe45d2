//! Provisioning workflow
//!
//! Runs the ordered stages that take a project id to downloaded app
//! configuration:
//!
//! ```text
//! CreateProject → BindPlatform → AwaitActivation
//!     → for each app: RegisterApplication → AwaitRegistration → RetrieveArtifact
//! ```
//!
//! Stages never go backwards. Nothing is rolled back when a later stage
//! fails; resources created so far stay in place.

use crate::api::{AppList, FirebaseApi, FirebaseProject};
use crate::artifact;
use crate::error::{FirebaseError, Result};
use crate::platform::{AppSpec, Platform};
use firesetup_cloud::{CallResponse, PollSchedule, poll};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Workflow stage, used for progress logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreateProject,
    BindPlatform,
    AwaitActivation,
    RegisterApplication(Platform),
    AwaitRegistration(Platform),
    RetrieveArtifact(Platform),
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::CreateProject => write!(f, "create-project"),
            Stage::BindPlatform => write!(f, "bind-platform"),
            Stage::AwaitActivation => write!(f, "await-activation"),
            Stage::RegisterApplication(p) => write!(f, "register-{}-app", p),
            Stage::AwaitRegistration(p) => write!(f, "await-{}-registration", p),
            Stage::RetrieveArtifact(p) => write!(f, "retrieve-{}-config", p),
        }
    }
}

/// An app to register and where to put its configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppTarget {
    pub app: AppSpec,
    /// Artifact directory; empty means the working directory
    pub destination: String,
}

impl AppTarget {
    pub fn new(app: AppSpec, destination: Option<String>) -> Self {
        Self {
            app,
            destination: destination.unwrap_or_default(),
        }
    }
}

/// Everything the workflow needs, already validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    pub project_id: String,
    pub project_name: Option<String>,
    pub android: AppTarget,
    /// iOS stages run only when present
    pub ios: Option<AppTarget>,
}

impl ProvisionRequest {
    /// Apps in execution order: Android, then iOS
    pub fn targets(&self) -> impl Iterator<Item = &AppTarget> {
        std::iter::once(&self.android).chain(self.ios.iter())
    }
}

/// A registered app and its downloaded artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedApp {
    pub platform: Platform,
    pub app_id: String,
    pub artifact: PathBuf,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct ProvisionSummary {
    pub project_id: String,
    pub apps: Vec<ProvisionedApp>,
    pub duration_ms: u64,
}

/// Drives the provisioning stages against the Firebase API
pub struct Provisioner {
    api: FirebaseApi,
    activation: PollSchedule,
    registration: PollSchedule,
}

impl Provisioner {
    /// Provisioner with one-second poll units
    pub fn new(api: FirebaseApi) -> Self {
        let unit = Duration::from_secs(1);
        Self {
            api,
            activation: PollSchedule::activation(unit),
            registration: PollSchedule::registration(unit),
        }
    }

    pub fn with_schedules(mut self, activation: PollSchedule, registration: PollSchedule) -> Self {
        self.activation = activation;
        self.registration = registration;
        self
    }

    /// Run every stage for `request`
    pub async fn run(&self, request: &ProvisionRequest) -> Result<ProvisionSummary> {
        let start = Instant::now();
        let project_id = request.project_id.as_str();

        self.create_project(project_id, request.project_name.as_deref())
            .await;
        self.bind_platform(project_id).await;
        self.await_activation(project_id).await?;

        let mut apps = Vec::new();
        for target in request.targets() {
            apps.push(self.provision_app(project_id, target).await?);
        }

        Ok(ProvisionSummary {
            project_id: project_id.to_string(),
            apps,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Stages 4–6 for one app
    pub async fn provision_app(
        &self,
        project_id: &str,
        target: &AppTarget,
    ) -> Result<ProvisionedApp> {
        let platform = target.app.platform();

        self.register_app(project_id, &target.app).await;
        let app_id = self.await_registration(project_id, platform).await?;
        let artifact = self
            .retrieve_artifact(project_id, platform, &app_id, &target.destination)
            .await?;

        Ok(ProvisionedApp {
            platform,
            app_id,
            artifact,
        })
    }

    pub async fn create_project(&self, project_id: &str, project_name: Option<&str>) {
        let stage = Stage::CreateProject;
        enter(stage);
        let response = self.api.create_project(project_id, project_name).await;
        log_outcome(stage, response);
    }

    pub async fn bind_platform(&self, project_id: &str) {
        let stage = Stage::BindPlatform;
        enter(stage);
        let response = self.api.add_firebase(project_id).await;
        log_outcome(stage, response);
    }

    /// Block until the Firebase project reports `ACTIVE`
    pub async fn await_activation(&self, project_id: &str) -> Result<()> {
        enter(Stage::AwaitActivation);

        poll(
            &format!("Activation of Firebase project {}", project_id),
            &self.activation,
            || self.api.get_project(project_id),
            |project: &Option<FirebaseProject>| {
                project.as_ref().is_some_and(|p| p.is_active(project_id))
            },
        )
        .await?;

        tracing::info!("Firebase project {} is active", project_id);
        Ok(())
    }

    pub async fn register_app(&self, project_id: &str, app: &AppSpec) {
        let stage = Stage::RegisterApplication(app.platform());
        enter(stage);
        let response = self.api.create_app(project_id, app).await;
        log_outcome(stage, response);
    }

    /// Block until an app of `platform` is listed, then return its id
    ///
    /// The first listed app is taken as the one just registered; a project
    /// is expected to hold one app per platform.
    pub async fn await_registration(&self, project_id: &str, platform: Platform) -> Result<String> {
        enter(Stage::AwaitRegistration(platform));

        let listing = poll(
            &format!(
                "Registration of {} app in project {}",
                platform.display_name(),
                project_id
            ),
            &self.registration,
            || self.api.list_apps(project_id, platform),
            |apps: &Option<AppList>| apps.as_ref().is_some_and(|l| !l.is_empty()),
        )
        .await?;

        let apps = listing.map(|l| l.apps).unwrap_or_default();
        if apps.len() > 1 {
            tracing::warn!(
                "{} {} apps listed in project {}; using the first one",
                apps.len(),
                platform.display_name(),
                project_id
            );
        }

        let app_id = apps
            .into_iter()
            .next()
            .and_then(|app| app.app_id)
            .ok_or_else(|| FirebaseError::MissingAppId {
                platform,
                project_id: project_id.to_string(),
            })?;

        tracing::info!("{} app id: {}", platform.display_name(), app_id);
        Ok(app_id)
    }

    /// Download the app configuration and write it under `destination`
    pub async fn retrieve_artifact(
        &self,
        project_id: &str,
        platform: Platform,
        app_id: &str,
        destination: &str,
    ) -> Result<PathBuf> {
        enter(Stage::RetrieveArtifact(platform));

        let config = self
            .api
            .get_app_config(project_id, platform, app_id)
            .await
            .ok_or_else(|| FirebaseError::ArtifactUnavailable {
                platform,
                app_id: app_id.to_string(),
            })?;

        artifact::save(
            &config.config_file_contents,
            &config.config_filename,
            platform,
            destination,
        )
        .await
    }
}

fn enter(stage: Stage) {
    tracing::info!(stage = %stage, "Entering stage {}", stage);
}

/// Fire-and-forget stages only log; the next poll is the gate
fn log_outcome(stage: Stage, response: Option<CallResponse>) {
    match response {
        Some(r) if r.is_success() => {
            tracing::debug!(stage = %stage, "Request accepted: {}", r.text());
        }
        Some(r) => {
            tracing::warn!(
                stage = %stage,
                "Request returned {}: {}; continuing",
                r.status(),
                r.text()
            );
        }
        None => {
            tracing::warn!(stage = %stage, "Request got no response; continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::CreateProject.to_string(), "create-project");
        assert_eq!(
            Stage::AwaitRegistration(Platform::Ios).to_string(),
            "await-ios-registration"
        );
        assert_eq!(
            Stage::RetrieveArtifact(Platform::Android).to_string(),
            "retrieve-android-config"
        );
    }

    #[test]
    fn test_targets_order() {
        let request = ProvisionRequest {
            project_id: "my-test-project-123".into(),
            project_name: None,
            android: AppTarget::new(AppSpec::android("com.test.app"), None),
            ios: Some(AppTarget::new(
                AppSpec::ios("com.test.app"),
                Some("ios/".into()),
            )),
        };

        let platforms: Vec<_> = request.targets().map(|t| t.app.platform()).collect();
        assert_eq!(platforms, [Platform::Android, Platform::Ios]);
        assert_eq!(request.android.destination, "");
    }

    #[test]
    fn test_targets_without_ios() {
        let request = ProvisionRequest {
            project_id: "my-test-project-123".into(),
            project_name: None,
            android: AppTarget::new(AppSpec::android("com.test.app"), None),
            ios: None,
        };

        assert_eq!(request.targets().count(), 1);
    }
}
