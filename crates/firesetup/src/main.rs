mod request;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use firesetup_cloud::{CallExecutor, CredentialFile, PollSchedule, StaticToken, TokenProvider};
use firesetup_config::SetupConfig;
use firesetup_firebase::{
    Endpoints, FIREBASE_BASE_URL, FirebaseApi, GCP_CRM_BASE_URL, ProvisionSummary, Provisioner,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "firesetup", version)]
#[command(
    about = "Create a Google Cloud project with Firebase and download app configuration",
    long_about = None
)]
struct Cli {
    /// Authorized-user credential file (JSON with a bearer token)
    #[arg(long)]
    auth: Option<String>,

    /// Google Cloud project id
    #[arg(long, alias = "gcp_project_id")]
    gcp_project_id: Option<String>,

    /// Google Cloud project display name
    #[arg(long, alias = "gcp_project_name")]
    gcp_project_name: Option<String>,

    /// Android package name
    #[arg(long, alias = "android_package")]
    android_package: Option<String>,

    /// Android app display name
    #[arg(long, alias = "android_app_name")]
    android_app_name: Option<String>,

    /// Directory for google-services.json
    #[arg(long, alias = "android_config_path")]
    android_config_path: Option<String>,

    /// iOS bundle id (enables iOS registration)
    #[arg(long, alias = "ios_bundle_id")]
    ios_bundle_id: Option<String>,

    /// iOS app display name
    #[arg(long, alias = "ios_app_name")]
    ios_app_name: Option<String>,

    /// App Store id of the iOS app
    #[arg(long, alias = "app_store_id")]
    app_store_id: Option<String>,

    /// Directory for GoogleService-Info.plist
    #[arg(long, alias = "ios_config_path")]
    ios_config_path: Option<String>,

    /// JSON file with the settings above; other setting flags are ignored
    #[arg(long, alias = "config_file")]
    config_file: Option<PathBuf>,

    /// Bearer token to use instead of the credential file
    #[arg(long, env = "FIRESETUP_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Attempts per convergence poll before giving up
    #[arg(
        long,
        default_value_t = PollSchedule::DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    max_poll_attempts: u32,

    /// Verbose logging (includes request detail)
    #[arg(short, long)]
    verbose: bool,

    #[arg(long, env = "FIRESETUP_CRM_BASE_URL", default_value = GCP_CRM_BASE_URL, hide = true)]
    crm_base_url: String,

    #[arg(long, env = "FIRESETUP_FIREBASE_BASE_URL", default_value = FIREBASE_BASE_URL, hide = true)]
    firebase_base_url: String,
}

impl Cli {
    fn setup_config(&self) -> Result<SetupConfig> {
        if let Some(path) = &self.config_file {
            tracing::info!("Loading configuration from {}", path.display());
            return SetupConfig::from_file(path).context("Failed to load configuration file");
        }

        Ok(SetupConfig {
            auth: self.auth.clone(),
            gcp_project_id: self.gcp_project_id.clone(),
            gcp_project_name: self.gcp_project_name.clone(),
            android_package: self.android_package.clone(),
            android_app_name: self.android_app_name.clone(),
            android_config_path: self.android_config_path.clone(),
            ios_bundle_id: self.ios_bundle_id.clone(),
            ios_app_name: self.ios_app_name.clone(),
            app_store_id: self.app_store_id.clone(),
            ios_config_path: self.ios_config_path.clone(),
        }
        .normalized())
    }

    fn token_provider(&self, config: &SetupConfig) -> Result<Arc<dyn TokenProvider>> {
        if let Some(token) = self.access_token.as_deref().filter(|t| !t.is_empty()) {
            tracing::debug!("Using bearer token from the command line or environment");
            return Ok(Arc::new(StaticToken::new(token)));
        }

        let path = config
            .auth
            .as_deref()
            .context("auth (path to the credential file) is required")?;
        Ok(Arc::new(CredentialFile::new(path)))
    }

    fn endpoints(&self) -> Endpoints {
        Endpoints {
            resource_manager: self.crm_base_url.clone(),
            firebase: self.firebase_base_url.clone(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.setup_config()?;
    let credential_required = cli.access_token.as_deref().is_none_or(str::is_empty);
    config.validate(credential_required)?;

    let request = request::provision_request(&config)?;
    let executor = CallExecutor::new(cli.token_provider(&config)?)
        .context("Failed to initialize HTTP client")?;

    let unit = Duration::from_secs(1);
    let provisioner = Provisioner::new(FirebaseApi::new(executor, cli.endpoints())).with_schedules(
        PollSchedule::activation(unit).with_max_attempts(cli.max_poll_attempts),
        PollSchedule::registration(unit).with_max_attempts(cli.max_poll_attempts),
    );

    println!(
        "{} {}",
        "Provisioning project".green().bold(),
        request.project_id.cyan()
    );

    let summary = provisioner
        .run(&request)
        .await
        .with_context(|| format!("Provisioning of project {} failed", request.project_id))?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &ProvisionSummary) {
    println!();
    println!(
        "{} Project {} is ready ({}ms)",
        "✓".green().bold(),
        summary.project_id.cyan(),
        summary.duration_ms
    );

    for app in &summary.apps {
        println!(
            "  {} {:<8} {}",
            "•".green(),
            app.platform.display_name(),
            app.app_id.dimmed()
        );
        println!("    {}", app.artifact.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("firesetup").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_underscore_aliases() {
        let cli = parse(&[
            "--gcp_project_id",
            "my-test-project-123",
            "--android_package",
            "com.test.app.project",
            "--ios-bundle-id",
            "com.test.app.project",
        ]);

        let config = cli.setup_config().unwrap();
        assert_eq!(config.gcp_project_id.as_deref(), Some("my-test-project-123"));
        assert_eq!(config.android_package.as_deref(), Some("com.test.app.project"));
        assert!(config.has_ios());
        assert_eq!(cli.max_poll_attempts, PollSchedule::DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_empty_flags_are_absent() {
        let cli = parse(&["--gcp-project-name", "", "--auth", "token.json"]);
        let config = cli.setup_config().unwrap();

        assert_eq!(config.gcp_project_name, None);
        assert_eq!(config.auth.as_deref(), Some("token.json"));
    }

    #[test]
    fn test_default_endpoints() {
        let cli = parse(&[]);
        let endpoints = cli.endpoints();

        // Unless overridden through the environment
        if std::env::var_os("FIRESETUP_CRM_BASE_URL").is_none() {
            assert_eq!(endpoints.resource_manager, GCP_CRM_BASE_URL);
        }
        if std::env::var_os("FIRESETUP_FIREBASE_BASE_URL").is_none() {
            assert_eq!(endpoints.firebase, FIREBASE_BASE_URL);
        }
    }

    #[test]
    fn test_zero_poll_attempts_rejected() {
        assert!(Cli::try_parse_from(["firesetup", "--max-poll-attempts", "0"]).is_err());
    }
}
