//! Validated configuration → provisioning request

use anyhow::{Context, Result};
use firesetup_config::SetupConfig;
use firesetup_firebase::{AppSpec, AppTarget, ProvisionRequest};

/// Build the workflow input from an already validated configuration
pub fn provision_request(config: &SetupConfig) -> Result<ProvisionRequest> {
    let project_id = config
        .gcp_project_id
        .clone()
        .context("gcp_project_id is required")?;
    let package_name = config
        .android_package
        .clone()
        .context("android_package is required")?;

    let android = AppTarget::new(
        AppSpec::android(package_name).with_display_name(config.android_app_name.clone()),
        config.android_config_path.clone(),
    );

    let ios = config.ios_bundle_id.as_ref().map(|bundle_id| {
        AppTarget::new(
            AppSpec::ios(bundle_id.as_str())
                .with_display_name(config.ios_app_name.clone())
                .with_app_store_id(config.app_store_id.clone()),
            config.ios_config_path.clone(),
        )
    });

    Ok(ProvisionRequest {
        project_id,
        project_name: config.gcp_project_name.clone(),
        android,
        ios,
    })
}
