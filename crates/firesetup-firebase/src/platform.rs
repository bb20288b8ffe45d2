//! Application platform variants

use serde_json::{Map, Value};

/// Mobile platform of a Firebase app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Android,
    Ios,
}

impl Platform {
    /// Collection segment in Firebase Management API URLs
    pub fn collection(&self) -> &'static str {
        match self {
            Platform::Android => "androidApps",
            Platform::Ios => "iosApps",
        }
    }

    /// Name for user-facing output
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Android => "Android",
            Platform::Ios => "iOS",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Android => write!(f, "android"),
            Platform::Ios => write!(f, "ios"),
        }
    }
}

/// App registration request, one variant per platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppSpec {
    Android {
        package_name: String,
        display_name: Option<String>,
    },
    Ios {
        bundle_id: String,
        display_name: Option<String>,
        app_store_id: Option<String>,
    },
}

impl AppSpec {
    pub fn android(package_name: impl Into<String>) -> Self {
        AppSpec::Android {
            package_name: package_name.into(),
            display_name: None,
        }
    }

    pub fn ios(bundle_id: impl Into<String>) -> Self {
        AppSpec::Ios {
            bundle_id: bundle_id.into(),
            display_name: None,
            app_store_id: None,
        }
    }

    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        match &mut self {
            AppSpec::Android { display_name, .. } | AppSpec::Ios { display_name, .. } => {
                *display_name = name;
            }
        }
        self
    }

    /// Sets the App Store id; ignored for Android
    pub fn with_app_store_id(mut self, store_id: Option<String>) -> Self {
        if let AppSpec::Ios { app_store_id, .. } = &mut self {
            *app_store_id = store_id;
        }
        self
    }

    pub fn platform(&self) -> Platform {
        match self {
            AppSpec::Android { .. } => Platform::Android,
            AppSpec::Ios { .. } => Platform::Ios,
        }
    }

    /// Package name (Android) or bundle id (iOS)
    pub fn identifier(&self) -> &str {
        match self {
            AppSpec::Android { package_name, .. } => package_name,
            AppSpec::Ios { bundle_id, .. } => bundle_id,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            AppSpec::Android { display_name, .. } | AppSpec::Ios { display_name, .. } => {
                display_name.as_deref()
            }
        }
    }

    /// Body of the `androidApps.create` / `iosApps.create` request
    pub fn create_body(&self) -> Value {
        let mut body = Map::new();
        match self {
            AppSpec::Android { package_name, .. } => {
                body.insert("packageName".into(), Value::from(package_name.as_str()));
            }
            AppSpec::Ios {
                bundle_id,
                app_store_id,
                ..
            } => {
                body.insert("bundleId".into(), Value::from(bundle_id.as_str()));
                if let Some(store_id) = app_store_id {
                    body.insert("appStoreId".into(), Value::from(store_id.as_str()));
                }
            }
        }
        if let Some(name) = self.display_name() {
            body.insert("displayName".into(), Value::from(name));
        }
        Value::Object(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_android_body() {
        let spec = AppSpec::android("com.test.app.project");
        assert_eq!(spec.create_body(), json!({"packageName": "com.test.app.project"}));

        let named = spec.with_display_name(Some("My Test App".into()));
        assert_eq!(
            named.create_body(),
            json!({"packageName": "com.test.app.project", "displayName": "My Test App"})
        );
    }

    #[test]
    fn test_android_ignores_store_id() {
        let spec = AppSpec::android("com.test.app").with_app_store_id(Some("123".into()));
        assert_eq!(spec.create_body(), json!({"packageName": "com.test.app"}));
    }

    #[test]
    fn test_ios_body() {
        let spec = AppSpec::ios("com.test.app.project")
            .with_display_name(Some("My Test App".into()))
            .with_app_store_id(Some("123456789".into()));

        assert_eq!(spec.platform(), Platform::Ios);
        assert_eq!(spec.identifier(), "com.test.app.project");
        assert_eq!(
            spec.create_body(),
            json!({
                "bundleId": "com.test.app.project",
                "appStoreId": "123456789",
                "displayName": "My Test App"
            })
        );
    }

    #[test]
    fn test_ios_body_without_optionals() {
        let spec = AppSpec::ios("com.test.app");
        assert_eq!(spec.create_body(), json!({"bundleId": "com.test.app"}));
    }

    #[test]
    fn test_platform_segments() {
        assert_eq!(Platform::Android.collection(), "androidApps");
        assert_eq!(Platform::Ios.collection(), "iosApps");
        assert_eq!(Platform::Ios.to_string(), "ios");
        assert_eq!(Platform::Ios.display_name(), "iOS");
    }
}
