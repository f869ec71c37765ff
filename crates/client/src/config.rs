//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Identity provider (Firebase project credentials)
//! - `FIREBASE_API_KEY` - Web API key
//! - `FIREBASE_AUTH_DOMAIN` - Auth domain (e.g., census.firebaseapp.com)
//! - `FIREBASE_PROJECT_ID` - Project id
//! - `FIREBASE_STORAGE_BUCKET` - Storage bucket
//! - `FIREBASE_MESSAGING_SENDER_ID` - Messaging sender id
//! - `FIREBASE_APP_ID` - App id
//!
//! Missing or malformed values are reported as warnings at startup in debug
//! builds; they never halt startup.
//!
//! ## Optional
//! - `ADMIN_EMAILS` - Comma-separated admin allow-list (default: empty)
//! - `AUTH_PROVIDERS` - Enabled popup providers (default: google,github,microsoft)
//! - `DIRECTORY_API_URL` - Schools directory feature-query endpoint
//! - `FIREBASE_AUTH_EMULATOR_HOST` - Firebase Auth emulator (e.g., localhost:9099)
//! - `DATABASE_URL` - `PostgreSQL` document store (default: in-memory store)
//! - `CENSUS_SESSION_FILE` - Where the signed-in session is persisted
//! - `LOG_FORMAT` - `json` for JSON log lines (default: human-readable)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;

use literacy_census_core::ProviderKind;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::session::AdminAllowList;

/// Public schools directory (NCES School Characteristics) feature-query endpoint.
pub const DEFAULT_DIRECTORY_URL: &str = "https://services1.arcgis.com/Ua5sjt3LWTPigjyD/arcgis/rest/services/School_Characteristics_Current/FeatureServer/0/query";

const DEFAULT_SESSION_FILE: &str = ".census-session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Identity provider project credentials
    pub firebase: FirebaseConfig,
    /// Firebase Auth emulator host, replacing the Google endpoints
    pub auth_emulator_host: Option<String>,
    /// Emails granted the admin role
    pub admin_emails: AdminAllowList,
    /// Popup providers offered on the login screen
    pub auth_providers: Vec<ProviderKind>,
    /// Schools directory endpoint
    pub directory_url: Url,
    /// `PostgreSQL` connection URL (contains password)
    pub database_url: Option<SecretString>,
    /// Persisted session location
    pub session_file: PathBuf,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Firebase project credentials.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone, Default)]
pub struct FirebaseConfig {
    pub api_key: Option<SecretString>,
    pub auth_domain: Option<String>,
    pub project_id: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("auth_domain", &self.auth_domain)
            .field("project_id", &self.project_id)
            .field("storage_bucket", &self.storage_bucket)
            .field("messaging_sender_id", &self.messaging_sender_id)
            .field("app_id", &self.app_id)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an optional variable is present but unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an optional variable is present but unparseable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| get_trimmed(&lookup, key);

        let firebase = FirebaseConfig {
            api_key: get("FIREBASE_API_KEY").map(SecretString::from),
            auth_domain: get("FIREBASE_AUTH_DOMAIN"),
            project_id: get("FIREBASE_PROJECT_ID"),
            storage_bucket: get("FIREBASE_STORAGE_BUCKET"),
            messaging_sender_id: get("FIREBASE_MESSAGING_SENDER_ID"),
            app_id: get("FIREBASE_APP_ID"),
        };

        let admin_emails = AdminAllowList::parse(&get("ADMIN_EMAILS").unwrap_or_default());

        let auth_providers = match get("AUTH_PROVIDERS") {
            Some(raw) => parse_providers(&raw)?,
            None => ProviderKind::ALL.to_vec(),
        };

        let directory_url = Url::parse(
            &get("DIRECTORY_API_URL").unwrap_or_else(|| DEFAULT_DIRECTORY_URL.to_owned()),
        )
        .map_err(|e| ConfigError::InvalidEnvVar("DIRECTORY_API_URL".to_owned(), e.to_string()))?;

        let log_json = get("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json"));

        Ok(Self {
            firebase,
            auth_emulator_host: get("FIREBASE_AUTH_EMULATOR_HOST"),
            admin_emails,
            auth_providers,
            directory_url,
            database_url: get("DATABASE_URL").map(SecretString::from),
            session_file: get("CENSUS_SESSION_FILE")
                .map_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE), PathBuf::from),
            log_json,
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }

    /// Log configuration problems that would break sign-in.
    ///
    /// Only active in debug builds, and never fatal.
    pub fn warn_on_suspicious_values(&self) {
        if !cfg!(debug_assertions) {
            return;
        }

        let missing = self.firebase.missing_keys();
        if !missing.is_empty() {
            tracing::warn!(?missing, "Missing Firebase config values");
        }

        for key in self.firebase.keys_with_newlines() {
            tracing::warn!(key, "Firebase config value contains newlines; sign-in will fail");
        }
    }
}

impl FirebaseConfig {
    /// Names of the credential values that are not set.
    #[must_use]
    pub fn missing_keys(&self) -> Vec<&'static str> {
        self.entries()
            .into_iter()
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| key)
            .collect()
    }

    /// Names of the credential values that contain embedded newlines.
    #[must_use]
    pub fn keys_with_newlines(&self) -> Vec<&'static str> {
        self.entries()
            .into_iter()
            .filter(|(_, value)| value.is_some_and(|v| v.contains('\n')))
            .map(|(key, _)| key)
            .collect()
    }

    fn entries(&self) -> [(&'static str, Option<&str>); 6] {
        use secrecy::ExposeSecret;

        [
            (
                "apiKey",
                self.api_key.as_ref().map(|key| key.expose_secret()),
            ),
            ("authDomain", self.auth_domain.as_deref()),
            ("projectId", self.project_id.as_deref()),
            ("storageBucket", self.storage_bucket.as_deref()),
            ("messagingSenderId", self.messaging_sender_id.as_deref()),
            ("appId", self.app_id.as_deref()),
        ]
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable, trimmed, treating blank values as unset.
fn get_trimmed(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Parse a comma-separated provider list, ignoring blank entries.
fn parse_providers(raw: &str) -> Result<Vec<ProviderKind>, ConfigError> {
    let mut providers = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let kind = entry
            .parse::<ProviderKind>()
            .map_err(|e| ConfigError::InvalidEnvVar("AUTH_PROVIDERS".to_owned(), e.to_string()))?;
        if !providers.contains(&kind) {
            providers.push(kind);
        }
    }
    Ok(providers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = load(&[]).unwrap();
        assert_eq!(config.auth_providers, ProviderKind::ALL.to_vec());
        assert_eq!(config.directory_url.as_str(), DEFAULT_DIRECTORY_URL);
        assert!(config.database_url.is_none());
        assert!(config.admin_emails.is_empty());
        assert_eq!(config.session_file, PathBuf::from(".census-session.json"));
        assert!(!config.log_json);
        assert_eq!(config.firebase.missing_keys().len(), 6);
    }

    #[test]
    fn test_values_are_trimmed() {
        let config = load(&[
            ("FIREBASE_AUTH_DOMAIN", "  census.firebaseapp.com \n"),
            ("FIREBASE_PROJECT_ID", "   "),
        ])
        .unwrap();
        assert_eq!(
            config.firebase.auth_domain.as_deref(),
            Some("census.firebaseapp.com")
        );
        // Blank values count as missing.
        assert!(config.firebase.missing_keys().contains(&"projectId"));
    }

    #[test]
    fn test_detects_embedded_newlines() {
        let config = load(&[("FIREBASE_AUTH_DOMAIN", "census.\nfirebaseapp.com")]).unwrap();
        assert_eq!(config.firebase.keys_with_newlines(), vec!["authDomain"]);
    }

    #[test]
    fn test_admin_emails_parsed() {
        let config = load(&[("ADMIN_EMAILS", "a@x.com, B@X.com")]).unwrap();
        assert!(config.admin_emails.contains("a@x.com"));
        assert!(config.admin_emails.contains("b@x.com"));
        assert_eq!(config.admin_emails.len(), 2);
    }

    #[test]
    fn test_auth_providers_subset() {
        let config = load(&[("AUTH_PROVIDERS", "google, , github,google")]).unwrap();
        assert_eq!(
            config.auth_providers,
            vec![ProviderKind::Google, ProviderKind::GitHub]
        );
    }

    #[test]
    fn test_auth_providers_rejects_unknown() {
        let err = load(&[("AUTH_PROVIDERS", "google,myspace")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "AUTH_PROVIDERS"));
    }

    #[test]
    fn test_invalid_directory_url() {
        let err = load(&[("DIRECTORY_API_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "DIRECTORY_API_URL"));
    }

    #[test]
    fn test_firebase_config_debug_redacts_api_key() {
        let config = FirebaseConfig {
            api_key: Some(SecretString::from("AIzaSyD-super-secret-key")),
            project_id: Some("literacy-census".to_owned()),
            ..FirebaseConfig::default()
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("literacy-census"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AIzaSyD-super-secret-key"));
    }
}
