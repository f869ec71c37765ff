//! Unified error handling with Sentry integration.
//!
//! Component errors (`AuthError`, `StoreError`, `DirectoryError`,
//! `ConfigError`) propagate unchanged through the library. Front ends convert
//! them into [`AppError`] at the top level and show [`AppError::user_message`].

use thiserror::Error;

use crate::config::ConfigError;
use crate::directory::DirectoryError;
use crate::identity::AuthError;
use crate::store::StoreError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Document store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Schools directory lookup failed.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not signed in.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is signed in but lacks the admin role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this is our fault rather than the user's.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Store(_) | Self::Directory(_) | Self::Internal(_) | Self::Config(_)
        )
    }

    /// Capture internal errors to Sentry. User errors are left alone.
    pub fn report(&self) {
        if self.is_internal() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Command error"
            );
        }
    }

    /// Message safe to show to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(StoreError::NotFound { .. }) => "Record not found".to_string(),
            Self::Store(_) | Self::Internal(_) => "Internal error, please try again".to_string(),
            Self::Directory(_) => "Schools directory is unavailable, please try again".to_string(),
            Self::Config(err) => err.to_string(),
            Self::Auth(err) => match err {
                AuthError::AccountExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::InvalidCredential(code) => match code.as_str() {
                    "WEAK_PASSWORD" => "Password should be at least 6 characters".to_string(),
                    "INVALID_EMAIL" | "MISSING_EMAIL" => "Invalid email address".to_string(),
                    _ => "Invalid email or password".to_string(),
                },
                AuthError::UserDisabled => "This account has been disabled".to_string(),
                AuthError::TooManyAttempts => {
                    "Too many attempts, please try again later".to_string()
                }
                AuthError::PopupClosed => "Sign-in was cancelled".to_string(),
                AuthError::ProviderDisabled(kind) => format!("{kind} sign-in is not enabled"),
                AuthError::SessionExpired => "Session expired, please sign in again".to_string(),
                AuthError::NotConfigured(_) => "Sign-in is not configured".to_string(),
                _ => "Authentication error".to_string(),
            },
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::Unauthorized(_) => "Please sign in first".to_string(),
            Self::Forbidden(_) => "Admin access required".to_string(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Called on every sign-in so errors are associated with the user.
pub fn set_sentry_user(user_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("navigation", "Opened route", Some(&[("route", "admin/issues")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
