//! Authentication error types.

use literacy_census_core::ProviderKind;
use thiserror::Error;

/// Errors reported by an identity provider.
///
/// These are surfaced to callers exactly as the provider reported them; the
/// session never wraps or retries them.
#[derive(Debug, Error)]
pub enum AuthError {
    /// An account already exists for the email address.
    #[error("an account already exists for this email address")]
    AccountExists,

    /// The provider rejected the credential (wrong password, unknown user,
    /// weak password, malformed address). Holds the provider's error code.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The account has been disabled by an administrator.
    #[error("this account has been disabled")]
    UserDisabled,

    /// Too many failed attempts.
    #[error("too many attempts, try again later")]
    TooManyAttempts,

    /// The interactive sign-in was abandoned or refused.
    #[error("sign-in popup was closed before completing")]
    PopupClosed,

    /// The popup provider is not enabled on this platform.
    #[error("{0} sign-in is not enabled")]
    ProviderDisabled(ProviderKind),

    /// A required project credential is missing.
    #[error("identity provider is not configured: missing {0}")]
    NotConfigured(&'static str),

    /// The stored session can no longer be refreshed.
    #[error("session expired, sign in again")]
    SessionExpired,

    /// Any other error code returned by the provider.
    #[error("identity provider error: {code}")]
    Provider {
        code: String,
        message: Option<String>,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The loopback callback listener failed.
    #[error("sign-in callback error: {0}")]
    Callback(String),

    /// Reading or writing the persisted session failed.
    #[error("session persistence error: {0}")]
    Persistence(#[source] std::io::Error),
}

impl AuthError {
    /// Map an Identity Toolkit error message to an error kind.
    ///
    /// Messages look like `EMAIL_EXISTS` or `WEAK_PASSWORD : Password should be at least 6 characters`.
    #[must_use]
    pub fn from_provider_message(raw: &str) -> Self {
        let (code, detail) = match raw.split_once(" : ") {
            Some((code, detail)) => (code.trim(), Some(detail.trim().to_owned())),
            None => (raw.trim(), None),
        };

        match code {
            "EMAIL_EXISTS" | "FEDERATED_USER_ID_ALREADY_LINKED" => Self::AccountExists,
            "WEAK_PASSWORD"
            | "INVALID_EMAIL"
            | "MISSING_EMAIL"
            | "MISSING_PASSWORD"
            | "INVALID_PASSWORD"
            | "EMAIL_NOT_FOUND"
            | "INVALID_LOGIN_CREDENTIALS"
            | "INVALID_IDP_RESPONSE" => Self::InvalidCredential(code.to_owned()),
            "USER_DISABLED" => Self::UserDisabled,
            "TOO_MANY_ATTEMPTS_TRY_LATER" => Self::TooManyAttempts,
            "TOKEN_EXPIRED" | "USER_NOT_FOUND" | "INVALID_REFRESH_TOKEN" | "INVALID_ID_TOKEN" => {
                Self::SessionExpired
            }
            _ => Self::Provider {
                code: code.to_owned(),
                message: detail,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_exists_is_account_exists() {
        assert!(matches!(
            AuthError::from_provider_message("EMAIL_EXISTS"),
            AuthError::AccountExists
        ));
    }

    #[test]
    fn test_weak_password_keeps_code_only() {
        let err = AuthError::from_provider_message(
            "WEAK_PASSWORD : Password should be at least 6 characters",
        );
        assert!(matches!(err, AuthError::InvalidCredential(ref code) if code == "WEAK_PASSWORD"));
    }

    #[test]
    fn test_unknown_code_is_preserved() {
        let err = AuthError::from_provider_message("OPERATION_NOT_ALLOWED : Password sign-in is disabled");
        match err {
            AuthError::Provider { code, message } => {
                assert_eq!(code, "OPERATION_NOT_ALLOWED");
                assert_eq!(message.as_deref(), Some("Password sign-in is disabled"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_expired_session_codes() {
        for code in ["TOKEN_EXPIRED", "USER_NOT_FOUND", "INVALID_REFRESH_TOKEN"] {
            assert!(matches!(
                AuthError::from_provider_message(code),
                AuthError::SessionExpired
            ));
        }
    }
}
