//! Authenticated identities as reported by the identity provider.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::UserId;

/// Provider id reported when an identity has no linked provider records.
pub const UNKNOWN_PROVIDER: &str = "unknown";

/// Interactive (popup) sign-in providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Google,
    #[serde(rename = "github")]
    GitHub,
    Microsoft,
}

impl ProviderKind {
    /// All popup providers, in the order they are offered on the login screen.
    pub const ALL: [Self; 3] = [Self::Google, Self::GitHub, Self::Microsoft];

    /// Provider id as used by the identity provider (`google.com`, ...).
    #[must_use]
    pub const fn provider_id(self) -> &'static str {
        match self {
            Self::Google => "google.com",
            Self::GitHub => "github.com",
            Self::Microsoft => "microsoft.com",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::GitHub => "GitHub",
            Self::Microsoft => "Microsoft",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when parsing an unrecognised provider name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sign-in provider: {0}")]
pub struct UnknownProviderKind(pub String);

impl std::str::FromStr for ProviderKind {
    type Err = UnknownProviderKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "google" | "google.com" => Ok(Self::Google),
            "github" | "github.com" => Ok(Self::GitHub),
            "microsoft" | "microsoft.com" => Ok(Self::Microsoft),
            other => Err(UnknownProviderKind(other.to_owned())),
        }
    }
}

/// One auth provider linked to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedProvider {
    /// Provider id (`google.com`, `github.com`, `password`, ...).
    pub provider_id: String,
}

impl LinkedProvider {
    #[must_use]
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
        }
    }
}

/// The signed-in user as reported by the identity provider.
///
/// Owned by the provider: a new value replaces the old one wholesale on every
/// auth-state change (sign-in, sign-out, token refresh).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(default)]
    pub providers: Vec<LinkedProvider>,
}

impl Identity {
    #[must_use]
    pub fn new(uid: impl Into<UserId>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
            display_name: None,
            providers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_provider(mut self, provider_id: impl Into<String>) -> Self {
        self.providers.push(LinkedProvider::new(provider_id));
        self
    }

    /// The first linked provider's id, or `"unknown"`.
    #[must_use]
    pub fn primary_provider_id(&self) -> &str {
        self.providers
            .first()
            .map_or(UNKNOWN_PROVIDER, |p| p.provider_id.as_str())
    }

    /// The email parsed as an [`Email`], if present and well-formed.
    #[must_use]
    pub fn parsed_email(&self) -> Option<Email> {
        self.email.as_deref().and_then(|e| Email::parse(e).ok())
    }
}
