//! Process-wide session state.
//!
//! The [`Session`] is the single view of "who is signed in" and "are they an
//! admin", and the only sanctioned way to sign in or out.
//!
//! # Lifecycle
//!
//! 1. Construction registers nothing.
//! 2. The first [`Session::ensure_initialized`] (called by every accessor)
//!    registers exactly one auth-state listener with the identity provider.
//!    Concurrent first calls race on a `OnceLock`; one wins, the rest see
//!    the winner's subscription.
//! 3. The first auth-state event clears `is_loading`, which never becomes
//!    true again.
//!
//! Sign-in results are not written into the session directly; the new
//! identity arrives through the listener like any other auth-state change.
//!
//! `is_admin` is computed from the current identity on every read, so a
//! sign-out revokes it in the same snapshot that clears the identity.

mod admins;
mod state;

pub use admins::AdminAllowList;
pub use state::{SessionSnapshot, SessionWatcher};

use std::sync::{Arc, OnceLock};

use literacy_census_core::{Identity, ProviderKind};
use secrecy::SecretString;
use tokio::sync::watch;

use self::state::AuthState;
use crate::activity::{ActivityEvent, ActivitySink};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::identity::{AuthError, AuthStateListener, IdentityProvider, Subscription};

/// Session and authorization state.
pub struct Session {
    provider: Arc<dyn IdentityProvider>,
    activity: Arc<dyn ActivitySink>,
    admins: AdminAllowList,
    enabled_providers: Vec<ProviderKind>,
    state: Arc<watch::Sender<AuthState>>,
    subscription: OnceLock<Subscription>,
}

impl Session {
    #[must_use]
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        activity: Arc<dyn ActivitySink>,
        admins: AdminAllowList,
        enabled_providers: Vec<ProviderKind>,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            provider,
            activity,
            admins,
            enabled_providers,
            state: Arc::new(state),
            subscription: OnceLock::new(),
        }
    }

    /// Register the auth-state listener if it is not registered yet.
    pub fn ensure_initialized(&self) {
        self.subscription.get_or_init(|| {
            tracing::debug!("Subscribing to auth-state changes");
            self.provider.on_auth_state_changed(self.listener())
        });
    }

    /// Whether the auth-state listener has been registered.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.subscription.get().is_some()
    }

    fn listener(&self) -> AuthStateListener {
        let state = Arc::clone(&self.state);
        Arc::new(move |identity: Option<Identity>| {
            match &identity {
                Some(identity) => {
                    tracing::info!(uid = %identity.uid, "Auth state: signed in");
                    set_sentry_user(identity.uid.as_str(), identity.email.as_deref());
                }
                None => {
                    tracing::info!("Auth state: signed out");
                    clear_sentry_user();
                }
            }

            state.send_modify(|current| {
                current.identity = identity;
                current.loaded = true;
            });
        })
    }

    /// Current session state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.ensure_initialized();
        SessionSnapshot::read(&self.state.borrow(), &self.admins)
    }

    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.snapshot().identity
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.snapshot().is_loading
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.snapshot().is_admin
    }

    /// Watch for session changes.
    #[must_use]
    pub fn watch(&self) -> SessionWatcher {
        self.ensure_initialized();
        SessionWatcher::new(self.state.subscribe(), self.admins.clone())
    }

    /// Wait until the identity provider has reported the initial state.
    pub async fn wait_until_ready(&self) -> SessionSnapshot {
        self.ensure_initialized();
        let mut receiver = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = receiver.wait_for(|state| state.loaded).await;
        self.snapshot()
    }

    /// Admin allow-list in effect.
    #[must_use]
    pub const fn admins(&self) -> &AdminAllowList {
        &self.admins
    }

    /// Popup providers offered to users.
    #[must_use]
    pub fn enabled_providers(&self) -> &[ProviderKind] {
        &self.enabled_providers
    }

    /// Sign in through a popup provider.
    ///
    /// Records a signup activity entry when the provider reports the
    /// account is new.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged. A provider that is not
    /// enabled yields `AuthError::ProviderDisabled`.
    pub async fn login_with_provider(&self, kind: ProviderKind) -> Result<Identity, AuthError> {
        self.ensure_initialized();

        if !self.enabled_providers.contains(&kind) {
            let err = AuthError::ProviderDisabled(kind);
            tracing::error!(provider = %kind, error = %err, "Login error");
            return Err(err);
        }

        let outcome = self
            .provider
            .sign_in_with_popup(kind)
            .await
            .inspect_err(|e| tracing::error!(provider = %kind, error = %e, "Login error"))?;

        if outcome.is_new_user {
            self.activity
                .record(ActivityEvent::signup(&outcome.identity))
                .await;
        }
        Ok(outcome.identity)
    }

    /// Sign in with email and password. Never records a signup.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged.
    pub async fn login_with_email(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError> {
        self.ensure_initialized();
        self.provider
            .sign_in_with_password(email, password)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Email login error"))
    }

    /// Create an email/password account and sign in. Always records a signup.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged (`AccountExists` for a taken
    /// address, `InvalidCredential` for a weak password or malformed address).
    pub async fn sign_up_with_email(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError> {
        self.ensure_initialized();
        let identity = self
            .provider
            .create_account(email, password)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Signup error"))?;

        self.activity.record(ActivityEvent::signup(&identity)).await;
        Ok(identity)
    }

    /// Sign out.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.ensure_initialized();
        self.provider
            .sign_out()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Logout error"))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.state.borrow())
            .field("admins", &self.admins.len())
            .field("enabled_providers", &self.enabled_providers)
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}
