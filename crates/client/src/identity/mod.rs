//! Identity provider boundary.
//!
//! The session never talks to an authentication backend directly; it goes
//! through [`IdentityProvider`]. Two implementations ship with the crate:
//!
//! - [`FirebaseAuth`] - Firebase Authentication over its REST API
//! - [`MemoryIdentityProvider`] - in-process accounts for development and tests
//!
//! Providers push every auth-state change (sign-in, sign-out, token refresh)
//! to subscribers registered through
//! [`IdentityProvider::on_auth_state_changed`]. Operation results carry only
//! what the state stream cannot, such as whether a popup sign-in created a
//! new account.

mod error;
pub mod firebase;
pub mod memory;
mod notifier;

pub use error::AuthError;
pub use firebase::FirebaseAuth;
pub use memory::MemoryIdentityProvider;
pub use notifier::{AuthStateListener, AuthStateNotifier, Subscription};

use async_trait::async_trait;
use literacy_census_core::{Identity, ProviderKind};
use secrecy::SecretString;

/// Result of a successful interactive sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInOutcome {
    pub identity: Identity,
    /// True when this sign-in created the account.
    pub is_new_user: bool,
}

/// An authentication backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Run the interactive OAuth flow for `kind`.
    async fn sign_in_with_popup(&self, kind: ProviderKind) -> Result<SignInOutcome, AuthError>;

    /// Sign in with an email/password credential.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError>;

    /// Create an email/password account and sign in as it.
    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Register an auth-state listener.
    ///
    /// The listener fires at least once after the provider has determined
    /// the initial state, possibly with `None`.
    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription;
}
