//! In-process identity provider.
//!
//! Holds email/password accounts and canned popup identities in memory.
//! Used when no Firebase project is configured and throughout the tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use literacy_census_core::{Email, Identity, ProviderKind, UserId};
use secrecy::{ExposeSecret, SecretString};

use super::{AuthError, AuthStateListener, AuthStateNotifier, IdentityProvider, SignInOutcome, Subscription};

/// Provider id recorded for email/password accounts.
pub const PASSWORD_PROVIDER: &str = "password";

const MIN_PASSWORD_LEN: usize = 6;

/// In-memory [`IdentityProvider`].
pub struct MemoryIdentityProvider {
    notifier: AuthStateNotifier,
    state: Mutex<MemoryState>,
    next_uid: AtomicU64,
    subscriptions: AtomicUsize,
}

#[derive(Default)]
struct MemoryState {
    // Keyed by normalized email.
    accounts: HashMap<String, Account>,
    popup_identities: HashMap<ProviderKind, Identity>,
    seen_popup_users: HashSet<UserId>,
    failures: VecDeque<AuthError>,
}

struct Account {
    identity: Identity,
    password: String,
}

impl MemoryIdentityProvider {
    /// Create a provider whose initial state (signed out) is already known.
    #[must_use]
    pub fn new() -> Self {
        let provider = Self::pending();
        provider.notifier.publish(None);
        provider
    }

    /// Create a provider that has not yet determined the initial state.
    ///
    /// Subscribers see nothing until [`Self::resolve_initial`] is called.
    #[must_use]
    pub fn pending() -> Self {
        Self {
            notifier: AuthStateNotifier::new(),
            state: Mutex::new(MemoryState::default()),
            next_uid: AtomicU64::new(1),
            subscriptions: AtomicUsize::new(0),
        }
    }

    /// Publish the initial auth state of a [`Self::pending`] provider.
    pub fn resolve_initial(&self, identity: Option<Identity>) {
        self.notifier.publish(identity);
    }

    /// Push an arbitrary auth-state change, as a token refresh would.
    pub fn publish(&self, identity: Option<Identity>) {
        self.notifier.publish(identity);
    }

    /// Add an email/password account.
    #[must_use]
    pub fn with_account(self, email: &str, password: &str, display_name: Option<&str>) -> Self {
        let uid = self.allocate_uid();
        let mut identity = Identity::new(uid)
            .with_email(email.trim())
            .with_provider(PASSWORD_PROVIDER);
        identity.display_name = display_name.map(str::to_owned);

        self.lock().accounts.insert(
            normalize(email),
            Account {
                identity,
                password: password.to_owned(),
            },
        );
        self
    }

    /// Set the identity a popup sign-in with `kind` resolves to.
    #[must_use]
    pub fn with_popup_identity(self, kind: ProviderKind, identity: Identity) -> Self {
        self.lock().popup_identities.insert(kind, identity);
        self
    }

    /// Make the next operation fail with `error`.
    pub fn fail_next(&self, error: AuthError) {
        self.lock().failures.push_back(error);
    }

    /// Total number of auth-state subscriptions ever registered.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    /// The last published state, if any.
    #[must_use]
    pub fn current(&self) -> Option<Option<Identity>> {
        self.notifier.current()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn allocate_uid(&self) -> UserId {
        UserId::new(format!("mem-{}", self.next_uid.fetch_add(1, Ordering::SeqCst)))
    }

    fn take_failure(&self) -> Result<(), AuthError> {
        self.lock().failures.pop_front().map_or(Ok(()), Err)
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in_with_popup(&self, kind: ProviderKind) -> Result<SignInOutcome, AuthError> {
        self.take_failure()?;

        let (identity, is_new_user) = {
            let mut state = self.lock();
            let identity = state
                .popup_identities
                .get(&kind)
                .cloned()
                .ok_or(AuthError::PopupClosed)?;
            let is_new_user = state.seen_popup_users.insert(identity.uid.clone());
            (identity, is_new_user)
        };

        self.notifier.publish(Some(identity.clone()));
        Ok(SignInOutcome {
            identity,
            is_new_user,
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError> {
        self.take_failure()?;

        let identity = {
            let state = self.lock();
            state
                .accounts
                .get(&normalize(email))
                .filter(|account| account.password == password.expose_secret())
                .map(|account| account.identity.clone())
                .ok_or_else(|| AuthError::InvalidCredential("INVALID_LOGIN_CREDENTIALS".to_owned()))?
        };

        self.notifier.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError> {
        self.take_failure()?;

        let email = Email::parse(email)
            .map_err(|_| AuthError::InvalidCredential("INVALID_EMAIL".to_owned()))?;
        if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidCredential("WEAK_PASSWORD".to_owned()));
        }

        let key = email.normalized().into_inner();
        let identity = {
            let mut state = self.lock();
            if state.accounts.contains_key(&key) {
                return Err(AuthError::AccountExists);
            }
            let identity = Identity::new(self.allocate_uid())
                .with_email(email.as_str())
                .with_provider(PASSWORD_PROVIDER);
            state.accounts.insert(
                key,
                Account {
                    identity: identity.clone(),
                    password: password.expose_secret().to_owned(),
                },
            );
            identity
        };

        self.notifier.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.take_failure()?;
        self.notifier.publish(None);
        Ok(())
    }

    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        self.notifier.subscribe(listener)
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s)
    }

    #[tokio::test]
    async fn test_create_account_then_sign_in() {
        let provider = MemoryIdentityProvider::new();
        let created = provider
            .create_account("Teacher@School.org", &secret("hunter22"))
            .await
            .unwrap();
        assert_eq!(created.email.as_deref(), Some("Teacher@School.org"));
        assert_eq!(created.primary_provider_id(), "password");

        let signed_in = provider
            .sign_in_with_password("teacher@school.org", &secret("hunter22"))
            .await
            .unwrap();
        assert_eq!(signed_in.uid, created.uid);
        assert_eq!(provider.current(), Some(Some(created)));
    }

    #[tokio::test]
    async fn test_duplicate_account_rejected() {
        let provider = MemoryIdentityProvider::new().with_account("a@x.com", "secret1", None);
        let err = provider
            .create_account("A@X.com", &secret("another1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountExists));
    }

    #[tokio::test]
    async fn test_weak_password_and_bad_email_rejected() {
        let provider = MemoryIdentityProvider::new();
        let err = provider.create_account("a@x.com", &secret("123")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential(ref c) if c == "WEAK_PASSWORD"));

        let err = provider.create_account("nope", &secret("123456")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential(ref c) if c == "INVALID_EMAIL"));
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let provider = MemoryIdentityProvider::new().with_account("a@x.com", "secret1", None);
        let err = provider
            .sign_in_with_password("a@x.com", &secret("wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential(_)));
    }

    #[tokio::test]
    async fn test_popup_reports_new_user_once() {
        let identity = Identity::new("g1").with_provider("google.com");
        let provider =
            MemoryIdentityProvider::new().with_popup_identity(ProviderKind::Google, identity);

        let first = provider.sign_in_with_popup(ProviderKind::Google).await.unwrap();
        let second = provider.sign_in_with_popup(ProviderKind::Google).await.unwrap();
        assert!(first.is_new_user);
        assert!(!second.is_new_user);

        let err = provider
            .sign_in_with_popup(ProviderKind::GitHub)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::PopupClosed));
    }

    #[tokio::test]
    async fn test_injected_failure_is_consumed() {
        let provider = MemoryIdentityProvider::new();
        provider.fail_next(AuthError::TooManyAttempts);
        assert!(matches!(
            provider.sign_out().await.unwrap_err(),
            AuthError::TooManyAttempts
        ));
        provider.sign_out().await.unwrap();
    }

    #[test]
    fn test_pending_provider_has_no_state() {
        let provider = MemoryIdentityProvider::pending();
        assert_eq!(provider.current(), None);
        provider.resolve_initial(None);
        assert_eq!(provider.current(), Some(None));
    }
}
