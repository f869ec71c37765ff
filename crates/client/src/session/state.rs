//! Session snapshots and change watching.

use literacy_census_core::Identity;
use tokio::sync::watch;

use super::AdminAllowList;

/// What the auth-state listener writes.
#[derive(Debug, Clone, Default)]
pub(super) struct AuthState {
    pub identity: Option<Identity>,
    /// Set by the first auth-state event and never cleared.
    pub loaded: bool,
}

/// A consistent read of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    /// True until the identity provider has reported the initial state.
    pub is_loading: bool,
    /// Computed from `identity` at read time.
    pub is_admin: bool,
}

impl SessionSnapshot {
    pub(super) fn read(state: &AuthState, admins: &AdminAllowList) -> Self {
        Self {
            identity: state.identity.clone(),
            is_loading: !state.loaded,
            is_admin: admins.is_admin(state.identity.as_ref()),
        }
    }

    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }
}

/// Receives session changes.
#[derive(Debug, Clone)]
pub struct SessionWatcher {
    receiver: watch::Receiver<AuthState>,
    admins: AdminAllowList,
}

impl SessionWatcher {
    pub(super) const fn new(receiver: watch::Receiver<AuthState>, admins: AdminAllowList) -> Self {
        Self { receiver, admins }
    }

    /// Current snapshot, marking it seen.
    pub fn snapshot(&mut self) -> SessionSnapshot {
        SessionSnapshot::read(&self.receiver.borrow_and_update(), &self.admins)
    }

    /// Wait for the next change and return the new snapshot.
    ///
    /// Returns `None` once the session has been dropped.
    pub async fn changed(&mut self) -> Option<SessionSnapshot> {
        self.receiver.changed().await.ok()?;
        Some(self.snapshot())
    }
}
