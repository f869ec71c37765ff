//! Auth-state change fan-out shared by identity provider implementations.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use literacy_census_core::Identity;

/// Callback invoked with the new identity (or `None` when signed out).
pub type AuthStateListener = Arc<dyn Fn(Option<Identity>) + Send + Sync>;

/// Delivers auth-state changes to registered listeners.
///
/// Until the provider has determined the initial state, subscribers are only
/// registered. Once a state is known, every new subscriber immediately
/// receives it, so each listener observes at least one event.
///
/// Listeners run synchronously on the publishing task and must not subscribe
/// or publish from inside the callback.
#[derive(Clone, Default)]
pub struct AuthStateNotifier {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    // Serializes delivery so a replay can never overtake a newer publish.
    dispatch: Mutex<()>,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    listeners: Vec<(u64, AuthStateListener)>,
    current: Option<Option<Identity>>,
}

impl AuthStateNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Dropping the returned [`Subscription`] removes it.
    pub fn subscribe(&self, listener: AuthStateListener) -> Subscription {
        let _dispatch = self.inner.dispatch.lock().unwrap_or_else(PoisonError::into_inner);

        let (id, replay) = {
            let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
            let id = state.next_id;
            state.next_id += 1;
            state.listeners.push((id, Arc::clone(&listener)));
            (id, state.current.clone())
        };

        if let Some(identity) = replay {
            listener(identity);
        }

        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Record a new auth state and deliver it to every listener.
    pub fn publish(&self, identity: Option<Identity>) {
        let _dispatch = self.inner.dispatch.lock().unwrap_or_else(PoisonError::into_inner);

        let listeners: Vec<AuthStateListener> = {
            let mut state = self.inner.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.current = Some(identity.clone());
            state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };

        for listener in listeners {
            listener(identity.clone());
        }
    }

    /// The last published state, or `None` if nothing was published yet.
    #[must_use]
    pub fn current(&self) -> Option<Option<Identity>> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .clone()
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }
}

/// Handle for a registered listener.
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    id: u64,
    inner: Weak<Inner>,
}

impl Subscription {
    /// Unregister the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .listeners
                .retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn recorder() -> (AuthStateListener, Arc<Mutex<Vec<Option<String>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: AuthStateListener = Arc::new(move |identity: Option<Identity>| {
            sink.lock()
                .unwrap()
                .push(identity.map(|i| i.uid.into_inner()));
        });
        (listener, seen)
    }

    #[test]
    fn test_no_replay_before_first_publish() {
        let notifier = AuthStateNotifier::new();
        let (listener, seen) = recorder();
        let _sub = notifier.subscribe(listener);
        assert!(seen.lock().unwrap().is_empty());

        notifier.publish(None);
        assert_eq!(*seen.lock().unwrap(), vec![None]);
    }

    #[test]
    fn test_late_subscriber_gets_current_state() {
        let notifier = AuthStateNotifier::new();
        notifier.publish(Some(Identity::new("u1")));

        let (listener, seen) = recorder();
        let _sub = notifier.subscribe(listener);
        assert_eq!(*seen.lock().unwrap(), vec![Some("u1".to_owned())]);
    }

    #[test]
    fn test_dropping_subscription_stops_delivery() {
        let notifier = AuthStateNotifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let sub = notifier.subscribe(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        notifier.publish(None);
        sub.unsubscribe();
        notifier.publish(Some(Identity::new("u2")));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.listener_count(), 0);
    }
}
