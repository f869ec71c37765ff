//! Application state shared across commands.

use std::sync::Arc;

use crate::activity::{ActivityLog, ActivitySink};
use crate::config::AppConfig;
use crate::directory::DirectoryClient;
use crate::error::AppError;
use crate::identity::firebase::persistence::SessionFile;
use crate::identity::firebase::{FirebaseAuth, PopupPresenter};
use crate::identity::IdentityProvider;
use crate::issues::IssueTracker;
use crate::schools::SchoolRegistry;
use crate::session::Session;
use crate::store::{DocumentStore, MemoryDocumentStore, PgDocumentStore, create_pool};

/// Application state shared across all commands.
///
/// Cheaply cloneable via `Arc`. Holds the one [`Session`] for the process.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    session: Session,
    store: Arc<dyn DocumentStore>,
    postgres: Option<PgDocumentStore>,
    activity: ActivityLog,
    issues: IssueTracker,
    schools: SchoolRegistry,
    directory: DirectoryClient,
}

/// Collaborators for [`AppState::from_parts`].
pub struct Parts {
    pub config: AppConfig,
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn DocumentStore>,
    /// Set when `store` is backed by `PostgreSQL`, for migrations.
    pub postgres: Option<PgDocumentStore>,
}

impl AppState {
    /// Connect to the configured identity provider and document store.
    ///
    /// Restores any persisted session, which publishes the initial auth
    /// state. Without `DATABASE_URL` an in-memory store is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or an HTTP client
    /// fails to build.
    pub async fn connect(config: AppConfig, presenter: PopupPresenter) -> Result<Self, AppError> {
        config.warn_on_suspicious_values();

        let mut firebase = FirebaseAuth::new(
            &config.firebase,
            SessionFile::new(config.session_file.clone()),
        )?
        .with_popup_presenter(presenter);
        if let Some(host) = &config.auth_emulator_host {
            tracing::info!(host = %host, "Using Firebase Auth emulator");
            firebase = firebase.with_emulator(host)?;
        }
        firebase.restore().await;

        let (store, postgres): (Arc<dyn DocumentStore>, Option<PgDocumentStore>) =
            match &config.database_url {
                Some(url) => {
                    let pool = create_pool(url).await.map_err(crate::store::StoreError::from)?;
                    tracing::info!("Database pool created");
                    let pg = PgDocumentStore::new(pool);
                    (Arc::new(pg.clone()), Some(pg))
                }
                None => {
                    tracing::warn!("DATABASE_URL not set; records are kept in memory only");
                    (Arc::new(MemoryDocumentStore::new()), None)
                }
            };

        Self::from_parts(Parts {
            config,
            identity: Arc::new(firebase),
            store,
            postgres,
        })
    }

    /// Build state from explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory HTTP client fails to build.
    pub fn from_parts(parts: Parts) -> Result<Self, AppError> {
        let Parts {
            config,
            identity,
            store,
            postgres,
        } = parts;

        let activity = ActivityLog::new(Arc::clone(&store));
        let sink: Arc<dyn ActivitySink> = Arc::new(activity.clone());

        let session = Session::new(
            identity,
            Arc::clone(&sink),
            config.admin_emails.clone(),
            config.auth_providers.clone(),
        );
        let issues = IssueTracker::new(Arc::clone(&store));
        let schools = SchoolRegistry::new(Arc::clone(&store), sink);
        let directory = DirectoryClient::new(config.directory_url.clone())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                session,
                store,
                postgres,
                activity,
                issues,
                schools,
                directory,
            }),
        })
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// The process-wide session, subscribed to auth-state changes on first use.
    #[must_use]
    pub fn session(&self) -> &Session {
        self.inner.session.ensure_initialized();
        &self.inner.session
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.store
    }

    /// The `PostgreSQL` store, when one is configured.
    #[must_use]
    pub fn postgres(&self) -> Option<&PgDocumentStore> {
        self.inner.postgres.as_ref()
    }

    #[must_use]
    pub fn activity(&self) -> &ActivityLog {
        &self.inner.activity
    }

    #[must_use]
    pub fn issues(&self) -> &IssueTracker {
        &self.inner.issues
    }

    #[must_use]
    pub fn schools(&self) -> &SchoolRegistry {
        &self.inner.schools
    }

    #[must_use]
    pub fn directory(&self) -> &DirectoryClient {
        &self.inner.directory
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::identity::MemoryIdentityProvider;

    fn state(provider: Arc<MemoryIdentityProvider>) -> AppState {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        AppState::from_parts(Parts {
            config,
            identity: provider,
            store: Arc::new(MemoryDocumentStore::new()),
            postgres: None,
        })
        .unwrap()
    }

    #[test]
    fn test_session_accessor_subscribes_once() {
        let provider = Arc::new(MemoryIdentityProvider::new());
        let state = state(Arc::clone(&provider));

        for _ in 0..5 {
            let _ = state.session().snapshot();
        }
        let clone = state.clone();
        let _ = clone.session();

        assert_eq!(provider.subscription_count(), 1);
    }

    #[test]
    fn test_memory_state_has_no_postgres() {
        let state = state(Arc::new(MemoryIdentityProvider::new()));
        assert!(state.postgres().is_none());
    }
}
