//! Integration tests for Literacy Census.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p literacy-census-integration-tests
//! ```
//!
//! No external services are needed: identity and storage use the in-memory
//! implementations, and HTTP collaborators are served by axum stubs bound to
//! a loopback port.
//!
//! # Test Categories
//!
//! - `session_lifecycle` - Auth-state stream, loading flag, admin predicate, guard
//! - `signup_activity` - Signup logging, user registry, best-effort activity writes
//! - `issue_workflow` - Issue filing, triage and status filters
//! - `school_records` - School CRUD and its activity trail
//! - `directory_stub` - Directory lookups against a stub feature service
//! - `firebase_stub` - Firebase adapter against a stub Identity Toolkit

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use literacy_census_client::config::{AppConfig, ConfigError};
use literacy_census_client::identity::{IdentityProvider, MemoryIdentityProvider};
use literacy_census_client::state::Parts;
use literacy_census_client::store::{DocumentStore, MemoryDocumentStore};
use literacy_census_client::{AppError, AppState};
use url::Url;

/// Admin address used by [`TestContext`].
pub const ADMIN_EMAIL: &str = "admin@census.test";

/// App state over in-memory collaborators, with handles to both.
pub struct TestContext {
    pub state: AppState,
    pub identity: Arc<MemoryIdentityProvider>,
    pub store: Arc<MemoryDocumentStore>,
}

impl TestContext {
    /// Build state whose admin allow-list is [`ADMIN_EMAIL`].
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be assembled.
    pub fn new(identity: MemoryIdentityProvider) -> Result<Self, AppError> {
        Self::with_env(identity, &[("ADMIN_EMAILS", ADMIN_EMAIL)])
    }

    /// Build state from the given environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_env(
        identity: MemoryIdentityProvider,
        env: &[(&str, &str)],
    ) -> Result<Self, AppError> {
        let identity = Arc::new(identity);
        let store = Arc::new(MemoryDocumentStore::new());
        let provider: Arc<dyn IdentityProvider> = identity.clone();
        let documents: Arc<dyn DocumentStore> = store.clone();
        let state = AppState::from_parts(Parts {
            config: config(env)?,
            identity: provider,
            store: documents,
            postgres: None,
        })?;

        Ok(Self {
            state,
            identity,
            store,
        })
    }
}

/// Configuration from a fixed set of variables instead of the process env.
///
/// # Errors
///
/// Returns `ConfigError` if a variable is unparseable.
pub fn config(env: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
    AppConfig::from_lookup(|key| {
        env.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_owned())
    })
}

/// Serve `router` on an ephemeral loopback port for the rest of the test.
///
/// # Errors
///
/// Returns an I/O error if the port cannot be bound.
pub async fn serve(router: Router) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(addr)
}

/// `http://<addr><path>` as a URL.
///
/// # Errors
///
/// Returns a parse error if `path` is not a valid URL path.
pub fn url(addr: SocketAddr, path: &str) -> Result<Url, url::ParseError> {
    Url::parse(&format!("http://{addr}{path}"))
}

/// A session-file path unique to this test run.
#[must_use]
pub fn temp_session_file() -> PathBuf {
    std::env::temp_dir().join(format!("census-session-{}.json", uuid::Uuid::new_v4()))
}
