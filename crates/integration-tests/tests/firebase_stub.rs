//! Integration tests for the Firebase adapter against a stub Identity Toolkit.
//!
//! The stub speaks the REST shapes the adapter uses: `accounts:*` calls with
//! a JSON body and `?key=`, and the form-encoded Secure Token refresh.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use literacy_census_client::AppState;
use literacy_census_client::config::FirebaseConfig;
use literacy_census_client::identity::firebase::PopupPresenter;
use literacy_census_client::identity::firebase::persistence::{PersistedSession, SessionFile};
use literacy_census_client::identity::{AuthError, FirebaseAuth, IdentityProvider};
use literacy_census_client::state::Parts;
use literacy_census_client::store::{DocumentStore, MemoryDocumentStore};
use literacy_census_core::{ActivityKind, ProviderKind, UserId};
use literacy_census_integration_tests::{config, serve, temp_session_file, url};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

const API_KEY: &str = "test-key";

#[derive(Clone, Default)]
struct Stub {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Stub {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("lock").clone()
    }
}

fn reject(code: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": { "code": 400, "message": code } })),
    )
        .into_response()
}

fn password_tokens(email: &str) -> Response {
    Json(json!({
        "localId": "fb-1",
        "idToken": "id-password",
        "refreshToken": "refresh-1",
        "email": email,
    }))
    .into_response()
}

fn field<'a>(body: &'a Value, name: &str) -> &'a str {
    body.get(name).and_then(Value::as_str).unwrap_or_default()
}

async fn identity_toolkit(State(stub): State<Stub>, uri: Uri, raw: String) -> Response {
    let method = uri.path().rsplit('/').next().unwrap_or_default().to_owned();
    stub.calls.lock().expect("lock").push(method.clone());

    if !uri.query().is_some_and(|q| q.contains(&format!("key={API_KEY}"))) {
        return reject("API_KEY_INVALID");
    }
    let body: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
    let get = |name: &str| field(&body, name);

    match method.as_str() {
        "accounts:signUp" => match get("email") {
            "taken@school.org" => reject("EMAIL_EXISTS"),
            email => password_tokens(email),
        },
        "accounts:signInWithPassword" => match (get("email"), get("password")) {
            ("locked@school.org", _) => reject("USER_DISABLED"),
            (email, "hunter22") => password_tokens(email),
            _ => reject("INVALID_LOGIN_CREDENTIALS"),
        },
        "accounts:lookup" => {
            let user = if get("idToken") == "id-github" {
                json!({
                    "localId": "fb-gh",
                    "email": "octo@school.org",
                    "providerUserInfo": [{ "providerId": "github.com" }]
                })
            } else {
                json!({
                    "localId": "fb-1",
                    "email": "fern@school.org",
                    "displayName": "Fern Baker",
                    "providerUserInfo": [{ "providerId": "password" }]
                })
            };
            Json(json!({ "users": [user] })).into_response()
        }
        "accounts:createAuthUri" => Json(json!({
            "authUri": format!("{}?state=s1&code=c0de", get("continueUri")),
            "sessionId": "session-1",
        }))
        .into_response(),
        "accounts:signInWithIdp" => {
            if !get("requestUri").contains("code=c0de") || get("sessionId") != "session-1" {
                return reject("INVALID_IDP_RESPONSE");
            }
            Json(json!({
                "localId": "fb-gh",
                "idToken": "id-github",
                "refreshToken": "refresh-gh",
                "email": "octo@school.org",
                "providerId": "github.com",
                "isNewUser": true,
            }))
            .into_response()
        }
        "token" => {
            if raw.contains("refresh_token=refresh-1") {
                Json(json!({
                    "id_token": "id-restored",
                    "refresh_token": "refresh-2",
                    "user_id": "fb-1",
                }))
                .into_response()
            } else {
                reject("TOKEN_EXPIRED")
            }
        }
        _ => (StatusCode::NOT_FOUND, "unknown method").into_response(),
    }
}

struct Harness {
    auth: Arc<FirebaseAuth>,
    stub: Stub,
    session_file: PathBuf,
}

impl Harness {
    async fn start() -> Self {
        Self::start_with(temp_session_file(), Some(API_KEY)).await
    }

    async fn start_with(session_file: PathBuf, api_key: Option<&str>) -> Self {
        let stub = Stub::default();
        let router = Router::new()
            .fallback(identity_toolkit)
            .with_state(stub.clone());
        let addr = serve(router).await.expect("bind stub");

        let firebase = FirebaseConfig {
            api_key: api_key.map(SecretString::from),
            ..FirebaseConfig::default()
        };
        let presenter: PopupPresenter = Arc::new(|_kind, consent: &Url| {
            // Stand in for the browser following the provider's redirect.
            let consent = consent.clone();
            tokio::spawn(async move {
                let _ = reqwest::get(consent).await;
            });
        });
        let auth = FirebaseAuth::new(&firebase, SessionFile::new(session_file.clone()))
            .expect("client")
            .with_endpoints(
                url(addr, "/identitytoolkit/v1/").expect("url"),
                url(addr, "/securetoken/v1/").expect("url"),
            )
            .with_popup_presenter(presenter);

        Self {
            auth: Arc::new(auth),
            stub,
            session_file,
        }
    }

    fn state(&self) -> AppState {
        let identity: Arc<dyn IdentityProvider> = self.auth.clone();
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        AppState::from_parts(Parts {
            config: config(&[]).expect("config"),
            identity,
            store,
            postgres: None,
        })
        .expect("state")
    }

    async fn persisted(&self) -> Option<PersistedSession> {
        SessionFile::new(self.session_file.clone())
            .load()
            .await
            .expect("readable session file")
    }
}

// =============================================================================
// Email and Password
// =============================================================================

#[tokio::test]
async fn test_password_sign_in_publishes_and_persists() {
    let harness = Harness::start().await;
    harness.auth.restore().await;
    let state = harness.state();

    let identity = state
        .session()
        .login_with_email("fern@school.org", &SecretString::from("hunter22"))
        .await
        .expect("sign in");

    assert_eq!(identity.uid, UserId::new("fb-1"));
    assert_eq!(identity.display_name.as_deref(), Some("Fern Baker"));
    assert_eq!(identity.primary_provider_id(), "password");
    assert_eq!(state.session().identity(), Some(identity));
    assert_eq!(
        harness.stub.calls(),
        ["accounts:signInWithPassword", "accounts:lookup"]
    );

    let persisted = harness.persisted().await.expect("session saved");
    assert_eq!(persisted.uid, UserId::new("fb-1"));
    assert_eq!(persisted.refresh_token, "refresh-1");
}

#[tokio::test]
async fn test_existing_email_maps_to_account_exists() {
    let harness = Harness::start().await;
    harness.auth.restore().await;
    let state = harness.state();

    let err = state
        .session()
        .sign_up_with_email("taken@school.org", &SecretString::from("s3cret!"))
        .await
        .expect_err("email taken");

    assert!(matches!(err, AuthError::AccountExists));
    assert!(state.session().identity().is_none());
    assert!(harness.persisted().await.is_none());
}

#[tokio::test]
async fn test_provider_error_codes_mapped() {
    let harness = Harness::start().await;
    harness.auth.restore().await;
    let state = harness.state();

    let err = state
        .session()
        .login_with_email("fern@school.org", &SecretString::from("wrong"))
        .await
        .expect_err("bad password");
    assert!(matches!(err, AuthError::InvalidCredential(ref code) if code == "INVALID_LOGIN_CREDENTIALS"));

    let err = state
        .session()
        .login_with_email("locked@school.org", &SecretString::from("hunter22"))
        .await
        .expect_err("disabled");
    assert!(matches!(err, AuthError::UserDisabled));
}

#[tokio::test]
async fn test_sign_out_clears_session_file() {
    let harness = Harness::start().await;
    harness.auth.restore().await;
    let state = harness.state();

    state
        .session()
        .login_with_email("fern@school.org", &SecretString::from("hunter22"))
        .await
        .expect("sign in");
    state.session().logout().await.expect("sign out");

    assert!(state.session().identity().is_none());
    assert!(harness.persisted().await.is_none());
}

#[tokio::test]
async fn test_missing_api_key_is_not_configured() {
    let harness = Harness::start_with(temp_session_file(), None).await;
    harness.auth.restore().await;
    let state = harness.state();

    let err = state
        .session()
        .login_with_email("fern@school.org", &SecretString::from("hunter22"))
        .await
        .expect_err("no key");

    assert!(matches!(err, AuthError::NotConfigured(_)));
    assert!(harness.stub.calls().is_empty());
}

// =============================================================================
// Session Restore
// =============================================================================

#[tokio::test]
async fn test_restore_refreshes_persisted_session() {
    let path = temp_session_file();
    SessionFile::new(path.clone())
        .save(&PersistedSession {
            uid: UserId::new("fb-1"),
            refresh_token: "refresh-1".to_owned(),
        })
        .await
        .expect("seed session");

    let harness = Harness::start_with(path, Some(API_KEY)).await;
    let state = harness.state();
    assert!(state.session().is_loading());

    harness.auth.restore().await;

    let snapshot = state.session().snapshot();
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.identity.map(|i| i.uid), Some(UserId::new("fb-1")));

    let persisted = harness.persisted().await.expect("session kept");
    assert_eq!(persisted.refresh_token, "refresh-2");
}

#[tokio::test]
async fn test_stale_session_starts_signed_out() {
    let path = temp_session_file();
    SessionFile::new(path.clone())
        .save(&PersistedSession {
            uid: UserId::new("fb-1"),
            refresh_token: "revoked".to_owned(),
        })
        .await
        .expect("seed session");

    let harness = Harness::start_with(path, Some(API_KEY)).await;
    harness.auth.restore().await;
    let state = harness.state();

    let snapshot = state.session().wait_until_ready().await;
    assert!(snapshot.identity.is_none());
    assert!(harness.persisted().await.is_none(), "stale session removed");
}

// =============================================================================
// Popup Providers
// =============================================================================

#[tokio::test]
async fn test_popup_sign_in_round_trip() {
    let harness = Harness::start().await;
    harness.auth.restore().await;
    let state = harness.state();

    let identity = state
        .session()
        .login_with_provider(ProviderKind::GitHub)
        .await
        .expect("popup sign in");

    assert_eq!(identity.uid, UserId::new("fb-gh"));
    assert_eq!(identity.primary_provider_id(), "github.com");
    assert_eq!(
        harness.stub.calls(),
        [
            "accounts:createAuthUri",
            "accounts:signInWithIdp",
            "accounts:lookup"
        ]
    );

    let signups = state
        .activity()
        .recent(Some(ActivityKind::Signup), 10)
        .await
        .expect("activity");
    assert_eq!(signups.len(), 1, "new popup users are logged");
}
