//! Firebase Authentication over the Identity Toolkit REST API.
//!
//! # API Reference
//!
//! - Identity Toolkit: `https://identitytoolkit.googleapis.com/v1/accounts:*`
//! - Secure Token: `https://securetoken.googleapis.com/v1/token`
//! - Authentication: project Web API key via the `key` query parameter
//!
//! Popup providers use the `createAuthUri` / `signInWithIdp` pair with a
//! loopback redirect (see [`callback`]). The refresh token is persisted to a
//! local file and exchanged for a fresh ID token by [`FirebaseAuth::restore`]
//! on startup, which is also what publishes the initial auth state.

pub mod callback;
pub mod persistence;
mod wire;

use std::sync::Arc;

use async_trait::async_trait;
use literacy_census_core::{Identity, LinkedProvider, ProviderKind, UserId};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use self::callback::CallbackServer;
use self::persistence::{PersistedSession, SessionFile};
use self::wire::{
    CreateAuthUriRequest, CreateAuthUriResponse, ErrorEnvelope, IdpRequest, LookupRequest,
    LookupResponse, PasswordRequest, RefreshResponse, TokenResponse,
};
use super::{AuthError, AuthStateListener, AuthStateNotifier, IdentityProvider, SignInOutcome, Subscription};
use crate::config::FirebaseConfig;

/// Identity Toolkit base URL.
const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1/";

/// Secure Token API base URL.
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/";

/// Provider id recorded for email/password accounts.
const PASSWORD_PROVIDER: &str = "password";

/// Called with the consent-page URL the user must open to finish a popup sign-in.
pub type PopupPresenter = Arc<dyn Fn(ProviderKind, &Url) + Send + Sync>;

/// Firebase Authentication client.
pub struct FirebaseAuth {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    identity_toolkit: Url,
    secure_token: Url,
    session_file: SessionFile,
    notifier: AuthStateNotifier,
    presenter: PopupPresenter,
}

impl FirebaseAuth {
    /// Create a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &FirebaseConfig, session_file: SessionFile) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("literacy-census/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            identity_toolkit: parse_base(IDENTITY_TOOLKIT_URL)?,
            secure_token: parse_base(SECURE_TOKEN_URL)?,
            session_file,
            notifier: AuthStateNotifier::new(),
            presenter: Arc::new(|kind, url| {
                tracing::info!(provider = %kind, %url, "Open this URL to continue sign-in");
            }),
        })
    }

    /// Point the client at different API hosts, such as the Auth emulator.
    #[must_use]
    pub fn with_endpoints(mut self, identity_toolkit: Url, secure_token: Url) -> Self {
        self.identity_toolkit = identity_toolkit;
        self.secure_token = secure_token;
        self
    }

    /// Route the Identity Toolkit and Secure Token APIs through an Auth
    /// emulator at `host` (for example `localhost:9099`).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Callback` if `host` does not form a valid URL.
    pub fn with_emulator(self, host: &str) -> Result<Self, AuthError> {
        let identity_toolkit = parse_base(&format!(
            "http://{host}/identitytoolkit.googleapis.com/v1/"
        ))?;
        let secure_token = parse_base(&format!("http://{host}/securetoken.googleapis.com/v1/"))?;
        Ok(self.with_endpoints(identity_toolkit, secure_token))
    }

    /// Replace how the consent-page URL is shown to the user.
    #[must_use]
    pub fn with_popup_presenter(mut self, presenter: PopupPresenter) -> Self {
        self.presenter = presenter;
        self
    }

    /// Restore the persisted session and publish the initial auth state.
    ///
    /// Never fails: any problem is logged and the user starts signed out.
    pub async fn restore(&self) {
        let identity = match self.try_restore().await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "Could not restore previous session");
                if let Err(clear_err) = self.session_file.clear().await {
                    tracing::warn!(error = %clear_err, "Failed to clear stale session file");
                }
                None
            }
        };

        if let Some(identity) = &identity {
            tracing::info!(uid = %identity.uid, "Restored previous session");
        }
        self.notifier.publish(identity);
    }

    async fn try_restore(&self) -> Result<Option<Identity>, AuthError> {
        let Some(persisted) = self
            .session_file
            .load()
            .await
            .map_err(AuthError::Persistence)?
        else {
            return Ok(None);
        };

        let refreshed = self.refresh(&persisted.refresh_token).await?;
        if refreshed.user_id != persisted.uid.as_str() {
            return Err(AuthError::SessionExpired);
        }

        let identity = self.lookup(&refreshed.id_token, None).await?;
        self.persist(&identity.uid, &refreshed.refresh_token).await;
        Ok(Some(identity))
    }

    /// Exchange a refresh token for a fresh ID token.
    async fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, AuthError> {
        let url = self.endpoint(&self.secure_token, "token")?;
        let response = self
            .client
            .post(url)
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Execute an Identity Toolkit `accounts:<method>` call.
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, AuthError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(&self.identity_toolkit, &format!("accounts:{method}"))?;
        let response = self.client.post(url).json(body).send().await?;
        Self::handle_response(response).await
    }

    fn endpoint(&self, base: &Url, path: &str) -> Result<Url, AuthError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(AuthError::NotConfigured("FIREBASE_API_KEY"))?;
        // `accounts:signUp` would otherwise parse as a URL with scheme `accounts`.
        let mut url = base
            .join(&format!("./{path}"))
            .map_err(|e| AuthError::Callback(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("key", api_key.expose_secret());
        Ok(url)
    }

    async fn handle_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AuthError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => Err(AuthError::from_provider_message(&envelope.error.message)),
            Err(_) => Err(AuthError::Provider {
                code: status.as_u16().to_string(),
                message: Some(body),
            }),
        }
    }

    /// Fetch the account behind an ID token.
    ///
    /// `fallback_provider` is recorded when the account reports no linked
    /// providers.
    async fn lookup(
        &self,
        id_token: &str,
        fallback_provider: Option<&str>,
    ) -> Result<Identity, AuthError> {
        let response: LookupResponse = self.call("lookup", &LookupRequest { id_token }).await?;
        let user = response
            .users
            .into_iter()
            .next()
            .ok_or(AuthError::SessionExpired)?;

        let mut providers: Vec<LinkedProvider> = user
            .provider_user_info
            .into_iter()
            .map(|info| LinkedProvider::new(info.provider_id))
            .collect();
        if providers.is_empty()
            && let Some(fallback) = fallback_provider
        {
            providers.push(LinkedProvider::new(fallback));
        }

        Ok(Identity {
            uid: UserId::new(user.local_id),
            email: user.email,
            display_name: user.display_name,
            providers,
        })
    }

    /// Turn a token response into the signed-in identity and publish it.
    async fn establish(
        &self,
        tokens: &TokenResponse,
        fallback_provider: &str,
    ) -> Result<Identity, AuthError> {
        let identity = match self.lookup(&tokens.id_token, Some(fallback_provider)).await {
            Ok(identity) => identity,
            Err(e) => {
                // The sign-in itself succeeded; fall back to what it reported.
                tracing::warn!(error = %e, "Account lookup failed after sign-in");
                Identity {
                    uid: UserId::new(tokens.local_id.clone()),
                    email: tokens.email.clone(),
                    display_name: tokens.display_name.clone(),
                    providers: vec![LinkedProvider::new(
                        tokens.provider_id.as_deref().unwrap_or(fallback_provider),
                    )],
                }
            }
        };

        self.persist(&identity.uid, &tokens.refresh_token).await;
        self.notifier.publish(Some(identity.clone()));
        Ok(identity)
    }

    async fn persist(&self, uid: &UserId, refresh_token: &str) {
        let session = PersistedSession {
            uid: uid.clone(),
            refresh_token: refresh_token.to_owned(),
        };
        if let Err(e) = self.session_file.save(&session).await {
            tracing::warn!(
                error = %e,
                path = %self.session_file.path().display(),
                "Failed to persist session; it will not survive a restart"
            );
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn sign_in_with_popup(&self, kind: ProviderKind) -> Result<SignInOutcome, AuthError> {
        let server = CallbackServer::start().await?;

        let auth: CreateAuthUriResponse = self
            .call(
                "createAuthUri",
                &CreateAuthUriRequest {
                    provider_id: kind.provider_id(),
                    continue_uri: server.redirect_uri().as_str(),
                },
            )
            .await?;
        let auth_uri = Url::parse(&auth.auth_uri).map_err(|e| AuthError::Provider {
            code: "INVALID_AUTH_URI".to_owned(),
            message: Some(e.to_string()),
        })?;

        (self.presenter)(kind, &auth_uri);
        let request_uri = server.wait().await?;

        let tokens: TokenResponse = self
            .call(
                "signInWithIdp",
                &IdpRequest {
                    request_uri: request_uri.as_str(),
                    session_id: &auth.session_id,
                    return_secure_token: true,
                    return_idp_credential: true,
                },
            )
            .await?;

        if tokens.need_confirmation {
            return Err(AuthError::AccountExists);
        }
        if let Some(message) = &tokens.error_message {
            return Err(AuthError::from_provider_message(message));
        }

        let identity = self.establish(&tokens, kind.provider_id()).await?;
        Ok(SignInOutcome {
            identity,
            is_new_user: tokens.is_new_user,
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError> {
        let tokens: TokenResponse = self
            .call(
                "signInWithPassword",
                &PasswordRequest {
                    email,
                    password: password.expose_secret(),
                    return_secure_token: true,
                },
            )
            .await?;
        self.establish(&tokens, PASSWORD_PROVIDER).await
    }

    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError> {
        let tokens: TokenResponse = self
            .call(
                "signUp",
                &PasswordRequest {
                    email,
                    password: password.expose_secret(),
                    return_secure_token: true,
                },
            )
            .await?;
        self.establish(&tokens, PASSWORD_PROVIDER).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.session_file
            .clear()
            .await
            .map_err(AuthError::Persistence)?;
        self.notifier.publish(None);
        Ok(())
    }

    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription {
        self.notifier.subscribe(listener)
    }
}

fn parse_base(raw: &str) -> Result<Url, AuthError> {
    Url::parse(raw).map_err(|e| AuthError::Callback(format!("invalid endpoint {raw}: {e}")))
}
