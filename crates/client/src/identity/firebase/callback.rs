//! Loopback listener that receives the OAuth redirect.
//!
//! The provider's consent page redirects the browser back to
//! `http://localhost:<port>/__/auth/callback?...`; the full redirect URL is
//! what `accounts:signInWithIdp` needs as its `requestUri`.

use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::extract::{OriginalUri, State};
use axum::response::Html;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use url::Url;

use super::super::AuthError;

/// Callback path registered with the provider.
pub const CALLBACK_PATH: &str = "/__/auth/callback";

const COMPLETE_PAGE: &str = "<!doctype html><title>Literacy Census</title>\
<p>Sign-in complete. You can close this window and return to the terminal.</p>";

type Slot = Arc<Mutex<Option<oneshot::Sender<String>>>>;

#[derive(Clone)]
struct CallbackState {
    origin: String,
    slot: Slot,
}

/// A running callback listener awaiting exactly one redirect.
pub struct CallbackServer {
    redirect_uri: Url,
    received: oneshot::Receiver<String>,
    shutdown: oneshot::Sender<()>,
}

impl CallbackServer {
    /// Bind an ephemeral loopback port and start serving.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Callback` if the port cannot be bound.
    pub async fn start() -> Result<Self, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(|e| AuthError::Callback(e.to_string()))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::Callback(e.to_string()))?
            .port();

        // Providers authorize `localhost`, not the literal loopback address.
        let origin = format!("http://localhost:{port}");
        let redirect_uri = Url::parse(&format!("{origin}{CALLBACK_PATH}"))
            .map_err(|e| AuthError::Callback(e.to_string()))?;

        let (sender, received) = oneshot::channel();
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();

        let state = CallbackState {
            origin,
            slot: Arc::new(Mutex::new(Some(sender))),
        };
        let app = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = serve.await {
                tracing::warn!(error = %e, "Sign-in callback listener stopped");
            }
        });

        tracing::debug!(%redirect_uri, "Sign-in callback listener started");

        Ok(Self {
            redirect_uri,
            received,
            shutdown,
        })
    }

    #[must_use]
    pub const fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// Wait for the browser to come back, then stop the listener.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PopupClosed` if the provider reported an error
    /// (for example the user denied consent).
    pub async fn wait(self) -> Result<Url, AuthError> {
        let received = self.received.await;
        let _ = self.shutdown.send(());

        let raw = received.map_err(|_| AuthError::PopupClosed)?;
        let url = Url::parse(&raw).map_err(|e| AuthError::Callback(e.to_string()))?;

        if let Some((_, reason)) = url.query_pairs().find(|(key, _)| key == "error") {
            tracing::warn!(%reason, "Provider returned an error to the sign-in callback");
            return Err(AuthError::PopupClosed);
        }

        Ok(url)
    }
}

async fn handle_callback(
    State(state): State<CallbackState>,
    OriginalUri(uri): OriginalUri,
) -> Html<&'static str> {
    let sender = state
        .slot
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();

    if let Some(sender) = sender {
        let _ = sender.send(format!("{}{uri}", state.origin));
    }

    Html(COMPLETE_PAGE)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_callback_returns_full_redirect_url() {
        let server = CallbackServer::start().await.unwrap();
        let mut target = server.redirect_uri().clone();
        target.set_query(Some("code=abc&state=xyz"));

        // Browsers hit localhost; the listener is on 127.0.0.1.
        let mut request = target.clone();
        request.set_host(Some("127.0.0.1")).unwrap();
        let body = reqwest::get(request).await.unwrap().text().await.unwrap();
        assert!(body.contains("Sign-in complete"));

        let received = server.wait().await.unwrap();
        assert_eq!(received, target);
    }

    #[tokio::test]
    async fn test_provider_error_is_popup_closed() {
        let server = CallbackServer::start().await.unwrap();
        let mut request = server.redirect_uri().clone();
        request.set_host(Some("127.0.0.1")).unwrap();
        request.set_query(Some("error=access_denied"));
        reqwest::get(request).await.unwrap();

        assert!(matches!(server.wait().await, Err(AuthError::PopupClosed)));
    }
}
