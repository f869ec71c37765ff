//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! census login github
//! census login email -e teacher@example.org
//! CENSUS_PASSWORD=... census signup -e teacher@example.org
//! census whoami
//! census logout
//! ```

use literacy_census_client::guard::Route;
use literacy_census_client::{AppState, Result};
use literacy_census_core::{Identity, ProviderKind};

use super::{enter, read_password};

/// Sign in through a popup provider.
pub async fn login(state: &AppState, kind: ProviderKind) -> Result<()> {
    if let Some(identity) = enter(state, &Route::Login)? {
        already_signed_in(&identity);
        return Ok(());
    }

    let identity = state.session().login_with_provider(kind).await?;
    signed_in_as(&identity, state.session().is_admin());
    Ok(())
}

/// Sign in with email and password.
pub async fn login_email(state: &AppState, email: &str) -> Result<()> {
    if let Some(identity) = enter(state, &Route::Login)? {
        already_signed_in(&identity);
        return Ok(());
    }

    let password = read_password().await?;
    let identity = state.session().login_with_email(email, &password).await?;
    signed_in_as(&identity, state.session().is_admin());
    Ok(())
}

/// Create an email/password account.
pub async fn signup(state: &AppState, email: &str) -> Result<()> {
    if let Some(identity) = enter(state, &Route::Login)? {
        already_signed_in(&identity);
        return Ok(());
    }

    let password = read_password().await?;
    let identity = state.session().sign_up_with_email(email, &password).await?;
    signed_in_as(&identity, state.session().is_admin());
    Ok(())
}

/// Sign out.
#[allow(clippy::print_stdout)]
pub async fn logout(state: &AppState) -> Result<()> {
    if state.session().identity().is_none() {
        println!("Not signed in.");
        return Ok(());
    }
    state.session().logout().await?;
    println!("Signed out.");
    Ok(())
}

/// Show the signed-in user.
#[allow(clippy::print_stdout)]
pub fn whoami(state: &AppState) {
    let snapshot = state.session().snapshot();
    let Some(identity) = snapshot.identity else {
        println!("Not signed in.");
        return;
    };

    println!("User ID:  {}", identity.uid);
    println!("Email:    {}", identity.email.as_deref().unwrap_or("-"));
    println!("Name:     {}", identity.display_name.as_deref().unwrap_or("-"));
    println!("Provider: {}", identity.primary_provider_id());
    println!("Role:     {}", if snapshot.is_admin { "admin" } else { "user" });
}

#[allow(clippy::print_stdout)]
fn signed_in_as(identity: &Identity, is_admin: bool) {
    let who = identity.email.as_deref().unwrap_or_else(|| identity.uid.as_str());
    if is_admin {
        println!("Signed in as {who} (admin).");
    } else {
        println!("Signed in as {who}.");
    }
}

#[allow(clippy::print_stdout)]
fn already_signed_in(identity: &Identity) {
    let who = identity.email.as_deref().unwrap_or_else(|| identity.uid.as_str());
    println!("Already signed in as {who}. Run `census logout` first to switch accounts.");
}
