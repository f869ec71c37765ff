//! CLI command implementations.
//!
//! Every command runs through the same route guard as the screens it
//! replaces, via [`enter`] or [`signed_in`].

pub mod admin;
pub mod auth;
pub mod issue;
pub mod lookup;
pub mod migrate;
pub mod school;

use chrono::{DateTime, Utc};
use literacy_census_client::error::add_breadcrumb;
use literacy_census_client::guard::{self, Route};
use literacy_census_client::{AppError, AppState, Result};
use literacy_census_core::Identity;
use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Environment variable read before prompting for a password.
const PASSWORD_ENV: &str = "CENSUS_PASSWORD";

/// Run the route guard for `route` and return the signed-in identity, if any.
pub fn enter(state: &AppState, route: &Route) -> Result<Option<Identity>> {
    let snapshot = state.session().snapshot();
    guard::require(route, &snapshot)?;
    let path = route.path();
    add_breadcrumb("navigation", "Opened route", Some(&[("route", path.as_str())]));
    Ok(snapshot.identity)
}

/// [`enter`] for routes that need a signed-in user.
pub fn signed_in(state: &AppState, route: &Route) -> Result<Identity> {
    enter(state, route)?.ok_or_else(|| AppError::Unauthorized(route.path()))
}

/// Read a password from `CENSUS_PASSWORD`, or prompt for one on stdin.
pub async fn read_password() -> Result<SecretString> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(password));
    }

    #[allow(clippy::print_stderr)]
    {
        eprint!("Password: ");
    }

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .map_err(|e| AppError::Internal(format!("failed to read password: {e}")))?;

    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(AppError::BadRequest("Password is required".to_string()));
    }
    Ok(SecretString::from(password.to_owned()))
}

/// Render an optional timestamp for tables.
pub fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}
