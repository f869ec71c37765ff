//! Admin views.
//!
//! # Usage
//!
//! ```bash
//! census admin issues --status open
//! census admin activity --type signup --limit 20
//! census admin users
//! ```
//!
//! Requires an account listed in `ADMIN_EMAILS`.

use literacy_census_client::activity::{ActivityEntry, ActivityEvent};
use literacy_census_client::guard::Route;
use literacy_census_client::{AppState, Result};
use literacy_census_core::{ActivityKind, StatusFilter};

use super::issue::print_issues;
use super::{enter, format_time};

/// Every issue, optionally filtered by status.
#[allow(clippy::print_stdout)]
pub async fn issues(state: &AppState, status: Option<&str>) -> Result<()> {
    enter(state, &Route::AdminIssues)?;

    let issues = state
        .issues()
        .get_issues(&StatusFilter::from_query(status))
        .await?;
    if issues.is_empty() {
        println!("No issues.");
        return Ok(());
    }
    print_issues(&issues);
    Ok(())
}

/// Recent activity.
#[allow(clippy::print_stdout)]
pub async fn activity(state: &AppState, kind: Option<ActivityKind>, limit: usize) -> Result<()> {
    enter(state, &Route::AdminActivity)?;

    let entries = state.activity().recent(kind, limit).await?;
    if entries.is_empty() {
        println!("No activity.");
        return Ok(());
    }
    for entry in &entries {
        println!(
            "{:<16} {:<13} {}",
            format_time(entry.timestamp),
            entry.event.kind().as_str(),
            describe(entry)
        );
    }
    Ok(())
}

/// Registered users, most recent signup first.
#[allow(clippy::print_stdout)]
pub async fn users(state: &AppState) -> Result<()> {
    enter(state, &Route::AdminActivity)?;

    let users = state.activity().registered_users().await?;
    for user in &users {
        println!(
            "{:<16} {:<10} {}  {}",
            format_time(user.last_signup_at),
            user.provider.as_deref().unwrap_or("-"),
            user.email.as_deref().unwrap_or("-"),
            user.display_name.as_deref().unwrap_or(""),
        );
    }
    println!("\n{} registered user(s)", users.len());
    Ok(())
}

fn describe(entry: &ActivityEntry) -> String {
    match &entry.event {
        ActivityEvent::Signup(details) => format!(
            "{} via {}",
            details
                .email
                .as_deref()
                .unwrap_or_else(|| details.user_id.as_str()),
            details.provider
        ),
        ActivityEvent::SchoolCreate(change)
        | ActivityEvent::SchoolEdit(change)
        | ActivityEvent::SchoolDelete(change) => format!(
            "{} by {}",
            change.school_name,
            change
                .email
                .as_deref()
                .unwrap_or_else(|| change.user_id.as_str())
        ),
    }
}
