//! Issue reports.
//!
//! # Usage
//!
//! ```bash
//! census issue new -t "Adoption year missing for 2019" --type data -p high
//! census issue list
//! census issue status <ID> resolved    # admin only
//! ```

use literacy_census_client::guard::Route;
use literacy_census_client::issues::{Issue, NewIssue};
use literacy_census_client::{AppError, AppState, Result};
use literacy_census_core::{IssueId, IssuePriority, IssueStatus, IssueType, StatusFilter};

use super::{format_time, signed_in};

/// File a new issue.
#[allow(clippy::print_stdout)]
pub async fn create(
    state: &AppState,
    title: &str,
    description: &str,
    issue_type: Option<IssueType>,
    priority: Option<IssuePriority>,
) -> Result<()> {
    let actor = signed_in(state, &Route::ReportIssue)?;

    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }

    let id = state
        .issues()
        .create_issue(
            &actor,
            NewIssue {
                title: title.to_owned(),
                description: description.trim().to_owned(),
                issue_type,
                priority,
            },
        )
        .await?;
    println!("Reported issue {id}.");
    Ok(())
}

/// List issues reported by the signed-in user.
#[allow(clippy::print_stdout)]
pub async fn list_own(state: &AppState) -> Result<()> {
    let actor = signed_in(state, &Route::ReportIssue)?;

    let issues: Vec<Issue> = state
        .issues()
        .get_issues(&StatusFilter::All)
        .await?
        .into_iter()
        .filter(|issue| issue.created_by == actor.uid)
        .collect();

    if issues.is_empty() {
        println!("You have not reported any issues.");
        return Ok(());
    }
    print_issues(&issues);
    Ok(())
}

/// Set an issue's status.
#[allow(clippy::print_stdout)]
pub async fn set_status(state: &AppState, id: &str, status: &str) -> Result<()> {
    let actor = signed_in(state, &Route::AdminIssues)?;

    let status = status.trim();
    if status.is_empty() {
        return Err(AppError::BadRequest("Status is required".to_string()));
    }

    let id = IssueId::new(id);
    state
        .issues()
        .update_issue_status(&id, &IssueStatus::new(status), &actor)
        .await?;
    println!("Issue {id} is now {status}.");
    Ok(())
}

/// One line per issue, newest first.
#[allow(clippy::print_stdout)]
pub fn print_issues(issues: &[Issue]) {
    for issue in issues {
        println!(
            "{}  {:<16} {:<8} {:<7} {}  {}",
            issue.id,
            format_time(issue.created_at),
            issue.priority.to_string(),
            issue.issue_type.to_string(),
            issue.status,
            issue.title,
        );
    }
    println!("\n{} issue(s)", issues.len());
}
