//! Issue reports.
//!
//! Any signed-in user can file an issue; admins list them and move them
//! through statuses. Status filtering happens after the fetch, on the
//! newest-first list of every issue.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use literacy_census_core::{
    Identity, IssueId, IssuePriority, IssueStatus, IssueType, StatusFilter, UserId,
};
use serde::Deserialize;

use crate::store::{Direction, DocumentStore, Fields, StoreError};

pub const ISSUES_COLLECTION: &str = "issues";

/// Form input for a new issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    /// Defaults to [`IssueType::Other`].
    pub issue_type: Option<IssueType>,
    /// Defaults to [`IssuePriority::Medium`].
    pub priority: Option<IssuePriority>,
}

/// A stored issue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: IssueId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub issue_type: IssueType,
    #[serde(default)]
    pub priority: IssuePriority,
    #[serde(default)]
    pub status: IssueStatus,
    pub created_by: UserId,
    #[serde(default)]
    pub created_by_email: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_by: Option<UserId>,
}

/// Issue tracker over the `issues` collection.
#[derive(Clone)]
pub struct IssueTracker {
    store: Arc<dyn DocumentStore>,
}

impl IssueTracker {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// File a new issue as `actor`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    pub async fn create_issue(
        &self,
        actor: &Identity,
        issue: NewIssue,
    ) -> Result<IssueId, StoreError> {
        let fields = Fields::new()
            .set("title", issue.title)
            .set("description", issue.description)
            .set("type", issue.issue_type.unwrap_or_default().to_string())
            .set("priority", issue.priority.unwrap_or_default().to_string())
            .set("status", IssueStatus::OPEN)
            .set("createdBy", actor.uid.as_str())
            .set("createdByEmail", actor.email.clone())
            .server_timestamp("createdAt")
            .server_timestamp("updatedAt");

        let id = IssueId::new(self.store.add(ISSUES_COLLECTION, fields).await?);
        tracing::info!(%id, uid = %actor.uid, "Issue created");
        Ok(id)
    }

    /// Every issue matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails or an issue is malformed.
    pub async fn get_issues(&self, filter: &StatusFilter) -> Result<Vec<Issue>, StoreError> {
        let docs = self
            .store
            .list_ordered(ISSUES_COLLECTION, "createdAt", Direction::Descending)
            .await?;

        let mut issues = Vec::with_capacity(docs.len());
        for doc in &docs {
            let issue: Issue = doc.decode()?;
            if filter.matches(&issue.status) {
                issues.push(issue);
            }
        }
        Ok(issues)
    }

    /// Fetch one issue.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails or the issue is malformed.
    pub async fn get_issue(&self, id: &IssueId) -> Result<Option<Issue>, StoreError> {
        self.store
            .get(ISSUES_COLLECTION, id.as_str())
            .await?
            .map(|doc| doc.decode())
            .transpose()
    }

    /// Set an issue's status, stamping who changed it and when.
    ///
    /// Performs no authorization check; callers gate this behind the admin
    /// route.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the issue does not exist.
    pub async fn update_issue_status(
        &self,
        id: &IssueId,
        status: &IssueStatus,
        actor: &Identity,
    ) -> Result<(), StoreError> {
        let fields = Fields::new()
            .set("status", status.as_str())
            .set("updatedBy", actor.uid.as_str())
            .server_timestamp("updatedAt");

        self.store
            .update(ISSUES_COLLECTION, id.as_str(), fields)
            .await?;
        tracing::info!(%id, %status, uid = %actor.uid, "Issue status updated");
        Ok(())
    }
}
