//! Append-only activity log and user registry.
//!
//! Every signup and every school write is recorded as one immutable entry in
//! the `activityLog` collection, stamped with the server clock. Signups also
//! merge-write a `users/{uid}` registry entry, so repeated signups for the
//! same account keep a single row.
//!
//! Recording is best-effort: failures are logged and never reach the caller,
//! so a broken log cannot fail the action being logged.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use literacy_census_core::{ActivityId, ActivityKind, Identity, SchoolDraft, SchoolId, UserId};
use serde::{Deserialize, Serialize};

use crate::store::{Direction, DocumentStore, Fields, StoreError};

pub const ACTIVITY_COLLECTION: &str = "activityLog";
pub const USERS_COLLECTION: &str = "users";

/// A loggable event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityEvent {
    Signup(SignupDetails),
    SchoolCreate(SchoolChange),
    SchoolEdit(SchoolChange),
    SchoolDelete(SchoolChange),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupDetails {
    pub user_id: UserId,
    pub email: Option<String>,
    pub display_name: Option<String>,
    /// Primary linked provider id, or `unknown`.
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolChange {
    pub user_id: UserId,
    pub email: Option<String>,
    pub school_id: SchoolId,
    pub school_name: String,
    pub district_name: String,
    pub state: String,
}

impl ActivityEvent {
    #[must_use]
    pub fn signup(identity: &Identity) -> Self {
        Self::Signup(SignupDetails {
            user_id: identity.uid.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            provider: identity.primary_provider_id().to_owned(),
        })
    }

    #[must_use]
    pub fn school_create(actor: &Identity, id: &SchoolId, school: &SchoolDraft) -> Self {
        Self::SchoolCreate(SchoolChange::new(actor, id, school))
    }

    #[must_use]
    pub fn school_edit(actor: &Identity, id: &SchoolId, school: &SchoolDraft) -> Self {
        Self::SchoolEdit(SchoolChange::new(actor, id, school))
    }

    #[must_use]
    pub fn school_delete(actor: &Identity, id: &SchoolId, school: &SchoolDraft) -> Self {
        Self::SchoolDelete(SchoolChange::new(actor, id, school))
    }

    #[must_use]
    pub const fn kind(&self) -> ActivityKind {
        match self {
            Self::Signup(_) => ActivityKind::Signup,
            Self::SchoolCreate(_) => ActivityKind::SchoolCreate,
            Self::SchoolEdit(_) => ActivityKind::SchoolEdit,
            Self::SchoolDelete(_) => ActivityKind::SchoolDelete,
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        match self {
            Self::Signup(details) => &details.user_id,
            Self::SchoolCreate(change) | Self::SchoolEdit(change) | Self::SchoolDelete(change) => {
                &change.user_id
            }
        }
    }
}

impl SchoolChange {
    fn new(actor: &Identity, id: &SchoolId, school: &SchoolDraft) -> Self {
        Self {
            user_id: actor.uid.clone(),
            email: actor.email.clone(),
            school_id: id.clone(),
            school_name: school.school_name.clone(),
            district_name: school.district_name.clone(),
            state: school.state.clone(),
        }
    }
}

/// Where activity events go.
#[async_trait]
pub trait ActivitySink: Send + Sync {
    /// Record an event. Never fails from the caller's point of view.
    async fn record(&self, event: ActivityEvent);
}

/// A stored activity-log entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityId,
    #[serde(flatten)]
    pub event: ActivityEvent,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A `users` registry row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUser {
    pub uid: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub last_signup_at: Option<DateTime<Utc>>,
}

/// [`ActivitySink`] writing to the document store.
#[derive(Clone)]
pub struct ActivityLog {
    store: Arc<dyn DocumentStore>,
}

impl ActivityLog {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append one entry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    pub async fn append(&self, event: &ActivityEvent) -> Result<ActivityId, StoreError> {
        let fields = Fields::from_serialize(event)?.server_timestamp("timestamp");
        let id = self.store.add(ACTIVITY_COLLECTION, fields).await?;
        Ok(ActivityId::new(id))
    }

    /// Merge-write the registry entry for a signed-up user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    pub async fn register_user(&self, details: &SignupDetails) -> Result<(), StoreError> {
        let fields = Fields::new()
            .set("uid", details.user_id.as_str())
            .set("email", details.email.clone())
            .set("displayName", details.display_name.clone())
            .set("provider", details.provider.as_str())
            .server_timestamp("lastSignupAt");
        self.store
            .set_merge(USERS_COLLECTION, details.user_id.as_str(), fields)
            .await
    }

    /// Most recent entries first, optionally only of one kind.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails or an entry is malformed.
    pub async fn recent(
        &self,
        kind: Option<ActivityKind>,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, StoreError> {
        let docs = self
            .store
            .list_ordered(ACTIVITY_COLLECTION, "timestamp", Direction::Descending)
            .await?;

        let mut entries = Vec::new();
        for doc in docs {
            if entries.len() >= limit {
                break;
            }
            let entry: ActivityEntry = doc.decode()?;
            if kind.is_none_or(|k| entry.event.kind() == k) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Registered users, most recent signup first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails or an entry is malformed.
    pub async fn registered_users(&self) -> Result<Vec<RegisteredUser>, StoreError> {
        self.store
            .list_ordered(USERS_COLLECTION, "lastSignupAt", Direction::Descending)
            .await?
            .iter()
            .map(crate::store::Document::decode)
            .collect()
    }
}

#[async_trait]
impl ActivitySink for ActivityLog {
    async fn record(&self, event: ActivityEvent) {
        match self.append(&event).await {
            Ok(id) => tracing::debug!(%id, kind = %event.kind(), "Activity recorded"),
            Err(e) => tracing::error!(error = %e, kind = %event.kind(), "Error logging activity"),
        }

        if let ActivityEvent::Signup(details) = &event
            && let Err(e) = self.register_user(details).await
        {
            tracing::error!(error = %e, uid = %details.user_id, "Error updating user registry");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::store::MemoryDocumentStore;

    fn draft() -> SchoolDraft {
        SchoolDraft {
            state: "VT".to_owned(),
            district_id: "5000001".to_owned(),
            district_name: "Addison Central".to_owned(),
            school_id: "500000100001".to_owned(),
            school_name: "Bridport Central".to_owned(),
            provider_name: "Heggerty".to_owned(),
            product_name: "Bridge to Reading".to_owned(),
            adoption_year: Some(2024),
            notes: None,
        }
    }

    #[test]
    fn test_signup_event_shape() {
        let identity = Identity::new("u1").with_email("a@x.com");
        let value = serde_json::to_value(ActivityEvent::signup(&identity)).unwrap();
        assert_eq!(value["type"], "signup");
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["provider"], "unknown");
        assert!(value["displayName"].is_null());
    }

    #[test]
    fn test_school_event_shape() {
        let actor = Identity::new("u1").with_email("a@x.com");
        let event = ActivityEvent::school_edit(&actor, &SchoolId::new("s1"), &draft());
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "school_edit");
        assert_eq!(value["schoolId"], "s1");
        assert_eq!(value["schoolName"], "Bridport Central");
        assert_eq!(value["districtName"], "Addison Central");
        assert_eq!(value["state"], "VT");
    }

    #[tokio::test]
    async fn test_record_appends_with_timestamp() {
        let store = Arc::new(MemoryDocumentStore::new());
        let log = ActivityLog::new(store.clone());
        let actor = Identity::new("u1");

        log.record(ActivityEvent::school_create(&actor, &SchoolId::new("s1"), &draft()))
            .await;

        let entries = log.recent(None, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event.kind(), ActivityKind::SchoolCreate);
        assert!(entries[0].timestamp.is_some());
        assert_eq!(store.count(USERS_COLLECTION), 0);
    }

    #[tokio::test]
    async fn test_repeated_signup_keeps_one_registry_entry() {
        let store = Arc::new(MemoryDocumentStore::new());
        let log = ActivityLog::new(store.clone());
        let identity = Identity::new("u1").with_email("a@x.com").with_provider("google.com");

        log.record(ActivityEvent::signup(&identity)).await;
        log.record(ActivityEvent::signup(&identity.clone().with_display_name("Ada")))
            .await;

        assert_eq!(store.count(ACTIVITY_COLLECTION), 2);
        let users = log.registered_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].display_name.as_deref(), Some("Ada"));
        assert_eq!(users[0].provider.as_deref(), Some("google.com"));
    }

    #[tokio::test]
    async fn test_recent_filters_and_limits() {
        let store = Arc::new(MemoryDocumentStore::new());
        let log = ActivityLog::new(store);
        let actor = Identity::new("u1");

        for n in 0..3 {
            log.record(ActivityEvent::school_create(
                &actor,
                &SchoolId::new(format!("s{n}")),
                &draft(),
            ))
            .await;
        }
        log.record(ActivityEvent::signup(&actor)).await;

        let creates = log.recent(Some(ActivityKind::SchoolCreate), 2).await.unwrap();
        assert_eq!(creates.len(), 2);
        match &creates[0].event {
            ActivityEvent::SchoolCreate(change) => assert_eq!(change.school_id.as_str(), "s2"),
            other => panic!("unexpected event: {other:?}"),
        }

        let latest = log.recent(None, 1).await.unwrap();
        assert_eq!(latest[0].event.kind(), ActivityKind::Signup);
    }

    #[tokio::test]
    async fn test_record_swallows_store_failure() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.set_unavailable(true);
        let log = ActivityLog::new(store.clone());

        log.record(ActivityEvent::signup(&Identity::new("u1"))).await;

        store.set_unavailable(false);
        assert_eq!(store.count(ACTIVITY_COLLECTION), 0);
    }
}
