//! School adoption records.
//!
//! Every write is followed by the matching activity-log event. The log is
//! best-effort; a failed log write never fails the school write.

use std::sync::Arc;

use literacy_census_core::{Identity, SchoolDraft, SchoolId, SchoolRecord};

use crate::activity::{ActivityEvent, ActivitySink};
use crate::store::{Direction, DocumentStore, Fields, StoreError};

pub const SCHOOLS_COLLECTION: &str = "schools";

/// School records over the `schools` collection.
#[derive(Clone)]
pub struct SchoolRegistry {
    store: Arc<dyn DocumentStore>,
    activity: Arc<dyn ActivitySink>,
}

impl SchoolRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, activity: Arc<dyn ActivitySink>) -> Self {
        Self { store, activity }
    }

    /// Add a school record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    pub async fn create(
        &self,
        actor: &Identity,
        school: &SchoolDraft,
    ) -> Result<SchoolId, StoreError> {
        let fields = draft_fields(school)?
            .set("createdBy", actor.uid.as_str())
            .set("createdByEmail", actor.email.clone())
            .server_timestamp("createdAt")
            .server_timestamp("updatedAt");

        let id = SchoolId::new(self.store.add(SCHOOLS_COLLECTION, fields).await?);
        tracing::info!(%id, school = %school.school_name, "School created");

        self.activity
            .record(ActivityEvent::school_create(actor, &id, school))
            .await;
        Ok(id)
    }

    /// Replace the form fields of an existing record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the record does not exist.
    pub async fn update(
        &self,
        actor: &Identity,
        id: &SchoolId,
        school: &SchoolDraft,
    ) -> Result<(), StoreError> {
        let fields = draft_fields(school)?
            .set("updatedBy", actor.uid.as_str())
            .server_timestamp("updatedAt");

        self.store
            .update(SCHOOLS_COLLECTION, id.as_str(), fields)
            .await?;
        tracing::info!(%id, school = %school.school_name, "School updated");

        self.activity
            .record(ActivityEvent::school_edit(actor, id, school))
            .await;
        Ok(())
    }

    /// Delete a record, logging what it was.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the record does not exist.
    pub async fn delete(&self, actor: &Identity, id: &SchoolId) -> Result<(), StoreError> {
        let record = self.get(id).await?.ok_or_else(|| StoreError::NotFound {
            collection: SCHOOLS_COLLECTION.to_owned(),
            id: id.to_string(),
        })?;

        self.store.delete(SCHOOLS_COLLECTION, id.as_str()).await?;
        tracing::info!(%id, school = %record.draft.school_name, "School deleted");

        self.activity
            .record(ActivityEvent::school_delete(actor, id, &record.draft))
            .await;
        Ok(())
    }

    /// Fetch one record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails or the record is malformed.
    pub async fn get(&self, id: &SchoolId) -> Result<Option<SchoolRecord>, StoreError> {
        self.store
            .get(SCHOOLS_COLLECTION, id.as_str())
            .await?
            .map(|doc| doc.decode())
            .transpose()
    }

    /// Every record, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails or a record is malformed.
    pub async fn list(&self) -> Result<Vec<SchoolRecord>, StoreError> {
        self.store
            .list_ordered(SCHOOLS_COLLECTION, "createdAt", Direction::Descending)
            .await?
            .iter()
            .map(crate::store::Document::decode)
            .collect()
    }
}

/// Form fields, with optional ones written explicitly so edits can clear them.
fn draft_fields(school: &SchoolDraft) -> Result<Fields, StoreError> {
    Ok(Fields::from_serialize(school)?
        .set("adoptionYear", school.adoption_year)
        .set("notes", school.notes.clone()))
}
