//! School adoption records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{SchoolId, UserId};

/// Locally-entered fields of a school record, as submitted by the add/edit form.
///
/// District and school identifiers come from the directory lookup; the
/// curriculum fields come from the provider catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolDraft {
    /// Two-letter state abbreviation.
    pub state: String,
    /// District id (LEAID).
    pub district_id: String,
    pub district_name: String,
    /// School id (NCESSCH).
    pub school_id: String,
    pub school_name: String,
    pub provider_name: String,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adoption_year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A persisted school record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolRecord {
    pub id: SchoolId,
    #[serde(flatten)]
    pub draft: SchoolDraft,
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
