//! Issue and activity vocabularies.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Kind of problem an issue reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Bug,
    Feature,
    /// Wrong or missing directory/school data.
    Data,
    #[default]
    #[serde(other)]
    Other,
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bug => write!(f, "bug"),
            Self::Feature => write!(f, "feature"),
            Self::Data => write!(f, "data"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for IssueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bug" => Ok(Self::Bug),
            "feature" => Ok(Self::Feature),
            "data" => Ok(Self::Data),
            "other" => Ok(Self::Other),
            _ => Err(format!("invalid issue type: {s}")),
        }
    }
}

/// Issue priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IssuePriority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for IssuePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for IssuePriority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("invalid issue priority: {s}")),
        }
    }
}

/// Issue status.
///
/// New issues start as [`IssueStatus::OPEN`]; admins may set any other
/// status string afterwards, so this is a free-form value rather than an enum.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueStatus(String);

impl IssueStatus {
    pub const OPEN: &'static str = "open";

    #[must_use]
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    #[must_use]
    pub fn open() -> Self {
        Self(Self::OPEN.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for IssueStatus {
    fn default() -> Self {
        Self::open()
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IssueStatus {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Status filter applied when listing issues.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// No filtering (`all` or absent).
    #[default]
    All,
    Only(IssueStatus),
}

impl StatusFilter {
    /// Parse a filter from an optional query value.
    ///
    /// `None`, the empty string and `all` select every issue.
    #[must_use]
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("" | "all") => Self::All,
            Some(status) => Self::Only(IssueStatus::new(status)),
        }
    }

    #[must_use]
    pub fn matches(&self, status: &IssueStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

/// Activity-log event type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Signup,
    SchoolCreate,
    SchoolEdit,
    SchoolDelete,
}

impl ActivityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::SchoolCreate => "school_create",
            Self::SchoolEdit => "school_edit",
            Self::SchoolDelete => "school_delete",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signup" => Ok(Self::Signup),
            "school_create" => Ok(Self::SchoolCreate),
            "school_edit" => Ok(Self::SchoolEdit),
            "school_delete" => Ok(Self::SchoolDelete),
            _ => Err(format!("invalid activity type: {s}")),
        }
    }
}
