//! Public schools directory lookups.
//!
//! Read-only client for the NCES School Characteristics feature service
//! (an `ArcGIS` `FeatureServer/0/query` endpoint). Each lookup is one GET with:
//!
//! - `where` - equality predicate, or `1=1`
//! - `outFields` - comma-separated projection
//! - `orderByFields` - optional sort field
//! - `returnDistinctValues=true` - optional
//! - `returnGeometry=false`, `f=json`
//!
//! No retries and no caching: every call hits the service.

use std::cmp::Ordering;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

/// Errors that can occur when querying the directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service returned a non-success status.
    #[error("Directory returned HTTP {status}")]
    Status { status: u16 },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Service reported an error inside a successful response.
    #[error("Directory API error {code}: {message}")]
    Api { code: i64, message: String },
}

/// A school district.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct District {
    /// LEAID.
    pub id: String,
    pub name: String,
}

/// A school.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct School {
    /// NCESSCH.
    pub id: String,
    pub name: String,
}

/// One feature query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureQuery {
    pub where_clause: String,
    pub out_fields: Vec<&'static str>,
    pub order_by: Option<&'static str>,
    pub distinct: bool,
}

impl FeatureQuery {
    /// Query every feature.
    #[must_use]
    pub fn all(out_fields: &[&'static str]) -> Self {
        Self {
            where_clause: "1=1".to_owned(),
            out_fields: out_fields.to_vec(),
            order_by: None,
            distinct: false,
        }
    }

    /// Query features whose `field` equals `value`.
    #[must_use]
    pub fn matching(field: &str, value: &str, out_fields: &[&'static str]) -> Self {
        Self {
            where_clause: equals(field, value),
            ..Self::all(out_fields)
        }
    }

    #[must_use]
    pub const fn order_by(mut self, field: &'static str) -> Self {
        self.order_by = Some(field);
        self
    }

    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    fn apply(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("where", &self.where_clause)
            .append_pair("outFields", &self.out_fields.join(","))
            .append_pair("returnGeometry", "false")
            .append_pair("f", "json");
        if let Some(field) = self.order_by {
            pairs.append_pair("orderByFields", field);
        }
        if self.distinct {
            pairs.append_pair("returnDistinctValues", "true");
        }
    }
}

/// SQL-92 equality predicate with the value quoted.
fn equals(field: &str, value: &str) -> String {
    format!("{field}='{}'", value.replace('\'', "''"))
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    features: Option<Vec<Feature>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    attributes: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// Directory API client.
#[derive(Debug, Clone)]
pub struct DirectoryClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl DirectoryClient {
    /// Create a client for the feature-query `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(endpoint: Url) -> Result<Self, DirectoryError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("literacy-census/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, endpoint })
    }

    /// Run one query and return each feature's attributes.
    ///
    /// A response without `features` yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` on network, status, parse or API errors.
    pub async fn query(&self, query: &FeatureQuery) -> Result<Vec<Map<String, Value>>, DirectoryError> {
        let mut url = self.endpoint.clone();
        query.apply(&mut url);

        tracing::debug!(where_clause = %query.where_clause, "Querying schools directory");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                status: status.as_u16(),
            });
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| DirectoryError::Parse(format!("Failed to parse response: {e}")))?;

        if let Some(error) = body.error {
            return Err(DirectoryError::Api {
                code: error.code,
                message: error.message,
            });
        }

        Ok(body
            .features
            .unwrap_or_default()
            .into_iter()
            .map(|f| f.attributes)
            .collect())
    }

    /// Two-letter state abbreviations, sorted.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the query fails.
    pub async fn states(&self) -> Result<Vec<String>, DirectoryError> {
        let rows = self
            .query(&FeatureQuery::all(&["STABR"]).order_by("STABR").distinct())
            .await?;

        let mut states: Vec<String> = rows
            .iter()
            .filter_map(|row| attribute(row, "STABR"))
            .collect();
        states.sort();
        states.dedup();
        Ok(states)
    }

    /// Districts in `state`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the query fails.
    pub async fn districts(&self, state: &str) -> Result<Vec<District>, DirectoryError> {
        let rows = self
            .query(
                &FeatureQuery::matching("STABR", state, &["LEAID", "LEA_NAME"])
                    .order_by("LEA_NAME")
                    .distinct(),
            )
            .await?;

        let mut districts: Vec<District> = rows
            .iter()
            .filter_map(|row| {
                Some(District {
                    name: attribute(row, "LEA_NAME")?,
                    id: attribute(row, "LEAID").unwrap_or_default(),
                })
            })
            .collect();
        districts.sort_by(|a, b| by_name(&a.name, &b.name));
        Ok(districts)
    }

    /// Schools in district `leaid`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns `DirectoryError` if the query fails.
    pub async fn schools(&self, leaid: &str) -> Result<Vec<School>, DirectoryError> {
        let rows = self
            .query(
                &FeatureQuery::matching("LEAID", leaid, &["NCESSCH", "SCH_NAME"])
                    .order_by("SCH_NAME"),
            )
            .await?;

        let mut schools: Vec<School> = rows
            .iter()
            .filter_map(|row| {
                Some(School {
                    name: attribute(row, "SCH_NAME")?,
                    id: attribute(row, "NCESSCH").unwrap_or_default(),
                })
            })
            .collect();
        schools.sort_by(|a, b| by_name(&a.name, &b.name));
        Ok(schools)
    }
}

/// Non-blank attribute as a string; numeric ids are rendered as-is.
fn attribute(row: &Map<String, Value>, key: &str) -> Option<String> {
    let value = match row.get(key)? {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!value.is_empty()).then_some(value)
}

/// Case-insensitive name order, ties broken by exact comparison.
fn by_name(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_equals_escapes_quotes() {
        assert_eq!(equals("STABR", "VT"), "STABR='VT'");
        assert_eq!(equals("LEA_NAME", "O'Brien"), "LEA_NAME='O''Brien'");
    }

    #[test]
    fn test_query_parameters() {
        let mut url = Url::parse("http://localhost/query").unwrap();
        FeatureQuery::matching("STABR", "VT", &["LEAID", "LEA_NAME"])
            .order_by("LEA_NAME")
            .distinct()
            .apply(&mut url);

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |k: &str| pairs.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("where"), Some("STABR='VT'"));
        assert_eq!(get("outFields"), Some("LEAID,LEA_NAME"));
        assert_eq!(get("orderByFields"), Some("LEA_NAME"));
        assert_eq!(get("returnDistinctValues"), Some("true"));
        assert_eq!(get("returnGeometry"), Some("false"));
        assert_eq!(get("f"), Some("json"));
    }

    #[test]
    fn test_optional_parameters_omitted() {
        let mut url = Url::parse("http://localhost/query").unwrap();
        FeatureQuery::all(&["STABR"]).apply(&mut url);
        assert!(!url.as_str().contains("orderByFields"));
        assert!(!url.as_str().contains("returnDistinctValues"));
        assert!(url.as_str().contains("where=1%3D1"));
    }

    #[test]
    fn test_attribute_skips_blank_and_null() {
        let row = json!({"A": "  ", "B": null, "C": 5_000_001, "D": " VT "});
        let row = row.as_object().unwrap();
        assert_eq!(attribute(row, "A"), None);
        assert_eq!(attribute(row, "B"), None);
        assert_eq!(attribute(row, "C").as_deref(), Some("5000001"));
        assert_eq!(attribute(row, "D").as_deref(), Some("VT"));
        assert_eq!(attribute(row, "missing"), None);
    }

    #[test]
    fn test_name_order_is_case_insensitive() {
        let mut names = vec!["beta", "Alpha", "alpha", "Gamma"];
        names.sort_by(|a, b| by_name(a, b));
        assert_eq!(names, vec!["Alpha", "alpha", "beta", "Gamma"]);
    }
}
