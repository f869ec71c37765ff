//! In-process document store.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde_json::{Map, Value};

use super::{Direction, Document, DocumentStore, Fields, StoreError, format_timestamp};

type Collection = BTreeMap<String, Map<String, Value>>;

/// In-memory [`DocumentStore`].
///
/// Server timestamps are strictly increasing, even for writes within the
/// same microsecond.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Collection>>,
    clock: Mutex<Option<DateTime<Utc>>>,
    unavailable: AtomicBool,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Number of documents in `collection`.
    #[must_use]
    pub fn count(&self, collection: &str) -> usize {
        self.lock().get(collection).map_or(0, BTreeMap::len)
    }

    /// Snapshot of every document in `collection`, in id order.
    #[must_use]
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document {
                        id: id.clone(),
                        data: data.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Collection>> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable(
                "memory store switched off".to_owned(),
            ));
        }
        Ok(())
    }

    fn server_now(&self) -> String {
        let mut last = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        // Stored at microsecond precision, so compare at that precision.
        let mut now = Utc::now().trunc_subsecs(6);
        if let Some(previous) = *last
            && now <= previous
        {
            now = previous + Duration::microseconds(1);
        }
        *last = Some(now);
        format_timestamp(now)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        self.check_available()?;
        let id = uuid::Uuid::new_v4().simple().to_string();
        let data = fields.resolve(&self.server_now());
        self.lock()
            .entry(collection.to_owned())
            .or_default()
            .insert(id.clone(), data);
        Ok(id)
    }

    async fn set_merge(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let data = fields.resolve(&self.server_now());
        self.lock()
            .entry(collection.to_owned())
            .or_default()
            .entry(id.to_owned())
            .or_default()
            .extend(data);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.check_available()?;
        let data = fields.resolve(&self.server_now());
        let mut collections = self.lock();
        let existing = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.to_owned(),
            })?;
        existing.extend(data);
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.check_available()?;
        Ok(self
            .lock()
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document {
                id: id.to_owned(),
                data: data.clone(),
            }))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.check_available()?;
        if let Some(docs) = self.lock().get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn list_ordered(
        &self,
        collection: &str,
        field: &str,
        direction: Direction,
    ) -> Result<Vec<Document>, StoreError> {
        self.check_available()?;
        let mut docs: Vec<Document> = self
            .documents(collection)
            .into_iter()
            .filter(|doc| doc.data.get(field).is_some_and(|v| !v.is_null()))
            .collect();

        docs.sort_by(|a, b| {
            let ordering = compare_values(a.data.get(field), b.data.get(field))
                .then_with(|| a.id.cmp(&b.id));
            match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
        Ok(docs)
    }
}

/// Order JSON values: booleans, then numbers, then strings, then everything else.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    const fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
