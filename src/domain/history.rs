use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use crate::domain::Restaurant;

/// A past draw.
///
/// The chosen restaurant is embedded by value so the record stays readable
/// after the restaurant disappears from the remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    id: Uuid,
    restaurant: Restaurant,
    selected_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub(crate) fn new(restaurant: Restaurant) -> Self {
        Self {
            id: Uuid::new_v4(),
            restaurant,
            selected_at: Utc::now(),
        }
    }

    /// Unique identity of the record.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// The restaurant as it was when drawn.
    #[must_use]
    pub const fn restaurant(&self) -> &Restaurant {
        &self.restaurant
    }

    /// When the draw happened.
    #[must_use]
    pub const fn selected_at(&self) -> DateTime<Utc> {
        self.selected_at
    }
}

/// Insertion-ordered log of [`HistoryRecord`]s with unique ids.
///
/// Records are only ever appended, or removed one at a time by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<HistoryRecord>")]
pub struct History {
    records: Vec<HistoryRecord>,
}

impl History {
    /// An empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a record for `restaurant`, stamped with the current time.
    pub fn record(&mut self, restaurant: Restaurant) -> &HistoryRecord {
        let mut record = HistoryRecord::new(restaurant);
        while self.contains(record.id) {
            record.id = Uuid::new_v4();
        }
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// Remove the record with the given id, if any.
    pub fn remove(&mut self, id: Uuid) -> Option<HistoryRecord> {
        let index = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(index))
    }

    /// Look up a record by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&HistoryRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Whether a record with the given id exists.
    #[must_use]
    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    /// Records in insertion order, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryRecord> {
        self.records.iter()
    }

    /// Records sorted by selection time, newest first.
    ///
    /// Ties keep reverse insertion order.
    #[must_use]
    pub fn newest_first(&self) -> Vec<&HistoryRecord> {
        let mut records: Vec<_> = self.records.iter().rev().collect();
        records.sort_by(|a, b| b.selected_at.cmp(&a.selected_at));
        records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<HistoryRecord>> for History {
    fn from(records: Vec<HistoryRecord>) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let total = records.len();
        let records: Vec<_> = records.into_iter().filter(|r| seen.insert(r.id)).collect();

        if records.len() < total {
            tracing::warn!(
                dropped = total - records.len(),
                "Dropped history records with duplicate ids"
            );
        }

        Self { records }
    }
}

impl Serialize for History {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryRecord;
    type IntoIter = std::slice::Iter<'a, HistoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
