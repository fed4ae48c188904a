//! Sample Dataset Module
//!
//! A tiny in-memory record set used as the backing source of the demo binary.
//! Identifiers may be numeric or textual and are never coerced: `2` and `"2"`
//! are different keys.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache::{AsyncLoader, Loader};
use crate::error::Result;

// == Data Key ==
/// Canonical key type for the dataset and its cache.
///
/// Equality is variant-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataKey {
    Int(i64),
    Text(String),
}

impl fmt::Display for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKey::Int(id) => write!(f, "{}", id),
            DataKey::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for DataKey {
    fn from(id: i64) -> Self {
        DataKey::Int(id)
    }
}

impl From<&str> for DataKey {
    fn from(id: &str) -> Self {
        DataKey::Text(id.to_string())
    }
}

impl From<String> for DataKey {
    fn from(id: String) -> Self {
        DataKey::Text(id)
    }
}

// == Record ==
/// One row of the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: DataKey,
    pub name: String,
    pub gender: String,
}

// == Sample Dataset ==
/// Record set that answers every lookup, using a placeholder for unknown ids.
#[derive(Debug, Clone)]
pub struct SampleDataset {
    records: Vec<Record>,
}

impl SampleDataset {
    /// The built-in two-row dataset. One id is numeric, the other textual.
    pub fn sample() -> Self {
        Self::new(vec![
            Record {
                id: DataKey::Int(2),
                name: "wole".to_string(),
                gender: "female".to_string(),
            },
            Record {
                id: DataKey::Text("3".to_string()),
                name: "Shade".to_string(),
                gender: "Female".to_string(),
            },
        ])
    }

    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Parses a JSON array of records.
    ///
    /// # Errors
    /// Returns `InvalidData` for malformed JSON or rows missing fields.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<Record> = serde_json::from_str(json)?;
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Finds the first record whose id strictly equals `key`.
    pub fn find(&self, key: &DataKey) -> Option<&Record> {
        self.records.iter().find(|record| &record.id == key)
    }

    /// Describes the record for `key`, or returns a not-found placeholder.
    pub fn lookup(&self, key: &DataKey) -> String {
        match self.find(key) {
            Some(record) => {
                info!("Fetching data for key: {}", key);
                format!("Data for {}", record.name)
            }
            None => format!("No data found for {}", key),
        }
    }
}

impl Default for SampleDataset {
    fn default() -> Self {
        Self::sample()
    }
}

impl Loader<DataKey, String> for SampleDataset {
    fn load(&self, key: &DataKey) -> Result<String> {
        Ok(self.lookup(key))
    }
}

#[async_trait]
impl AsyncLoader<DataKey, String> for SampleDataset {
    async fn load(&self, key: &DataKey) -> Result<String> {
        Ok(self.lookup(key))
    }
}
