// src/model/entity.rs
use crate::schema::TypedRecord;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The record tables an upsert can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordKind {
    /// One row per submission event, exactly as received
    Submission,
    /// One row per heartbeat event, exactly as received
    Heartbeat,
    /// The root-level summary of a resolved submission
    #[serde(rename = "DataSubmittedWithLabel")]
    DataSubmission,
    Property,
    Address,
    /// Fact sheet
    Ipfs,
    SalesHistory,
    Tax,
    Structure,
    Utility,
    Layout,
    Lot,
    Parcel,
    Geometry,
    Improvement,
    Inspection,
    File,
    Company,
    Person,
    Deed,
    MailingAddress,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataSubmission => f.write_str("DataSubmittedWithLabel"),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A materialized record: a table, a stable id and flat fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: RecordKind,
    pub id: String,
    pub fields: IndexMap<String, Value>,
}

impl Entity {
    pub fn new(kind: RecordKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            fields: IndexMap::new(),
        }
    }

    /// Takes every projected field of a typed record.
    pub fn from_record(kind: RecordKind, id: impl Into<String>, record: TypedRecord) -> Self {
        Self {
            kind,
            id: id.into(),
            fields: record.fields,
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Sets the field only when a value is given.
    pub fn with_opt<V: Into<Value>>(mut self, name: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.fields.insert(name.to_string(), value.into());
        }
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}
