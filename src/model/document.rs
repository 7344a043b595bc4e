// src/model/document.rs
use crate::schema::link_target;
use crate::types::{Cid, DocumentType, ValidationError};
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// The semantic type a graph node declares.
#[derive(Debug, Clone, PartialEq)]
pub enum Label {
    County,
    Relationship,
    PropertyImprovement,
    Seed,
    /// A label this crate has no dedicated handling for. The node's other
    /// top-level fields are kept as they arrived.
    Unknown {
        label: String,
        raw_fields: Map<String, Value>,
    },
}

impl Label {
    fn parse(label: &str, object: &Map<String, Value>) -> Self {
        match label.trim() {
            "County" => Self::County,
            "Relationship" => Self::Relationship,
            "Property Improvement" => Self::PropertyImprovement,
            "Seed" => Self::Seed,
            other => Self::Unknown {
                label: other.to_string(),
                raw_fields: object
                    .iter()
                    .filter(|(k, _)| k.as_str() != "label" && k.as_str() != "relationships")
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            },
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::County => "County",
            Self::Relationship => "Relationship",
            Self::PropertyImprovement => "Property Improvement",
            Self::Seed => "Seed",
            Self::Unknown { label, .. } => label.as_str(),
        }
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self, Self::Relationship)
    }
}

/// The value of one entry in a node's `relationships` map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkValue {
    Single(Cid),
    List(Vec<Cid>),
    /// One sub-list per parent
    Nested(Vec<Vec<Cid>>),
}

impl LinkValue {
    /// Parses a relation value, dropping malformed links.
    ///
    /// Returns `None` when nothing usable remains.
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Object(_) => parse_link(value).map(Self::Single),
            Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_array) => {
                let groups: Vec<Vec<Cid>> = items
                    .iter()
                    .filter_map(Value::as_array)
                    .map(|group| group.iter().filter_map(parse_link).collect())
                    .collect();
                if groups.iter().all(Vec::is_empty) {
                    None
                } else {
                    Some(Self::Nested(groups))
                }
            }
            Value::Array(items) => {
                let links: Vec<Cid> = items.iter().filter_map(parse_link).collect();
                if links.is_empty() {
                    None
                } else {
                    Some(Self::List(links))
                }
            }
            _ => None,
        }
    }

    /// Every CID in origin order.
    pub fn cids(&self) -> Vec<&Cid> {
        match self {
            Self::Single(cid) => vec![cid],
            Self::List(cids) => cids.iter().collect(),
            Self::Nested(groups) => groups.iter().flatten().collect(),
        }
    }
}

fn parse_link(value: &Value) -> Option<Cid> {
    link_target(value).and_then(|s| Cid::new(s).ok())
}

/// A labelled node of the document graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub cid: Cid,
    pub label: Label,
    pub relationships: IndexMap<String, LinkValue>,
}

impl Document {
    /// Parses a metadata payload. The label is the only hard requirement;
    /// a missing or malformed `relationships` map reads as empty.
    pub fn from_json(cid: Cid, raw: &Value) -> Result<Self, ValidationError> {
        let object = raw.as_object().ok_or(ValidationError::NotAnObject {
            doc_type: DocumentType::Metadata,
        })?;
        let label = object
            .get("label")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingField {
                doc_type: DocumentType::Metadata,
                field: "label",
            })?;

        let relationships = object
            .get("relationships")
            .and_then(Value::as_object)
            .map(|rels| {
                rels.iter()
                    .filter_map(|(name, value)| LinkValue::parse(value).map(|l| (name.clone(), l)))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            cid,
            label: Label::parse(label, object),
            relationships,
        })
    }

    pub fn relation(&self, name: &str) -> Option<&LinkValue> {
        self.relationships.get(name)
    }
}

/// A `{from, to}` edge. Either side may be missing in the wild.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RelationshipRecord {
    pub from: Option<Cid>,
    pub to: Option<Cid>,
}

impl RelationshipRecord {
    pub fn from_json(raw: &Value) -> Self {
        Self {
            from: raw.get("from").and_then(parse_link),
            to: raw.get("to").and_then(parse_link),
        }
    }

    /// Reads a payload as an edge only when it carries at least one link.
    pub fn from_probe(raw: &Value) -> Option<Self> {
        let record = Self::from_json(raw);
        (record.from.is_some() || record.to.is_some()).then_some(record)
    }
}
