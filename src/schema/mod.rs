// src/schema/mod.rs
//! Validation and projection of raw document bodies.
//!
//! Field lists live in [`catalog`] as data keyed by document type and
//! version; this module only knows how to apply them.

mod catalog;

use crate::types::{DocumentType, ValidationError};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// How a field's raw value is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Strings kept, numbers and booleans stringified
    Text,
    /// Years may arrive as numbers; always emitted as text
    YearText,
    /// Numbers kept, numeric strings parsed
    Number,
    /// Booleans kept, "true"/"false" strings parsed
    Bool,
    /// Arrays and objects serialized to a JSON string
    JsonText,
    /// Passed through untouched, null included, when the key is present
    Raw,
}

/// Value used when a field is absent and the destination column is non-null.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Zero,
    False,
    EmptyText,
}

impl FieldDefault {
    fn value(&self) -> Value {
        match self {
            Self::Zero => Value::from(0),
            Self::False => Value::Bool(false),
            Self::EmptyText => Value::String(String::new()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Name in the typed record.
    pub name: &'static str,
    /// Input names in precedence order; empty means `name` itself.
    pub sources: &'static [&'static str],
    pub kind: FieldKind,
    pub default: Option<FieldDefault>,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            sources: &[],
            kind,
            default: None,
        }
    }

    pub const fn read_from(mut self, sources: &'static [&'static str]) -> Self {
        self.sources = sources;
        self
    }

    pub const fn or_default(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    fn source_names(&self) -> &[&'static str] {
        if self.sources.is_empty() {
            std::slice::from_ref(&self.name)
        } else {
            self.sources
        }
    }
}

/// What a payload must contain to be accepted at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discriminator {
    /// Any JSON object
    Object,
    /// An object with this field holding a string
    StringField(&'static str),
    /// An object with this field holding a `{"/": cid}` link
    LinkField(&'static str),
}

#[derive(Debug)]
pub struct Schema {
    pub doc_type: DocumentType,
    pub version: u16,
    pub discriminator: Discriminator,
    pub fields: &'static [FieldSpec],
}

/// A validated projection of one document body.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedRecord {
    pub doc_type: DocumentType,
    pub version: u16,
    pub fields: IndexMap<String, Value>,
}

impl TypedRecord {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// A non-empty string field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Schemas by type and version, with one active version per type.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<(DocumentType, u16), &'static Schema>,
    active: HashMap<DocumentType, u16>,
}

static CURRENT: Lazy<SchemaRegistry> = Lazy::new(SchemaRegistry::new);

impl SchemaRegistry {
    /// All known schemas with the latest version of each type active.
    pub fn new() -> Self {
        let mut schemas = HashMap::new();
        let mut active: HashMap<DocumentType, u16> = HashMap::new();
        for schema in catalog::SCHEMAS {
            schemas.insert((schema.doc_type, schema.version), schema);
            let latest = active.entry(schema.doc_type).or_insert(schema.version);
            *latest = (*latest).max(schema.version);
        }
        Self { schemas, active }
    }

    /// The shared registry with latest versions active.
    pub fn current() -> &'static SchemaRegistry {
        &CURRENT
    }

    /// Selects an older (or newer) version for one type.
    pub fn pin(mut self, doc_type: DocumentType, version: u16) -> Option<Self> {
        if !self.schemas.contains_key(&(doc_type, version)) {
            return None;
        }
        self.active.insert(doc_type, version);
        Some(self)
    }

    pub fn versions(&self, doc_type: DocumentType) -> Vec<u16> {
        let mut versions: Vec<u16> = self
            .schemas
            .keys()
            .filter(|(t, _)| *t == doc_type)
            .map(|(_, v)| *v)
            .collect();
        versions.sort_unstable();
        versions
    }

    pub fn schema(&self, doc_type: DocumentType) -> Option<&'static Schema> {
        let version = self.active.get(&doc_type)?;
        self.schemas.get(&(doc_type, *version)).copied()
    }

    /// Checks the minimal shape of a payload.
    pub fn validate(&self, doc_type: DocumentType, raw: &Value) -> Result<(), ValidationError> {
        let object = raw
            .as_object()
            .ok_or(ValidationError::NotAnObject { doc_type })?;

        let discriminator = self
            .schema(doc_type)
            .map(|s| s.discriminator)
            .unwrap_or(Discriminator::Object);

        match discriminator {
            Discriminator::Object => Ok(()),
            Discriminator::StringField(field) => match object.get(field) {
                Some(Value::String(s)) if !s.is_empty() => Ok(()),
                _ => Err(ValidationError::MissingField { doc_type, field }),
            },
            Discriminator::LinkField(field) => {
                if object.get(field).and_then(link_target).is_some() {
                    Ok(())
                } else {
                    Err(ValidationError::MissingField { doc_type, field })
                }
            }
        }
    }

    /// Validates and projects a payload into its typed record.
    pub fn transform(
        &self,
        doc_type: DocumentType,
        raw: &Value,
    ) -> Result<TypedRecord, ValidationError> {
        self.validate(doc_type, raw)?;
        let object = raw
            .as_object()
            .ok_or(ValidationError::NotAnObject { doc_type })?;

        let Some(schema) = self.schema(doc_type) else {
            return Ok(TypedRecord {
                doc_type,
                version: 0,
                fields: object.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            });
        };

        let mut fields = IndexMap::with_capacity(schema.fields.len());
        for spec in schema.fields {
            if let Some(value) = project_field(spec, object) {
                fields.insert(spec.name.to_string(), value);
            }
        }

        Ok(TypedRecord {
            doc_type,
            version: schema.version,
            fields,
        })
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The CID string inside a `{"/": cid}` link.
pub(crate) fn link_target(value: &Value) -> Option<&str> {
    value
        .get("/")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn project_field(spec: &FieldSpec, object: &Map<String, Value>) -> Option<Value> {
    if spec.kind == FieldKind::Raw {
        return spec
            .source_names()
            .iter()
            .find_map(|name| object.get(*name).cloned())
            .or_else(|| spec.default.map(|d| d.value()));
    }

    spec.source_names()
        .iter()
        .filter_map(|name| object.get(*name))
        .filter(|v| !is_absent(v))
        .find_map(|v| coerce(spec.kind, v))
        .or_else(|| spec.default.map(|d| d.value()))
}

fn coerce(kind: FieldKind, value: &Value) -> Option<Value> {
    match (kind, value) {
        (FieldKind::Raw, v) => Some(v.clone()),
        (FieldKind::Text | FieldKind::YearText, Value::String(s)) => Some(Value::String(s.clone())),
        (FieldKind::Text | FieldKind::YearText, Value::Number(n)) => {
            Some(Value::String(n.to_string()))
        }
        (FieldKind::Text, Value::Bool(b)) => Some(Value::String(b.to_string())),
        (FieldKind::Text, Value::Array(_)) => Some(value.clone()),
        (FieldKind::Number, Value::Number(_)) => Some(value.clone()),
        (FieldKind::Number, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        (FieldKind::Bool, Value::Bool(_)) => Some(value.clone()),
        (FieldKind::Bool, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        (FieldKind::JsonText, Value::Array(_) | Value::Object(_)) => {
            serde_json::to_string(value).ok().map(Value::String)
        }
        (FieldKind::JsonText, Value::String(s)) => Some(Value::String(s.clone())),
        _ => None,
    }
}
