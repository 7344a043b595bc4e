// src/types/ids.rs
use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The parcel identifier: the join key shared by every record that
/// describes one real-world property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(String);

impl CanonicalId {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField("parcel_identifier"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The key used for a root before its canonical identifier is known:
/// the raw property hash exactly as submitted on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProvisionalId(String);

impl ProvisionalId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProvisionalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which kind of parent a geometry hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryParent {
    Parcel,
    Address,
    Layout,
}

impl GeometryParent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parcel => "parcel",
            Self::Address => "address",
            Self::Layout => "layout",
        }
    }

    /// The link field the geometry record carries for this parent.
    pub fn link_field(&self) -> &'static str {
        match self {
            Self::Parcel => "parcel_id",
            Self::Address => "address_id",
            Self::Layout => "layout_id",
        }
    }

    /// `{cid}-{kind}-{parent_id}`, so one geometry attached to several
    /// parents yields one record per attachment.
    pub fn composite_id(&self, geometry_cid: &str, parent_id: &str) -> String {
        format!("{}-{}-{}", geometry_cid, self.as_str(), parent_id)
    }
}
