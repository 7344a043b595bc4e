// src/model/mod.rs
//! Documents as fetched and entities as upserted.

mod document;
mod entity;

pub use document::{Document, Label, LinkValue, RelationshipRecord};
pub use entity::{Entity, RecordKind};
