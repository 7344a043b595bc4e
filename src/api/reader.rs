// src/api/reader.rs
use super::DocumentSource;
use crate::error::FetchError;
use crate::model::{Document, RelationshipRecord};
use crate::schema::{SchemaRegistry, TypedRecord};
use crate::types::{Cid, DocumentType};
use serde_json::Value;
use std::sync::Arc;

/// Typed view over a [`DocumentSource`].
#[derive(Clone)]
pub struct GraphReader {
    source: Arc<dyn DocumentSource>,
    schemas: Arc<SchemaRegistry>,
}

impl GraphReader {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self::with_schemas(source, Arc::new(SchemaRegistry::new()))
    }

    pub fn with_schemas(source: Arc<dyn DocumentSource>, schemas: Arc<SchemaRegistry>) -> Self {
        Self { source, schemas }
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// A labelled metadata node.
    pub async fn document(&self, cid: &Cid) -> Result<Document, FetchError> {
        let raw = self.source.fetch(DocumentType::Metadata, cid).await?;
        Document::from_json(cid.clone(), &raw).map_err(|e| invalid(DocumentType::Metadata, cid, e))
    }

    /// A `{from, to}` edge node.
    pub async fn relationship(&self, cid: &Cid) -> Result<RelationshipRecord, FetchError> {
        let raw = self.source.fetch(DocumentType::Relationship, cid).await?;
        Ok(RelationshipRecord::from_json(&raw))
    }

    /// A data node projected through the active schema for its type.
    pub async fn record(
        &self,
        doc_type: DocumentType,
        cid: &Cid,
    ) -> Result<TypedRecord, FetchError> {
        let raw = self.source.fetch(doc_type, cid).await?;
        self.schemas
            .transform(doc_type, &raw)
            .map_err(|e| invalid(doc_type, cid, e))
    }

    /// A node whose shape is not known yet.
    pub async fn probe(&self, cid: &Cid) -> Result<Value, FetchError> {
        self.source.fetch(DocumentType::Probe, cid).await
    }
}

fn invalid(doc_type: DocumentType, cid: &Cid, err: impl std::fmt::Display) -> FetchError {
    FetchError::InvalidPayload {
        doc_type,
        cid: cid.clone(),
        reason: err.to_string(),
    }
}
