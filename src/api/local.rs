// src/api/local.rs
//! Offline document source.
//!
//! Serves documents from memory, optionally loaded from a directory of
//! `{cid}.json` files. Used for replaying captured graphs and in tests.

use super::DocumentSource;
use crate::error::{AppError, FetchError};
use crate::schema::SchemaRegistry;
use crate::types::{Cid, DocumentType};
use dashmap::DashMap;
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Default)]
pub struct LocalDocumentStore {
    documents: DashMap<Cid, Value>,
    fetches: DashMap<Cid, usize>,
}

impl LocalDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, cid: Cid, document: Value) {
        self.documents.insert(cid, document);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(self, cid: Cid, document: Value) -> Self {
        self.insert(cid, document);
        self
    }

    /// Loads every `*.json` file in `dir`; the file stem is the CID.
    pub fn from_dir(dir: &Path) -> Result<Self, AppError> {
        let store = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let cid = Cid::new(stem)?;
            let content = std::fs::read_to_string(&path)?;
            let document = serde_json::from_str(&content).map_err(|source| {
                AppError::JsonParseError {
                    path: path.clone(),
                    source,
                }
            })?;
            store.insert(cid, document);
        }
        log::info!("Loaded {} documents from {}", store.len(), dir.display());
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// How many times a CID was requested, whatever the outcome.
    pub fn fetch_count(&self, cid: &Cid) -> usize {
        self.fetches.get(cid).map(|c| *c).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl DocumentSource for LocalDocumentStore {
    async fn fetch(&self, doc_type: DocumentType, cid: &Cid) -> Result<Value, FetchError> {
        *self.fetches.entry(cid.clone()).or_insert(0) += 1;

        let document = self
            .documents
            .get(cid)
            .map(|d| d.value().clone())
            .ok_or_else(|| FetchError::NotFoundAfterRetries {
                doc_type,
                cid: cid.clone(),
                attempts: 1,
            })?;

        // nothing to wait for offline, so an invalid document is final
        SchemaRegistry::current()
            .validate(doc_type, &document)
            .map_err(|e| FetchError::InvalidPayload {
                doc_type,
                cid: cid.clone(),
                reason: e.to_string(),
            })?;
        Ok(document)
    }
}
