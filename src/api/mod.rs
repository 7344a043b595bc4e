// src/api/mod.rs
//! Document retrieval: the ability to fetch a graph node by CID.
//!
//! Resolution logic depends on [`DocumentSource`], never on HTTP details.
//! Sources compose: a [`GatewayClient`] or a [`LocalDocumentStore`] is
//! usually wrapped in a [`DocumentCache`] and read through a
//! [`GraphReader`].

pub mod cache;
pub mod client;
pub mod local;
pub mod rate_limit;
pub mod reader;

use crate::error::FetchError;
use crate::types::{Cid, DocumentType};
use serde_json::Value;
use std::sync::Arc;

pub use cache::DocumentCache;
pub use client::GatewayClient;
pub use local::LocalDocumentStore;
pub use rate_limit::{LimiterRegistry, RateLimiter};
pub use reader::GraphReader;

/// The ability to retrieve a validated document body.
///
/// A returned payload has passed the validator for `doc_type`.
#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, doc_type: DocumentType, cid: &Cid) -> Result<Value, FetchError>;
}

#[async_trait::async_trait]
impl<T: DocumentSource + ?Sized> DocumentSource for Arc<T> {
    async fn fetch(&self, doc_type: DocumentType, cid: &Cid) -> Result<Value, FetchError> {
        (**self).fetch(doc_type, cid).await
    }
}
