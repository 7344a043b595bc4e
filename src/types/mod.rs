// src/types/mod.rs
//! Domain types shared by every layer: content identifiers, document
//! types and the validation vocabulary.

use thiserror::Error;

mod content_id;
mod document_type;
mod ids;

pub use content_id::*;
pub use document_type::*;
pub use ids::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid hash hex '{input}': {reason}")]
    InvalidHash { input: String, reason: String },

    #[error("Invalid content identifier '{0}'")]
    InvalidCid(String),

    #[error("{doc_type} payload is not a JSON object")]
    NotAnObject { doc_type: DocumentType },

    #[error("{doc_type} payload is missing required field '{field}'")]
    MissingField {
        doc_type: DocumentType,
        field: &'static str,
    },

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Empty required field: {0}")]
    EmptyField(&'static str),
}
