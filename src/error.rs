// src/error.rs
//! Error types for the fetch layer and the application.
//!
//! Most gateway failures never surface: they are retried inside the
//! client. What does surface is either a bounded not-found, a missing
//! endpoint, or something an offline source cannot retry.

use crate::types::{Cid, DocumentType};
use std::fmt;
use thiserror::Error;

/// Diagnostic category of a transport failure.
///
/// Categories are for operators reading logs; every category is retried
/// the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailureKind {
    DnsResolutionFailed,
    ConnectionRefused,
    ConnectionTimeout,
    ConnectionReset,
    Timeout,
    RequestAborted,
    /// Body arrived but could not be read or decoded as JSON
    Decode,
    Unknown,
}

impl NetworkFailureKind {
    /// Classifies a reqwest error by its flags and its source chain.
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_decode() || err.is_body() {
            return Self::Decode;
        }

        let chain = error_chain_text(err).to_ascii_lowercase();
        if chain.contains("dns") || chain.contains("failed to lookup") || chain.contains("enotfound") {
            Self::DnsResolutionFailed
        } else if chain.contains("connection refused") || chain.contains("econnrefused") {
            Self::ConnectionRefused
        } else if chain.contains("connection reset") || chain.contains("econnreset") {
            Self::ConnectionReset
        } else if err.is_timeout() && err.is_connect() {
            Self::ConnectionTimeout
        } else if err.is_timeout() || chain.contains("timed out") {
            Self::Timeout
        } else if chain.contains("aborted") || chain.contains("canceled") {
            Self::RequestAborted
        } else {
            Self::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DnsResolutionFailed => "DNS_RESOLUTION_FAILED",
            Self::ConnectionRefused => "CONNECTION_REFUSED",
            Self::ConnectionTimeout => "CONNECTION_TIMEOUT",
            Self::ConnectionReset => "CONNECTION_RESET",
            Self::Timeout => "TIMEOUT",
            Self::RequestAborted => "REQUEST_ABORTED",
            Self::Decode => "DECODE_FAILED",
            Self::Unknown => "UNKNOWN_NETWORK_ERROR",
        }
    }
}

impl fmt::Display for NetworkFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Joins an error and all of its sources into one line.
pub fn error_chain_text(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Failure of a single document fetch, as seen by the scheduler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("{doc_type} fetch failed with status 404 after {attempts} attempts (cid {cid})")]
    NotFoundAfterRetries {
        doc_type: DocumentType,
        cid: Cid,
        attempts: u32,
    },

    #[error("No gateway configured for {doc_type} documents")]
    EndpointNotConfigured { doc_type: DocumentType },

    #[error("Cannot build request URL for {cid} from '{base}': {reason}")]
    InvalidRequestUrl {
        base: String,
        cid: Cid,
        reason: String,
    },

    #[error("{doc_type} payload for {cid} failed validation: {reason}")]
    InvalidPayload {
        doc_type: DocumentType,
        cid: Cid,
        reason: String,
    },
}

impl FetchError {
    /// Whether the document is known not to exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFoundAfterRetries { .. })
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidConfiguration { key: String, reason: String },

    #[error("Submitter {0} is not on the allow-list")]
    SubmitterNotAllowed(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error for {path}: {source}")]
    JsonParseError {
        path: std::path::PathBuf,
        source: serde_json::Error,
    },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError {
            message: format!("{:#}", err),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalError {
            message: "JSON serialization failed".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn not_found_message_names_type_and_attempts() {
        let err = FetchError::NotFoundAfterRetries {
            doc_type: DocumentType::Tax,
            cid: Cid::new("bafytax").unwrap(),
            attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "tax fetch failed with status 404 after 3 attempts (cid bafytax)"
        );
        assert!(err.is_not_found());
        assert!(!FetchError::EndpointNotConfigured {
            doc_type: DocumentType::Tax
        }
        .is_not_found());
    }

    #[test]
    fn error_chain_joins_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let app = AppError::Io(io);
        assert!(error_chain_text(&app).contains("connection refused"));
    }

    #[test]
    fn failure_kinds_render_for_logs() {
        assert_eq!(
            NetworkFailureKind::DnsResolutionFailed.to_string(),
            "DNS_RESOLUTION_FAILED"
        );
        assert_eq!(NetworkFailureKind::Unknown.as_str(), "UNKNOWN_NETWORK_ERROR");
    }
}
