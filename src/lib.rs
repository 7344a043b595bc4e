// src/lib.rs
//! cid2records library: resolves on-chain content hashes into document
//! graphs and materializes them as typed property records.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `FetchError`, `ValidationError`
//! - **Configuration**: `GatewayConfig`, `IndexerConfig`, `PipelineConfig`
//! - **Domain types**: `Cid`, `CanonicalId`, `DocumentType`, `GeometryParent`
//! - **Document model**: `Document`, `Label`, `RelationshipRecord`, `Entity`
//! - **Document sources**: `DocumentSource`, `GatewayClient`, `DocumentCache`, `GraphReader`
//! - **Resolution**: `IdentityResolver`, `Scheduler`, `SubmissionProcessor`

mod api;
mod config;
pub mod constants;
mod error;
mod error_recovery;
mod model;
mod processor;
mod resolve;
mod scheduler;
mod schema;
mod sink;
mod types;

// --- Error Handling ---
pub use crate::error::{error_chain_text, AppError, FetchError, NetworkFailureKind};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{
    AllowList, CommandLineInput, Endpoint, EndpointKey, GatewayConfig, IndexerConfig,
    PipelineConfig, SourceSelection,
};

// --- Domain Types ---
pub use crate::types::{CanonicalId, Cid, DocumentType, GeometryParent, ProvisionalId};

// --- Document Model ---
pub use crate::model::{Document, Entity, Label, LinkValue, RecordKind, RelationshipRecord};
pub use crate::schema::{FieldKind, SchemaRegistry, TypedRecord};

// --- Document Sources ---
pub use crate::api::{
    DocumentCache, DocumentSource, GatewayClient, GraphReader, LimiterRegistry,
    LocalDocumentStore, RateLimiter,
};
pub use crate::error_recovery::{retry_with_policy, AttemptFailure, RetriesExhausted, RetryPolicy};

// --- Resolution ---
pub use crate::resolve::{
    both_targets, directional_target, first_link, links_for, parcel_identifier, relation_shape,
    side_of, strict_target, Direction, IdentityResolver, RelationShape, Strategy,
};
pub use crate::scheduler::{AggregateResult, Phase, Scheduler, SchedulerOptions};

// --- Sink & Processing ---
pub use crate::processor::{
    HeartbeatEvent, ProcessedSubmission, SubmissionEvent, SubmissionProcessor,
};
pub use crate::sink::{InMemorySink, UpsertSink};
