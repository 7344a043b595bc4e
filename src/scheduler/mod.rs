// src/scheduler/mod.rs
//! Phased materialization of one root document.
//!
//! Phase 1 reads the property, address and fact sheet and settles the
//! parcel identifier. Phase 2 (sales, tax, deeds, improvements) and the
//! geometry phases 3 to 5 are keyed on that identifier and only run once
//! it is known. Inside a phase every fetch runs concurrently; a fetch that
//! fails permanently is logged and left out, its siblings carry on.

mod children;
mod geometry;
mod property_address;

use crate::api::GraphReader;
use crate::config::{GatewayConfig, IndexerConfig};
use crate::error::FetchError;
use crate::model::{Document, Entity, RecordKind, RelationshipRecord};
use crate::resolve::{directional_target, links_for, side_of, Direction, IdentityResolver};
use crate::schema::TypedRecord;
use crate::sink::UpsertSink;
use crate::types::{CanonicalId, Cid, DocumentType, ProvisionalId};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// What the scheduler materializes beyond the core records.
#[derive(Debug, Clone, Default)]
pub struct SchedulerOptions {
    pub side_records: bool,
    pub improvements: bool,
    /// Types with no gateway; never requested.
    pub disabled: BTreeSet<DocumentType>,
}

impl SchedulerOptions {
    pub fn new(indexer: &IndexerConfig) -> Self {
        Self {
            side_records: indexer.side_records,
            improvements: indexer.improvements,
            disabled: BTreeSet::new(),
        }
    }

    /// Disables every type the gateway configuration cannot serve.
    pub fn with_gateways(mut self, gateways: &GatewayConfig) -> Self {
        self.disabled = DocumentType::ALL
            .into_iter()
            .filter(|t| !gateways.is_enabled(*t))
            .collect();
        self
    }

    pub fn wants(&self, doc_type: DocumentType) -> bool {
        !self.disabled.contains(&doc_type)
    }
}

/// Labels for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PropertyAddress,
    SalesTax,
    Improvements,
    ParcelGeometry,
    AddressGeometry,
    LayoutGeometry,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PropertyAddress => "property_address",
            Self::SalesTax => "sales_tax",
            Self::Improvements => "improvements",
            Self::ParcelGeometry => "parcel_geometry",
            Self::AddressGeometry => "address_geometry",
            Self::LayoutGeometry => "layout_geometry",
        })
    }
}

/// Everything one root produced, for the caller's summary and re-keying.
#[derive(Debug, Clone)]
pub struct AggregateResult {
    pub root: Cid,
    pub provisional_id: ProvisionalId,
    pub canonical_id: Option<CanonicalId>,
    /// Set only when a Property record was written.
    pub property_id: Option<CanonicalId>,
    pub address_id: Option<Cid>,
    pub ipfs_id: Option<Cid>,
    pub sales_history: Vec<Entity>,
    pub taxes: Vec<Entity>,
    /// Structure, utility, layout and lot records from phase 1.
    pub side_records: Vec<Entity>,
    /// Everything else written after phase 1.
    pub records: Vec<Entity>,
}

impl AggregateResult {
    pub fn new(root: Cid, provisional_id: ProvisionalId) -> Self {
        Self {
            root,
            provisional_id,
            canonical_id: None,
            property_id: None,
            address_id: None,
            ipfs_id: None,
            sales_history: Vec::new(),
            taxes: Vec::new(),
            side_records: Vec::new(),
            records: Vec::new(),
        }
    }

    /// The id child records point their `data_submission_id` at.
    pub fn data_submission_id(&self) -> &str {
        self.canonical_id
            .as_ref()
            .map(CanonicalId::as_str)
            .unwrap_or_else(|| self.provisional_id.as_str())
    }

    /// Points every property-keyed record at `canonical` and returns the
    /// records that must be written again.
    pub fn rekey(&mut self, canonical: &CanonicalId) -> Vec<Entity> {
        self.canonical_id = Some(canonical.clone());
        let mut rewritten = Vec::new();
        for entity in self
            .sales_history
            .iter_mut()
            .chain(self.taxes.iter_mut())
            .chain(self.side_records.iter_mut())
        {
            if entity.text("property_id") != Some(canonical.as_str()) {
                entity.set("property_id", canonical.as_str());
                rewritten.push(entity.clone());
            }
        }
        rewritten
    }

    /// Every record this root wrote, in write order per group.
    pub fn all_records(&self) -> impl Iterator<Item = &Entity> {
        self.side_records
            .iter()
            .chain(self.sales_history.iter())
            .chain(self.taxes.iter())
            .chain(self.records.iter())
    }

    pub fn records_of(&self, kind: RecordKind) -> Vec<&Entity> {
        self.all_records().filter(|e| e.kind == kind).collect()
    }
}

/// A data record reached through an edge.
#[derive(Debug, Clone)]
struct Linked {
    cid: Cid,
    edge: RelationshipRecord,
    record: TypedRecord,
}

/// Outcome of looking up the property in phase 1.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PropertyLookup {
    Found(CanonicalId),
    /// The property record was reached but carries no identifier, or
    /// could not be fetched.
    NoIdentifier,
    /// The root has no usable `property_has_address` edge.
    TargetUnknown,
}

pub struct Scheduler {
    reader: GraphReader,
    identity: IdentityResolver,
    sink: Arc<dyn UpsertSink>,
    options: SchedulerOptions,
}

impl Scheduler {
    pub fn new(reader: GraphReader, sink: Arc<dyn UpsertSink>, options: SchedulerOptions) -> Self {
        Self {
            identity: IdentityResolver::new(reader.clone()),
            reader,
            sink,
            options,
        }
    }

    pub fn identity(&self) -> &IdentityResolver {
        &self.identity
    }

    /// Runs every phase for `root`, stopping after phase 1 when no
    /// parcel identifier can be found.
    pub async fn run(&self, root: &Document, provisional: ProvisionalId) -> AggregateResult {
        let mut result = AggregateResult::new(root.cid.clone(), provisional);

        let canonical = match self.property_address_phase(root, &mut result).await {
            PropertyLookup::Found(id) => Some(id),
            PropertyLookup::TargetUnknown => self.identity.resolve_canonical_id(root).await,
            PropertyLookup::NoIdentifier => None,
        };

        match canonical {
            Some(id) => self.resume(root, &mut result, id).await,
            None => log::info!(
                "Skipping phases 2-5 for {}: no parcel_identifier resolved",
                root.cid
            ),
        }
        result
    }

    /// Continues after phase 1 once the identifier is known, re-keying
    /// what was written under the provisional id first.
    pub async fn resume(&self, root: &Document, result: &mut AggregateResult, id: CanonicalId) {
        let rewritten = result.rekey(&id);
        if !rewritten.is_empty() {
            log::info!(
                "Re-keyed {} records from {} to {}",
                rewritten.len(),
                result.provisional_id,
                id
            );
        }
        for entity in rewritten {
            self.sink.set(entity);
        }

        self.children_phase(root, result, &id).await;
        self.geometry_phases(root, result).await;
    }

    fn emit(&self, entity: &Entity) {
        self.sink.set(entity.clone());
    }

    /// Fetches an edge, if there is one to fetch.
    async fn edge(&self, phase: Phase, cid: Option<&Cid>) -> Option<RelationshipRecord> {
        let cid = cid?;
        kept(phase, self.reader.relationship(cid).await)
    }

    /// Fetches a data record, unless the type is disabled.
    async fn record(
        &self,
        phase: Phase,
        doc_type: DocumentType,
        cid: Option<&Cid>,
    ) -> Option<(Cid, TypedRecord)> {
        let cid = cid?;
        if !self.options.wants(doc_type) {
            log::debug!("phase[{}] {} disabled, not fetching {}", phase, doc_type, cid);
            return None;
        }
        let record = kept(phase, self.reader.record(doc_type, cid).await)?;
        Some((cid.clone(), record))
    }

    /// Edge, then the record on the side the relation puts `doc_type`.
    async fn linked_record(
        &self,
        phase: Phase,
        relation: &str,
        edge_cid: Cid,
        doc_type: DocumentType,
    ) -> Option<Linked> {
        let edge = self.edge(phase, Some(&edge_cid)).await?;
        let side = side_of(relation, doc_type).unwrap_or(Direction::To);
        let target = directional_target(&edge, side)?.clone();
        let (cid, record) = self.record(phase, doc_type, Some(&target)).await?;
        Some(Linked { cid, edge, record })
    }

    /// [`linked_record`](Self::linked_record) for every link of a relation.
    async fn linked_records(
        &self,
        phase: Phase,
        document: &Document,
        relation: &str,
        doc_type: DocumentType,
    ) -> Vec<Linked> {
        if !self.options.wants(doc_type) {
            return Vec::new();
        }
        let fetches = links_for(document, relation)
            .into_iter()
            .map(|edge_cid| self.linked_record(phase, relation, edge_cid, doc_type));
        futures::future::join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

/// Logs a permanently failed fetch and drops it from the phase.
fn kept<T>(phase: Phase, result: Result<T, FetchError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("phase[{}] excluded a record: {}", phase, e);
            None
        }
    }
}
