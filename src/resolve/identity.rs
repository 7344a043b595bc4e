// src/resolve/identity.rs
//! Recovering the parcel identifier for a root document.
//!
//! The identifier is looked for along several paths, tried in order until
//! one yields a value. Finding nothing is a normal outcome.

use super::relationships::{both_targets, directional_target, first_link, strict_target, Direction};
use crate::api::GraphReader;
use crate::constants::SEED_TRAVERSAL_MAX_HOPS;
use crate::error::FetchError;
use crate::model::{Document, Label, RelationshipRecord};
use crate::schema::TypedRecord;
use crate::types::{CanonicalId, Cid, DocumentType};
use std::fmt;

/// One way of finding the identifier from a (non-relationship) root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `property` link straight to a Property document
    DirectProperty,
    /// `property_has_address` edge, property side
    AddressLinkage,
    /// `property_seed` (or `property`) edge, up to two hops
    SeedTraversal,
    /// `parcel_has_property_improvement` edge back to the Parcel, for
    /// improvement roots
    ImprovementParcel,
}

impl Strategy {
    pub const DEFAULT_ORDER: [Strategy; 4] = [
        Self::DirectProperty,
        Self::AddressLinkage,
        Self::SeedTraversal,
        Self::ImprovementParcel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectProperty => "property",
            Self::AddressLinkage => "property_has_address",
            Self::SeedTraversal => "property_seed",
            Self::ImprovementParcel => "parcel_has_property_improvement",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs the strategies in order against a root.
#[derive(Clone)]
pub struct IdentityResolver {
    reader: GraphReader,
    strategies: Vec<Strategy>,
}

impl IdentityResolver {
    pub fn new(reader: GraphReader) -> Self {
        Self::with_strategies(reader, Strategy::DEFAULT_ORDER.to_vec())
    }

    pub fn with_strategies(reader: GraphReader, strategies: Vec<Strategy>) -> Self {
        Self { reader, strategies }
    }

    /// Replaces a `Relationship` root with the first labelled node at
    /// either end of it (`to` first). Other roots come back unchanged, as
    /// does a relationship whose ends are all relationships or unreadable.
    pub async fn reroot(&self, root: Document) -> Document {
        if !root.label.is_relationship() {
            return root;
        }
        let edge = match self.reader.probe(&root.cid).await {
            Ok(raw) => RelationshipRecord::from_json(&raw),
            Err(e) => {
                log::warn!("Cannot read relationship root {}: {}", root.cid, e);
                return root;
            }
        };

        for candidate in both_targets(&edge) {
            let Some(raw) = warn_on_failure(self.reader.probe(&candidate).await) else {
                continue;
            };
            match Document::from_json(candidate.clone(), &raw) {
                Ok(doc) if !doc.label.is_relationship() => {
                    log::info!(
                        "Re-rooted relationship {} onto labelled node {} ({})",
                        root.cid,
                        doc.cid,
                        doc.label.as_str()
                    );
                    return doc;
                }
                Ok(_) => log::debug!("Candidate {} is itself a relationship", candidate),
                Err(e) => log::debug!("Candidate {} is not a labelled node: {}", candidate, e),
            }
        }

        log::info!("No labelled node found behind relationship root {}", root.cid);
        root
    }

    /// The parcel identifier for `root`, re-rooting first when needed.
    pub async fn resolve_canonical_id(&self, root: &Document) -> Option<CanonicalId> {
        let root = self.reroot(root.clone()).await;
        for strategy in &self.strategies {
            if let Some(id) = self.run(*strategy, &root).await {
                log::info!(
                    "Derived parcel_identifier via {}: root={} parcel_identifier={}",
                    strategy,
                    root.cid,
                    id
                );
                return Some(id);
            }
            log::debug!("Strategy {} found nothing for {}", strategy, root.cid);
        }
        log::info!("No parcel_identifier resolvable for {}", root.cid);
        None
    }

    /// Fetches the root by CID, then resolves it. An unreadable root
    /// resolves to nothing.
    pub async fn resolve_cid(&self, cid: &Cid) -> Option<CanonicalId> {
        let root = warn_on_failure(self.reader.document(cid).await)?;
        self.resolve_canonical_id(&root).await
    }

    async fn run(&self, strategy: Strategy, root: &Document) -> Option<CanonicalId> {
        match strategy {
            Strategy::DirectProperty => {
                let property = first_link(root, "property")?;
                self.property_identifier(&property).await
            }
            Strategy::AddressLinkage => {
                let rel = first_link(root, "property_has_address")?;
                let edge = warn_on_failure(self.reader.relationship(&rel).await)?;
                let property = directional_target(&edge, Direction::From)?;
                self.property_identifier(property).await
            }
            Strategy::SeedTraversal => {
                let seed = first_link(root, "property_seed")
                    .or_else(|| first_link(root, "property"))?;
                self.seed_traversal(seed).await
            }
            Strategy::ImprovementParcel => {
                if root.label != Label::PropertyImprovement {
                    return None;
                }
                let rel = first_link(root, "parcel_has_property_improvement")?;
                let edge = warn_on_failure(self.reader.relationship(&rel).await)?;
                let parcel = strict_target(&edge, Direction::From)?;
                let record =
                    warn_on_failure(self.reader.record(DocumentType::Parcel, parcel).await)?;
                parcel_identifier(&record)
            }
        }
    }

    /// Breadth-first walk from a seed edge. Each hop checks the nodes at
    /// both ends for an identifier, then reads them as edges for the next
    /// hop.
    async fn seed_traversal(&self, seed_edge: Cid) -> Option<CanonicalId> {
        let mut frontier = vec![seed_edge];
        for hop in 1..=SEED_TRAVERSAL_MAX_HOPS {
            let mut next = Vec::new();
            for edge_cid in &frontier {
                let Some(edge) = self.probe_edge(edge_cid).await else {
                    continue;
                };
                for candidate in both_targets(&edge) {
                    if let Some(id) = self.probed_identifier(&candidate).await {
                        log::debug!("Seed traversal hit at hop {}: {}", hop, candidate);
                        return Some(id);
                    }
                    next.push(candidate);
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        None
    }

    async fn property_identifier(&self, cid: &Cid) -> Option<CanonicalId> {
        let record = warn_on_failure(self.reader.record(DocumentType::Property, cid).await)?;
        parcel_identifier(&record)
    }

    async fn probed_identifier(&self, cid: &Cid) -> Option<CanonicalId> {
        let raw = warn_on_failure(self.reader.probe(cid).await)?;
        let record = self
            .reader
            .schemas()
            .transform(DocumentType::Property, &raw)
            .ok()?;
        parcel_identifier(&record)
    }

    async fn probe_edge(&self, cid: &Cid) -> Option<RelationshipRecord> {
        let raw = warn_on_failure(self.reader.probe(cid).await)?;
        RelationshipRecord::from_probe(&raw)
    }
}

/// The identifier field of a Property or Parcel record.
pub fn parcel_identifier(record: &TypedRecord) -> Option<CanonicalId> {
    record
        .text("parcel_identifier")
        .and_then(|id| CanonicalId::new(id).ok())
}

fn warn_on_failure<T>(result: Result<T, FetchError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Identity lookup skipped a document: {}", e);
            None
        }
    }
}
