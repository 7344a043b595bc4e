// src/scheduler/property_address.rs
use super::{AggregateResult, Phase, PropertyLookup, Scheduler};
use crate::model::{Document, Entity, RecordKind};
use crate::resolve::{directional_target, first_link, parcel_identifier, strict_target, Direction};
use crate::types::{DocumentType, ProvisionalId};

/// Phase-1 side records: relation, type, table.
const SIDE_RECORDS: [(&str, DocumentType, RecordKind); 4] = [
    ("property_has_structure", DocumentType::Structure, RecordKind::Structure),
    ("property_has_utility", DocumentType::Utility, RecordKind::Utility),
    ("property_has_layout", DocumentType::Layout, RecordKind::Layout),
    ("property_has_lot", DocumentType::Lot, RecordKind::Lot),
];

impl Scheduler {
    /// Phase 1: property, address, fact sheet and side records.
    pub(super) async fn property_address_phase(
        &self,
        root: &Document,
        result: &mut AggregateResult,
    ) -> PropertyLookup {
        let phase = Phase::PropertyAddress;
        let property_rel = first_link(root, "property_has_address");
        let fact_sheet_rel = first_link(root, "address_has_fact_sheet");

        let (property_edge, fact_sheet_edge) = futures::join!(
            self.edge(phase, property_rel.as_ref()),
            self.edge(phase, fact_sheet_rel.as_ref()),
        );

        let property_cid = property_edge
            .as_ref()
            .and_then(|e| directional_target(e, Direction::From))
            .cloned();
        // the fact sheet edge names the address on its `from` side; the
        // property edge's `to` is the fallback
        let address_cid = fact_sheet_edge
            .as_ref()
            .and_then(|e| strict_target(e, Direction::From))
            .or_else(|| {
                property_edge
                    .as_ref()
                    .and_then(|e| strict_target(e, Direction::To))
            })
            .cloned();
        let fact_sheet_cid = fact_sheet_edge
            .as_ref()
            .and_then(|e| strict_target(e, Direction::To))
            .cloned();

        let provisional = result.provisional_id.clone();
        let (property, address, fact_sheet, side_records) = futures::join!(
            self.record(phase, DocumentType::Property, property_cid.as_ref()),
            self.record(phase, DocumentType::Address, address_cid.as_ref()),
            self.record(phase, DocumentType::FactSheet, fact_sheet_cid.as_ref()),
            self.side_records(root, &provisional),
        );

        if let Some((cid, record)) = address {
            self.emit(&Entity::from_record(RecordKind::Address, cid.as_str(), record));
            result.address_id = Some(cid);
        }
        if let Some((cid, record)) = fact_sheet {
            self.emit(&Entity::from_record(RecordKind::Ipfs, cid.as_str(), record));
            result.ipfs_id = Some(cid);
        }
        for entity in &side_records {
            self.emit(entity);
        }
        result.side_records = side_records;

        if property_cid.is_none() {
            log::info!(
                "phase[{}] no property target on {}, falling back to identity chain",
                phase,
                root.cid
            );
            return PropertyLookup::TargetUnknown;
        }
        let Some((cid, record)) = property else {
            return PropertyLookup::NoIdentifier;
        };
        match parcel_identifier(&record) {
            Some(id) => {
                self.emit(&Entity::from_record(RecordKind::Property, id.as_str(), record));
                result.property_id = Some(id.clone());
                PropertyLookup::Found(id)
            }
            None => {
                log::info!(
                    "phase[{}] skipping property {}: no parcel_identifier present",
                    phase,
                    cid
                );
                PropertyLookup::NoIdentifier
            }
        }
    }

    /// Structure, utility, layout and lot, keyed on the provisional id
    /// until the identifier is known.
    async fn side_records(&self, root: &Document, provisional: &ProvisionalId) -> Vec<Entity> {
        if !self.options.side_records {
            return Vec::new();
        }
        let fetches = SIDE_RECORDS.iter().map(|(relation, doc_type, kind)| async move {
            self.linked_records(Phase::PropertyAddress, root, relation, *doc_type)
                .await
                .into_iter()
                .map(|linked| {
                    Entity::from_record(*kind, linked.cid.as_str(), linked.record)
                        .with("property_id", provisional.as_str())
                })
                .collect::<Vec<_>>()
        });
        futures::future::join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}
