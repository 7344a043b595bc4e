// src/scheduler/geometry.rs
//! Phases 3 to 5: geometry attached to parcels, addresses and layouts.

use super::{AggregateResult, Phase, Scheduler};
use crate::model::{Document, Entity, RecordKind};
use crate::resolve::{links_for, strict_target, Direction};
use crate::types::{Cid, DocumentType, GeometryParent};
use futures::future::join_all;

impl GeometryParent {
    fn relation(&self) -> &'static str {
        match self {
            Self::Parcel => "parcel_has_geometry",
            Self::Address => "address_has_geometry",
            Self::Layout => "layout_has_geometry",
        }
    }

    fn phase(&self) -> Phase {
        match self {
            Self::Parcel => Phase::ParcelGeometry,
            Self::Address => Phase::AddressGeometry,
            Self::Layout => Phase::LayoutGeometry,
        }
    }

    /// The parent record written alongside the geometry; the address
    /// record already exists from phase 1.
    fn parent_record(&self) -> Option<(DocumentType, RecordKind)> {
        match self {
            Self::Parcel => Some((DocumentType::Parcel, RecordKind::Parcel)),
            Self::Address => None,
            Self::Layout => Some((DocumentType::Layout, RecordKind::Layout)),
        }
    }
}

impl Scheduler {
    /// The three geometry phases have no dependency on each other and run
    /// together.
    pub(super) async fn geometry_phases(&self, root: &Document, result: &mut AggregateResult) {
        let submission_id = result.data_submission_id().to_string();
        let (parcels, addresses, layouts) = futures::join!(
            self.geometry_phase(root, GeometryParent::Parcel, &submission_id),
            self.geometry_phase(root, GeometryParent::Address, &submission_id),
            self.geometry_phase(root, GeometryParent::Layout, &submission_id),
        );
        for entity in parcels.into_iter().chain(addresses).chain(layouts) {
            self.emit(&entity);
            result.records.push(entity);
        }
    }

    async fn geometry_phase(
        &self,
        root: &Document,
        parent: GeometryParent,
        submission_id: &str,
    ) -> Vec<Entity> {
        let edges = links_for(root, parent.relation());
        if edges.is_empty() {
            return Vec::new();
        }
        log::debug!(
            "phase[{}] {} edges for {}",
            parent.phase(),
            edges.len(),
            root.cid
        );
        join_all(
            edges
                .iter()
                .map(|edge| self.attached_geometry(parent, edge, submission_id)),
        )
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    /// One `{parent}_has_geometry` edge: the parent record where there is
    /// one, and the geometry under an id that names its parent.
    async fn attached_geometry(
        &self,
        parent: GeometryParent,
        edge_cid: &Cid,
        submission_id: &str,
    ) -> Vec<Entity> {
        let phase = parent.phase();
        let Some(edge) = self.edge(phase, Some(edge_cid)).await else {
            return Vec::new();
        };
        let parent_cid = strict_target(&edge, Direction::From);
        let geometry_cid = strict_target(&edge, Direction::To);

        let (parent_record, geometry) = futures::join!(
            async {
                let (doc_type, kind) = parent.parent_record()?;
                let (cid, record) = self.record(phase, doc_type, parent_cid).await?;
                Some(Entity::from_record(kind, cid.as_str(), record))
            },
            self.record(phase, DocumentType::Geometry, geometry_cid),
        );

        let mut out = Vec::new();
        if let Some(entity) = parent_record {
            out.push(entity.with("data_submission_id", submission_id));
        }
        if let Some((cid, record)) = geometry {
            let id = match parent_cid {
                Some(parent_id) => parent.composite_id(cid.as_str(), parent_id.as_str()),
                None => cid.to_string(),
            };
            out.push(
                Entity::from_record(RecordKind::Geometry, id, record)
                    .with_opt(parent.link_field(), parent_cid.map(|c| c.to_string()))
                    .with("data_submission_id", submission_id),
            );
        }
        out
    }
}
