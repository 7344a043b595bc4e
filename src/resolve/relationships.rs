// src/resolve/relationships.rs
//! Following named links out of a document and picking a side of an edge.

use crate::model::{Document, RelationshipRecord};
use crate::types::{Cid, DocumentType};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// One side of a `{from, to}` edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    From,
    To,
}

impl Direction {
    pub fn opposite(&self) -> Self {
        match self {
            Self::From => Self::To,
            Self::To => Self::From,
        }
    }
}

/// Every CID a relation points at, flattened in origin order.
///
/// A missing relation is an empty list.
pub fn links_for(document: &Document, relation: &str) -> Vec<Cid> {
    document
        .relation(relation)
        .map(|link| link.cids().into_iter().cloned().collect())
        .unwrap_or_default()
}

/// The first CID of a relation.
pub fn first_link(document: &Document, relation: &str) -> Option<Cid> {
    document
        .relation(relation)
        .and_then(|link| link.cids().first().map(|cid| (*cid).clone()))
}

/// The preferred side of an edge, or the other side when it is missing.
pub fn directional_target(
    edge: &RelationshipRecord,
    preferred: Direction,
) -> Option<&Cid> {
    strict_target(edge, preferred).or_else(|| strict_target(edge, preferred.opposite()))
}

/// Exactly the requested side of an edge.
pub fn strict_target(edge: &RelationshipRecord, side: Direction) -> Option<&Cid> {
    match side {
        Direction::From => edge.from.as_ref(),
        Direction::To => edge.to.as_ref(),
    }
}

/// Both sides, `to` first, for walks that do not know the direction.
pub fn both_targets(edge: &RelationshipRecord) -> Vec<Cid> {
    edge.to.iter().chain(edge.from.iter()).cloned().collect()
}

/// What sits at each end of a named relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationShape {
    pub from: DocumentType,
    pub to: DocumentType,
}

static RELATION_SHAPES: Lazy<HashMap<&'static str, RelationShape>> = Lazy::new(|| {
    use DocumentType as D;
    [
        ("property_has_address", D::Property, D::Address),
        ("address_has_fact_sheet", D::Address, D::FactSheet),
        ("property_has_sales_history", D::Property, D::SalesHistory),
        ("property_has_tax", D::Property, D::Tax),
        ("property_has_structure", D::Property, D::Structure),
        ("property_has_utility", D::Property, D::Utility),
        ("property_has_layout", D::Property, D::Layout),
        ("property_has_lot", D::Property, D::Lot),
        ("property_has_improvement", D::Property, D::Improvement),
        ("parcel_has_property_improvement", D::Parcel, D::Improvement),
        ("property_improvement_has_inspection", D::Improvement, D::Inspection),
        ("property_improvement_has_file", D::Improvement, D::File),
        ("property_improvement_has_contractor", D::Improvement, D::Company),
        ("contractor_has_person", D::Company, D::Person),
        ("parcel_has_geometry", D::Parcel, D::Geometry),
        ("address_has_geometry", D::Address, D::Geometry),
        ("layout_has_geometry", D::Layout, D::Geometry),
        ("sales_history_has_deed", D::SalesHistory, D::Deed),
        ("person_has_mailing_address", D::Person, D::MailingAddress),
        ("company_has_mailing_address", D::Company, D::MailingAddress),
    ]
    .into_iter()
    .map(|(name, from, to)| (name, RelationShape { from, to }))
    .collect()
});

/// The known shape of a relation, if it is one this crate walks.
pub fn relation_shape(relation: &str) -> Option<RelationShape> {
    RELATION_SHAPES.get(relation).copied()
}

/// Which side of a relation holds documents of `doc_type`.
pub fn side_of(relation: &str, doc_type: DocumentType) -> Option<Direction> {
    let shape = relation_shape(relation)?;
    if shape.to == doc_type {
        Some(Direction::To)
    } else if shape.from == doc_type {
        Some(Direction::From)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn cid(s: &str) -> Cid {
        Cid::new(s).unwrap()
    }

    fn edge(from: Option<&str>, to: Option<&str>) -> RelationshipRecord {
        RelationshipRecord {
            from: from.map(cid),
            to: to.map(cid),
        }
    }

    #[test]
    fn flattens_all_link_shapes() {
        let doc = Document::from_json(
            cid("bafyroot"),
            &json!({
                "label": "County",
                "relationships": {
                    "property_has_address": {"/": "bafyrel"},
                    "property_has_tax": [{"/": "bafyt1"}, {"/": "bafyt2"}],
                    "parcel_has_geometry": [[{"/": "bafyg1"}, {"/": "bafyg2"}], [{"/": "bafyg3"}]]
                }
            }),
        )
        .unwrap();

        assert_eq!(links_for(&doc, "property_has_address"), vec![cid("bafyrel")]);
        assert_eq!(
            links_for(&doc, "property_has_tax"),
            vec![cid("bafyt1"), cid("bafyt2")]
        );
        assert_eq!(
            links_for(&doc, "parcel_has_geometry"),
            vec![cid("bafyg1"), cid("bafyg2"), cid("bafyg3")]
        );
        assert!(links_for(&doc, "property_has_lot").is_empty());
        assert_eq!(first_link(&doc, "property_has_tax"), Some(cid("bafyt1")));
    }

    #[test]
    fn falls_back_to_other_side() {
        let only_to = edge(None, Some("bafyaddr"));
        assert_eq!(
            directional_target(&only_to, Direction::From),
            Some(&cid("bafyaddr"))
        );
        assert_eq!(strict_target(&only_to, Direction::From), None);

        let both = edge(Some("bafyprop"), Some("bafyaddr"));
        assert_eq!(
            directional_target(&both, Direction::From),
            Some(&cid("bafyprop"))
        );
        assert_eq!(both_targets(&both), vec![cid("bafyaddr"), cid("bafyprop")]);
    }

    #[test]
    fn table_knows_direction_per_relation() {
        assert_eq!(
            side_of("property_has_address", DocumentType::Property),
            Some(Direction::From)
        );
        assert_eq!(
            side_of("parcel_has_property_improvement", DocumentType::Improvement),
            Some(Direction::To)
        );
        assert_eq!(
            side_of("parcel_has_property_improvement", DocumentType::Parcel),
            Some(Direction::From)
        );
        assert_eq!(side_of("property_has_address", DocumentType::Tax), None);
        assert_eq!(relation_shape("unheard_of"), None);
    }
}
