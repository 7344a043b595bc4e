// src/types/document_type.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// The shapes a CID can be fetched as.
///
/// The same CID may be fetched under more than one type (a node probed
/// first, then read as a property); the cache keys on both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Labelled graph node with a `relationships` map.
    Metadata,
    /// `{from, to}` edge document.
    Relationship,
    /// Any JSON object; used when the node's shape is not yet confirmed.
    Probe,
    Property,
    Address,
    FactSheet,
    SalesHistory,
    Tax,
    Structure,
    Utility,
    Layout,
    Lot,
    Parcel,
    Geometry,
    Seed,
    Improvement,
    Inspection,
    File,
    Company,
    Person,
    Deed,
    MailingAddress,
}

impl DocumentType {
    pub const ALL: [DocumentType; 22] = [
        Self::Metadata,
        Self::Relationship,
        Self::Probe,
        Self::Property,
        Self::Address,
        Self::FactSheet,
        Self::SalesHistory,
        Self::Tax,
        Self::Structure,
        Self::Utility,
        Self::Layout,
        Self::Lot,
        Self::Parcel,
        Self::Geometry,
        Self::Seed,
        Self::Improvement,
        Self::Inspection,
        Self::File,
        Self::Company,
        Self::Person,
        Self::Deed,
        Self::MailingAddress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::Relationship => "relationship",
            Self::Probe => "probe",
            Self::Property => "property",
            Self::Address => "address",
            Self::FactSheet => "fact_sheet",
            Self::SalesHistory => "sales_history",
            Self::Tax => "tax",
            Self::Structure => "structure",
            Self::Utility => "utility",
            Self::Layout => "layout",
            Self::Lot => "lot",
            Self::Parcel => "parcel",
            Self::Geometry => "geometry",
            Self::Seed => "seed",
            Self::Improvement => "improvement",
            Self::Inspection => "inspection",
            Self::File => "file",
            Self::Company => "company",
            Self::Person => "person",
            Self::Deed => "deed",
            Self::MailingAddress => "mailing_address",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
