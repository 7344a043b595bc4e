// tests/common/mod.rs
//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use cid2records::{
    Cid, DocumentSource, GraphReader, InMemorySink, LocalDocumentStore, Scheduler, SchedulerOptions, UpsertSink,
};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub fn cid(s: &str) -> Cid {
    Cid::new(s).unwrap()
}

/// Builds a document graph one node at a time.
#[derive(Default, Clone)]
pub struct GraphFixture {
    documents: BTreeMap<String, Value>,
}

impl GraphFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A labelled node; each relation lists the CIDs of its edge documents.
    pub fn node(self, key: &str, label: &str, relations: &[(&str, &[&str])]) -> Self {
        let mut rels = Map::new();
        for (name, targets) in relations {
            let links: Vec<Value> = targets.iter().map(|t| json!({"/": t})).collect();
            let value = match links.as_slice() {
                [single] => single.clone(),
                _ => Value::Array(links),
            };
            rels.insert(name.to_string(), value);
        }
        self.doc(key, json!({"label": label, "relationships": rels}))
    }

    /// A relationship document.
    pub fn edge(self, key: &str, from: &str, to: &str) -> Self {
        self.doc(key, json!({"from": {"/": from}, "to": {"/": to}}))
    }

    /// Adds or replaces a document.
    pub fn doc(mut self, key: &str, body: Value) -> Self {
        self.documents.insert(key.to_string(), body);
        self
    }

    /// Drops a document, so fetching it fails as not found.
    pub fn without(mut self, key: &str) -> Self {
        self.documents.remove(key);
        self
    }

    pub fn into_store(self) -> Arc<LocalDocumentStore> {
        let store = LocalDocumentStore::new();
        for (key, body) in self.documents {
            store.insert(cid(&key), body);
        }
        Arc::new(store)
    }
}

/// Every optional record enabled.
pub fn all_records() -> SchedulerOptions {
    SchedulerOptions {
        side_records: true,
        improvements: true,
        disabled: BTreeSet::new(),
    }
}

pub fn reader(store: &Arc<LocalDocumentStore>) -> GraphReader {
    GraphReader::new(Arc::clone(store) as Arc<dyn DocumentSource>)
}

pub fn scheduler(
    store: &Arc<LocalDocumentStore>,
    options: SchedulerOptions,
) -> (Scheduler, Arc<InMemorySink>) {
    let sink = Arc::new(InMemorySink::new());
    let scheduler = Scheduler::new(
        reader(store),
        Arc::clone(&sink) as Arc<dyn UpsertSink>,
        options,
    );
    (scheduler, sink)
}

/// A county root whose graph touches every phase.
pub fn county_graph() -> GraphFixture {
    GraphFixture::new()
        .node(
            "root",
            "County",
            &[
                ("property_has_address", &["rel-pa"]),
                ("address_has_fact_sheet", &["rel-af"]),
                ("property_has_sales_history", &["rel-s1", "rel-s2"]),
                ("property_has_tax", &["rel-t1"]),
                ("property_has_layout", &["rel-l1"]),
                ("parcel_has_geometry", &["rel-pg"]),
                ("address_has_geometry", &["rel-ag"]),
            ],
        )
        .edge("rel-pa", "prop", "ADDR1")
        .edge("rel-af", "ADDR1", "facts")
        .edge("rel-s1", "prop", "sale1")
        .edge("rel-s2", "prop", "sale2")
        .edge("rel-t1", "prop", "tax1")
        .edge("rel-l1", "prop", "layout1")
        .edge("rel-pg", "PARCEL1", "geo")
        .edge("rel-ag", "ADDR1", "geo")
        .doc("prop", json!({"parcel_identifier": "P-100", "property_type": "SingleFamily"}))
        .doc("ADDR1", json!({"city_name": "TAMPA", "postal_code": "33602"}))
        .doc("facts", json!({"ipfs_url": "ipfs://facts", "full_generation_command": "gen"}))
        .doc("sale1", json!({"ownership_transfer_date": "2020-01-02", "purchase_price_amount": 250000}))
        .doc("sale2", json!({"ownership_transfer_date": "2012-06-30", "purchase_price_amount": 90000}))
        .doc("tax1", json!({"tax_year": 2023, "property_assessed_value_amount": 180000}))
        .doc("layout1", json!({"space_type": "Bedroom"}))
        .doc("PARCEL1", json!({"parcel_identifier": "P-100"}))
        .doc("geo", json!({"latitude": 27.95, "longitude": -82.46}))
}
