// tests/scheduler_phases.rs
//! Phase ordering, partial failure and geometry ids across a whole root.

mod common;

use cid2records::{CanonicalId, Document, LocalDocumentStore, ProvisionalId, RecordKind, UpsertSink};
use common::{all_records, cid, county_graph, reader, scheduler, GraphFixture};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

async fn root_document(fixture: GraphFixture) -> (Document, Arc<LocalDocumentStore>) {
    let store = fixture.into_store();
    let root = reader(&store).document(&cid("root")).await.unwrap();
    (root, store)
}

#[tokio::test]
async fn materializes_every_phase_for_a_resolvable_root() {
    let (root, store) = root_document(county_graph()).await;
    let (scheduler, sink) = scheduler(&store, all_records());

    let result = scheduler.run(&root, ProvisionalId::new("0xAAA")).await;

    assert_eq!(result.canonical_id.as_ref().map(CanonicalId::as_str), Some("P-100"));
    assert_eq!(result.address_id, Some(cid("ADDR1")));
    assert_eq!(result.ipfs_id, Some(cid("facts")));
    assert_eq!(result.sales_history.len(), 2);
    assert_eq!(result.taxes.len(), 1);

    let property = sink.get(RecordKind::Property, "P-100").unwrap();
    assert_eq!(property.text("property_type"), Some("SingleFamily"));
    for sale in sink.of_kind(RecordKind::SalesHistory) {
        assert_eq!(sale.text("property_id"), Some("P-100"));
    }
    // the layout side record was written provisionally, then re-keyed
    let layout = sink.get(RecordKind::Layout, "layout1").unwrap();
    assert_eq!(layout.text("property_id"), Some("P-100"));
}

#[tokio::test]
async fn shared_geometry_gets_one_record_per_parent() {
    let (root, store) = root_document(county_graph()).await;
    let (scheduler, sink) = scheduler(&store, all_records());

    scheduler.run(&root, ProvisionalId::new("0xAAA")).await;

    let ids: Vec<String> = sink
        .of_kind(RecordKind::Geometry)
        .into_iter()
        .map(|g| g.id)
        .collect();
    assert_eq!(ids, vec!["geo-address-ADDR1", "geo-parcel-PARCEL1"]);

    let on_parcel = sink.get(RecordKind::Geometry, "geo-parcel-PARCEL1").unwrap();
    assert_eq!(on_parcel.text("parcel_id"), Some("PARCEL1"));
    assert_eq!(on_parcel.text("data_submission_id"), Some("P-100"));
    let on_address = sink.get(RecordKind::Geometry, "geo-address-ADDR1").unwrap();
    assert_eq!(on_address.text("address_id"), Some("ADDR1"));

    let parcel = sink.get(RecordKind::Parcel, "PARCEL1").unwrap();
    assert_eq!(parcel.text("parcel_identifier"), Some("P-100"));
}

#[tokio::test]
async fn missing_tax_leaves_sales_history_intact() {
    let (root, store) = root_document(county_graph().without("rel-t1")).await;
    let (scheduler, sink) = scheduler(&store, all_records());

    let result = scheduler.run(&root, ProvisionalId::new("0xAAA")).await;

    assert_eq!(result.sales_history.len(), 2);
    assert!(result.taxes.is_empty());
    assert!(sink.of_kind(RecordKind::Tax).is_empty());
    assert_eq!(sink.of_kind(RecordKind::SalesHistory).len(), 2);
}

#[tokio::test]
async fn unresolvable_root_stops_after_phase_one() {
    let fixture = county_graph().doc("prop", json!({"property_type": "SingleFamily"}));
    let (root, store) = root_document(fixture).await;
    let (scheduler, sink) = scheduler(&store, all_records());

    let result = scheduler.run(&root, ProvisionalId::new("0xAAA")).await;

    assert_eq!(result.canonical_id, None);
    assert!(result.sales_history.is_empty());
    assert!(result.records.is_empty());
    assert!(sink.get(RecordKind::Address, "ADDR1").is_some());
    assert!(sink.get(RecordKind::Ipfs, "facts").is_some());
    assert!(sink.of_kind(RecordKind::Geometry).is_empty());
    assert_eq!(
        sink.get(RecordKind::Layout, "layout1").unwrap().text("property_id"),
        Some("0xAAA")
    );
}

#[tokio::test]
async fn late_identifier_rekeys_provisional_records() {
    // no property edge at all: phase 1 cannot settle the identifier
    let fixture = GraphFixture::new()
        .node(
            "root",
            "County",
            &[
                ("property_has_layout", &["rel-l1"]),
                ("property_has_sales_history", &["rel-s1"]),
            ],
        )
        .edge("rel-l1", "prop", "layout1")
        .edge("rel-s1", "prop", "sale1")
        .doc("layout1", json!({"space_type": "Kitchen"}))
        .doc("sale1", json!({"purchase_price_amount": 1}));
    let (root, store) = root_document(fixture).await;
    let (scheduler, sink) = scheduler(&store, all_records());

    let mut result = scheduler.run(&root, ProvisionalId::new("0xAAA")).await;
    assert_eq!(result.canonical_id, None);
    assert_eq!(
        sink.get(RecordKind::Layout, "layout1").unwrap().text("property_id"),
        Some("0xAAA")
    );

    scheduler
        .resume(&root, &mut result, CanonicalId::new("P-100").unwrap())
        .await;

    assert_eq!(
        sink.get(RecordKind::Layout, "layout1").unwrap().text("property_id"),
        Some("P-100")
    );
    assert_eq!(
        sink.get(RecordKind::SalesHistory, "sale1").unwrap().text("property_id"),
        Some("P-100")
    );
    assert_eq!(sink.of_kind(RecordKind::Layout).len(), 1);
}

#[tokio::test]
async fn same_root_twice_writes_identical_records() {
    let mut snapshots = Vec::new();
    for _ in 0..2 {
        let (root, store) = root_document(county_graph()).await;
        let (scheduler, sink) = scheduler(&store, all_records());
        scheduler.run(&root, ProvisionalId::new("0xAAA")).await;
        snapshots.push(sink.snapshot());
    }
    assert_eq!(snapshots[0], snapshots[1]);
}
