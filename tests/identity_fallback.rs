// tests/identity_fallback.rs
//! Precedence of the parcel identifier strategies.

mod common;

use cid2records::{IdentityResolver, Label, Strategy};
use common::{cid, reader, GraphFixture};
use pretty_assertions::assert_eq;
use serde_json::json;

async fn resolve(fixture: GraphFixture, root: &str) -> Option<String> {
    IdentityResolver::new(reader(&fixture.into_store()))
        .resolve_cid(&cid(root))
        .await
        .map(|id| id.as_str().to_string())
}

#[tokio::test]
async fn relationship_root_resolves_from_its_labelled_node() {
    // the relationship document itself points at a decoy property; the
    // labelled node behind it must win
    let fixture = GraphFixture::new()
        .doc(
            "root",
            json!({
                "label": "Relationship",
                "relationships": {"property": {"/": "decoy"}},
                "from": {"/": "edge-data"},
                "to": {"/": "county"}
            }),
        )
        .doc("decoy", json!({"parcel_identifier": "WRONG"}))
        .node("county", "County", &[("property", &["prop"])])
        .doc("prop", json!({"parcel_identifier": "P-7"}));

    assert_eq!(resolve(fixture, "root").await.as_deref(), Some("P-7"));
}

#[tokio::test]
async fn two_hop_seed_chain_yields_parcel() {
    let fixture = GraphFixture::new()
        .node("root", "County", &[("property_seed", &["rel-1"])])
        .edge("rel-1", "seed", "rel-2")
        .doc("seed", json!({"label": "Seed", "source_http_request": "GET /"}))
        .edge("rel-2", "seed", "prop")
        .doc("prop", json!({"parcel_identifier": "P-100"}));

    assert_eq!(resolve(fixture, "root").await.as_deref(), Some("P-100"));
}

#[tokio::test]
async fn direct_property_beats_address_linkage() {
    let fixture = GraphFixture::new()
        .node(
            "root",
            "County",
            &[("property", &["direct"]), ("property_has_address", &["rel-pa"])],
        )
        .doc("direct", json!({"parcel_identifier": "DIRECT"}))
        .edge("rel-pa", "linked", "addr")
        .doc("linked", json!({"parcel_identifier": "LINKED"}))
        .doc("addr", json!({"city_name": "OCALA"}));

    assert_eq!(resolve(fixture, "root").await.as_deref(), Some("DIRECT"));
}

#[tokio::test]
async fn improvement_root_reads_parcel_behind_it() {
    let fixture = GraphFixture::new()
        .node(
            "root",
            "Property Improvement",
            &[("parcel_has_property_improvement", &["rel-pi"])],
        )
        .edge("rel-pi", "parcel", "root")
        .doc("parcel", json!({"parcel_id": "LEGACY-9"}));

    assert_eq!(resolve(fixture, "root").await.as_deref(), Some("LEGACY-9"));
}

#[tokio::test]
async fn exhausted_chain_is_absent_not_an_error() {
    let fixture = GraphFixture::new().node("root", "County", &[]);
    assert_eq!(resolve(fixture, "root").await, None);
}

#[tokio::test]
async fn restricted_strategies_skip_the_rest() {
    let store = GraphFixture::new()
        .node("root", "County", &[("property", &["direct"])])
        .doc("direct", json!({"parcel_identifier": "DIRECT"}))
        .into_store();
    let root = reader(&store).document(&cid("root")).await.unwrap();
    assert_eq!(root.label, Label::County);

    // a seed link must lead to an edge; a plain property document is not one
    let seed_only =
        IdentityResolver::with_strategies(reader(&store), vec![Strategy::SeedTraversal]);
    assert_eq!(seed_only.resolve_canonical_id(&root).await, None);

    let direct_only =
        IdentityResolver::with_strategies(reader(&store), vec![Strategy::DirectProperty]);
    assert_eq!(
        direct_only
            .resolve_canonical_id(&root)
            .await
            .map(|id| id.to_string()),
        Some("DIRECT".to_string())
    );
}
