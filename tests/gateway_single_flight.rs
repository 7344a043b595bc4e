// tests/gateway_single_flight.rs
//! The cached gateway client against a stub gateway.

mod common;

use cid2records::{
    DocumentCache, DocumentSource, DocumentType, Endpoint, GatewayClient, GatewayConfig,
    GraphReader, ProvisionalId, RecordKind, RetryPolicy, Scheduler, UpsertSink,
};
use common::{all_records, cid};
use futures::future::join_all;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn cached_client(server: &MockServer) -> Arc<DocumentCache<GatewayClient>> {
    let endpoint = Endpoint::new(&format!("{}/ipfs", server.uri()), None).unwrap();
    let client = GatewayClient::new(GatewayConfig::single(endpoint))
        .unwrap()
        .with_retry_policy(RetryPolicy::with_delays(
            Duration::from_millis(5),
            Duration::from_millis(5),
        ));
    Arc::new(DocumentCache::new(client))
}

async fn serve(server: &MockServer, key: &str, body: Value, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/ipfs/{}", key)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn concurrent_requests_share_one_http_fetch() {
    let server = MockServer::start().await;
    serve(&server, "bafyshared", json!({"parcel_identifier": "P-1"}), 1).await;
    let cache = cached_client(&server);

    let fetches = (0..10).map(|_| {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.fetch(DocumentType::Property, &cid("bafyshared")).await })
    });
    let results = join_all(fetches).await;

    for result in results {
        let body = result.unwrap().unwrap();
        assert_eq!(body["parcel_identifier"], "P-1");
    }
    assert!(cache.contains(DocumentType::Property, &cid("bafyshared")));
}

#[tokio::test]
async fn scheduler_over_http_tolerates_a_missing_tax_edge() {
    let server = MockServer::start().await;
    serve(
        &server,
        "bafyroot",
        json!({"label": "County", "relationships": {
            "property_has_address": {"/": "bafyrelpa"},
            "property_has_sales_history": [{"/": "bafyrels1"}, {"/": "bafyrels2"}],
            "property_has_tax": {"/": "bafyrelt1"}
        }}),
        1,
    )
    .await;
    serve(&server, "bafyrelpa", json!({"from": {"/": "bafyprop"}, "to": {"/": "bafyaddr"}}), 1).await;
    serve(&server, "bafyprop", json!({"parcel_identifier": "P-100"}), 1).await;
    serve(&server, "bafyaddr", json!({"city_name": "MIAMI"}), 1).await;
    // both sales edges name the same record: fetched once
    serve(&server, "bafyrels1", json!({"from": {"/": "bafyprop"}, "to": {"/": "bafysale"}}), 1).await;
    serve(&server, "bafyrels2", json!({"from": {"/": "bafyprop"}, "to": {"/": "bafysale"}}), 1).await;
    serve(&server, "bafysale", json!({"purchase_price_amount": 500000}), 1).await;
    Mock::given(method("GET"))
        .and(path("/ipfs/bafyrelt1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let source: Arc<dyn DocumentSource> = cached_client(&server);
    let reader = GraphReader::new(source);
    let sink = Arc::new(cid2records::InMemorySink::new());
    let scheduler = Scheduler::new(
        reader.clone(),
        Arc::clone(&sink) as Arc<dyn UpsertSink>,
        all_records(),
    );

    let root = reader.document(&cid("bafyroot")).await.unwrap();
    let result = scheduler.run(&root, ProvisionalId::new("0xAAA")).await;

    assert_eq!(result.canonical_id.map(|c| c.to_string()), Some("P-100".to_string()));
    assert_eq!(result.sales_history.len(), 2);
    assert!(result.taxes.is_empty());
    // two edges, one record id: the upsert collapses them
    assert_eq!(sink.of_kind(RecordKind::SalesHistory).len(), 1);
    assert!(sink.get(RecordKind::Address, "bafyaddr").is_some());
}
