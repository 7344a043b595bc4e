// src/processor.rs
//! Entry point for on-chain events.
//!
//! A data submission names two 32-byte hashes. The data hash is the root
//! of the document graph; the property hash names the property document
//! and keys the provisional summary until a parcel identifier is known.
//! It also names the address and seed documents the summary's address is
//! built from.

use crate::api::GraphReader;
use crate::config::IndexerConfig;
use crate::error::AppError;
use crate::model::{Entity, Label, RecordKind};
use crate::resolve::first_link;
use crate::scheduler::{AggregateResult, Scheduler, SchedulerOptions};
use crate::schema::TypedRecord;
use crate::sink::UpsertSink;
use crate::types::{CanonicalId, Cid, DocumentType, ProvisionalId};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;

/// Label written on summaries recorded without a graph walk.
const MINIMAL_LABEL: &str = "Minimal";

/// Address fields taken from the seed document when the address document
/// lacks them.
const SEED_ADDRESS_FIELDS: [&str; 6] = [
    "request_identifier",
    "city_name",
    "country_code",
    "postal_code",
    "state_code",
    "unnormalized_address",
];

/// A `DataSubmitted` event as observed on chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionEvent {
    pub chain_id: u64,
    pub block_number: u64,
    pub log_index: u64,
    /// Block timestamp, seconds since epoch.
    pub timestamp: i64,
    pub submitter: String,
    pub property_hash: String,
    pub data_group_hash: String,
    pub data_hash: String,
}

impl SubmissionEvent {
    /// Id of the raw event row.
    pub fn row_id(&self) -> String {
        format!("{}_{}_{}", self.chain_id, self.block_number, self.log_index)
    }

    /// Id of the summary keyed on the property hash.
    pub fn provisional_summary_id(&self) -> String {
        provisional_summary_id(self.chain_id, &self.property_hash)
    }
}

/// A `DataGroupHeartBeat` event: a periodic liveness signal for data
/// already submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatEvent {
    pub chain_id: u64,
    pub block_number: u64,
    pub log_index: u64,
    /// Block timestamp, seconds since epoch.
    pub timestamp: i64,
    pub submitter: String,
    pub property_hash: String,
    pub data_group_hash: String,
    pub data_hash: String,
}

impl HeartbeatEvent {
    /// Id of the raw event row.
    pub fn row_id(&self) -> String {
        format!("{}_{}_{}", self.chain_id, self.block_number, self.log_index)
    }
}

/// What one accepted submission produced.
#[derive(Debug, Clone)]
pub struct ProcessedSubmission {
    pub summary_id: String,
    pub property_cid: Cid,
    pub data_cid: Cid,
    pub canonical_id: Option<CanonicalId>,
    /// `None` in minimal mode.
    pub aggregate: Option<AggregateResult>,
}

pub struct SubmissionProcessor {
    reader: GraphReader,
    scheduler: Scheduler,
    sink: Arc<dyn UpsertSink>,
    config: IndexerConfig,
}

impl SubmissionProcessor {
    pub fn new(reader: GraphReader, sink: Arc<dyn UpsertSink>, config: IndexerConfig) -> Self {
        let options = SchedulerOptions::new(&config);
        Self::with_options(reader, sink, config, options)
    }

    pub fn with_options(
        reader: GraphReader,
        sink: Arc<dyn UpsertSink>,
        config: IndexerConfig,
        options: SchedulerOptions,
    ) -> Self {
        Self {
            scheduler: Scheduler::new(reader.clone(), Arc::clone(&sink), options),
            reader,
            sink,
            config,
        }
    }

    fn check_submitter(&self, submitter: &str) -> Result<(), AppError> {
        if self.config.allowed_submitters.permits(submitter) {
            return Ok(());
        }
        log::warn!("Ignoring event from {}: submitter not allowed", submitter);
        Err(AppError::SubmitterNotAllowed(submitter.to_string()))
    }

    /// Records the event, walks its document graph and writes the
    /// provisional and canonical summaries.
    ///
    /// A root that cannot be read is an error after the raw row has been
    /// written; everything below the root degrades to partial output.
    pub async fn process_submission(
        &self,
        event: &SubmissionEvent,
    ) -> Result<ProcessedSubmission, AppError> {
        self.check_submitter(&event.submitter)?;
        self.sink.set(submission_row(event));

        let property_cid = Cid::from_bytes32(&event.property_hash)?;
        let data_cid = Cid::from_bytes32(&event.data_hash)?;
        let summary_id = event.provisional_summary_id();
        log::info!(
            "Processing submission {}: data_cid={} property_cid={}",
            event.row_id(),
            data_cid,
            property_cid
        );

        let header = SummaryHeader {
            event,
            property_cid: &property_cid,
            data_cid: &data_cid,
        };

        if self.config.minimal_mode {
            self.sink
                .set(header.summary(&summary_id, MINIMAL_LABEL, IdSource::PropertyHash));
            return Ok(ProcessedSubmission {
                summary_id,
                property_cid,
                data_cid,
                canonical_id: None,
                aggregate: None,
            });
        }

        let identity = self.scheduler.identity();
        let root = self.reader.document(&data_cid).await?;
        let root = identity.reroot(root).await;
        let label = root.label.as_str().to_string();

        let seed_address = self.property_hash_address(&property_cid).await;
        let provisional = header
            .summary(&summary_id, &label, IdSource::PropertyHash)
            .with_opt("address_id", seed_address.as_ref().map(Cid::to_string));
        self.sink.set(self.merged_with_previous(provisional));

        let mut result = self
            .scheduler
            .run(&root, ProvisionalId::new(event.property_hash.as_str()))
            .await;

        if result.canonical_id.is_none() {
            if let Some(id) = identity.resolve_cid(&property_cid).await {
                log::info!(
                    "Parcel identifier {} found through property document {}",
                    id,
                    property_cid
                );
                self.scheduler.resume(&root, &mut result, id).await;
            }
        }

        // same id as before: the provisional summary is updated, never duplicated
        let provisional = header
            .summary(&summary_id, &label, IdSource::PropertyHash)
            .with_links(&result, seed_address.as_ref());
        self.sink.set(self.merged_with_previous(provisional));

        if let Some(id) = &result.canonical_id {
            let canonical = header
                .summary(id.as_str(), &label, IdSource::ParcelIdentifier)
                .with_links(&result, seed_address.as_ref());
            self.sink.set(self.merged_with_previous(canonical));
        }

        Ok(ProcessedSubmission {
            summary_id,
            property_cid,
            data_cid,
            canonical_id: result.canonical_id.clone(),
            aggregate: Some(result),
        })
    }

    /// Records the heartbeat and refreshes `datetime` on the summary for
    /// its property: the canonical summary when the data root yields a
    /// parcel identifier, else the provisional one. Returns the id of the
    /// summary touched, if there was one.
    ///
    /// Only `County` roots are followed. A root that cannot be read leaves
    /// the summaries alone.
    pub async fn process_heartbeat(
        &self,
        event: &HeartbeatEvent,
    ) -> Result<Option<String>, AppError> {
        self.check_submitter(&event.submitter)?;
        self.sink.set(heartbeat_row(event));

        let data_cid = Cid::from_bytes32(&event.data_hash)?;
        let root = match self.reader.document(&data_cid).await {
            Ok(root) => root,
            Err(e) => {
                log::warn!(
                    "Heartbeat {} not applied: cannot read root {}: {}",
                    event.row_id(),
                    data_cid,
                    e
                );
                return Ok(None);
            }
        };
        if root.label != Label::County {
            log::info!(
                "Skipping heartbeat {}: root {} is labelled {}",
                event.row_id(),
                data_cid,
                root.label.as_str()
            );
            return Ok(None);
        }

        let canonical = self.scheduler.identity().resolve_canonical_id(&root).await;
        let candidates = canonical
            .map(|id| id.as_str().to_string())
            .into_iter()
            .chain([provisional_summary_id(event.chain_id, &event.property_hash)]);
        for id in candidates {
            if let Some(mut summary) = self.sink.get(RecordKind::DataSubmission, &id) {
                summary.set("datetime", datetime(event.timestamp));
                self.sink.set(summary);
                log::debug!("Heartbeat refreshed summary {}", id);
                return Ok(Some(id));
            }
        }
        log::info!(
            "Heartbeat for {} has no summary to refresh",
            event.property_hash
        );
        Ok(None)
    }

    /// Writes the address named by the property-hash root, filling gaps in
    /// the address document from the seed document, and returns its id.
    /// Nothing is written when neither document contributes a field.
    async fn property_hash_address(&self, property_cid: &Cid) -> Option<Cid> {
        let root = match self.reader.document(property_cid).await {
            Ok(root) => root,
            Err(e) => {
                log::warn!("Cannot read property hash root {}: {}", property_cid, e);
                return None;
            }
        };
        let seed_cid =
            first_link(&root, "property_seed").or_else(|| first_link(&root, "property"));
        let address_cid =
            first_link(&root, "property_address").or_else(|| first_link(&root, "address"));

        let (seed, address) = futures::join!(
            self.linked_record(DocumentType::Seed, seed_cid.as_ref()),
            self.linked_record(DocumentType::Address, address_cid.as_ref()),
        );
        let id = address_cid.or(seed_cid)?;

        let mut entity = match address {
            Some(record) => Entity::from_record(RecordKind::Address, id.as_str(), record),
            None => Entity::new(RecordKind::Address, id.as_str()),
        };
        if let Some(seed) = &seed {
            for field in SEED_ADDRESS_FIELDS {
                if is_absent(entity.get(field)) {
                    if let Some(value) = seed.get(field) {
                        entity.set(field, value.clone());
                    }
                }
            }
        }
        if entity.fields.is_empty() {
            log::debug!("Property hash root {} names no address data", property_cid);
            return None;
        }

        log::debug!("Address {} built from property hash root {}", id, property_cid);
        self.sink.set(entity);
        Some(id)
    }

    async fn linked_record(
        &self,
        doc_type: DocumentType,
        cid: Option<&Cid>,
    ) -> Option<TypedRecord> {
        let cid = cid?;
        match self.reader.record(doc_type, cid).await {
            Ok(record) => Some(record),
            Err(e) => {
                log::warn!("Cannot read {} {} from property hash root: {}", doc_type, cid, e);
                None
            }
        }
    }

    /// Keeps link fields of the stored summary the new one does not set.
    fn merged_with_previous(&self, mut summary: Entity) -> Entity {
        let Some(previous) = self.sink.get(summary.kind, &summary.id) else {
            return summary;
        };
        for field in ["address_id", "property_id"] {
            if is_absent(summary.get(field)) {
                if let Some(value) = previous.get(field).filter(|v| !is_absent(Some(*v))) {
                    summary.set(field, value.clone());
                }
            }
        }
        summary
    }
}

fn provisional_summary_id(chain_id: u64, property_hash: &str) -> String {
    format!("{}_{}", chain_id, property_hash)
}

#[derive(Debug, Clone, Copy)]
enum IdSource {
    PropertyHash,
    ParcelIdentifier,
}

impl IdSource {
    fn as_str(&self) -> &'static str {
        match self {
            Self::PropertyHash => "propertyHash",
            Self::ParcelIdentifier => "parcel_identifier",
        }
    }
}

/// Fields every summary written for one event shares.
struct SummaryHeader<'a> {
    event: &'a SubmissionEvent,
    property_cid: &'a Cid,
    data_cid: &'a Cid,
}

impl SummaryHeader<'_> {
    fn summary(&self, id: &str, label: &str, source: IdSource) -> Entity {
        Entity::new(RecordKind::DataSubmission, id)
            .with("propertyHash", self.event.property_hash.as_str())
            .with("property_cid", self.property_cid.as_str())
            .with("dataGroupHash", self.event.data_group_hash.as_str())
            .with("dataHash", self.event.data_hash.as_str())
            .with("cid", self.data_cid.as_str())
            .with("submitter", self.event.submitter.as_str())
            .with("chain_id", self.event.chain_id)
            .with("label", label)
            .with("id_source", source.as_str())
            .with("datetime", datetime(self.event.timestamp))
    }
}

trait SummaryLinks {
    fn with_links(self, result: &AggregateResult, seed_address: Option<&Cid>) -> Self;
}

impl SummaryLinks for Entity {
    /// The walk's address wins over the one built from the property hash.
    fn with_links(self, result: &AggregateResult, seed_address: Option<&Cid>) -> Self {
        let address = result.address_id.as_ref().or(seed_address);
        self.with_opt("address_id", address.map(Cid::to_string))
            .with_opt("property_id", result.canonical_id.as_ref().map(CanonicalId::to_string))
            .with_opt("ipfs_id", result.ipfs_id.as_ref().map(Cid::to_string))
    }
}

fn submission_row(event: &SubmissionEvent) -> Entity {
    Entity::new(RecordKind::Submission, event.row_id())
        .with("chain_id", event.chain_id)
        .with("block_number", event.block_number)
        .with("log_index", event.log_index)
        .with("submitter", event.submitter.as_str())
        .with("propertyHash", event.property_hash.as_str())
        .with("dataGroupHash", event.data_group_hash.as_str())
        .with("dataHash", event.data_hash.as_str())
        .with("datetime", datetime(event.timestamp))
}

fn heartbeat_row(event: &HeartbeatEvent) -> Entity {
    Entity::new(RecordKind::Heartbeat, event.row_id())
        .with("chain_id", event.chain_id)
        .with("block_number", event.block_number)
        .with("log_index", event.log_index)
        .with("submitter", event.submitter.as_str())
        .with("propertyHash", event.property_hash.as_str())
        .with("dataGroupHash", event.data_group_hash.as_str())
        .with("dataHash", event.data_hash.as_str())
        .with("datetime", datetime(event.timestamp))
}

/// RFC 3339 in UTC; timestamps chrono cannot represent are kept as numbers.
fn datetime(timestamp: i64) -> Value {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Secs, true)),
        None => Value::from(timestamp),
    }
}

fn is_absent(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::LocalDocumentStore;
    use crate::config::AllowList;
    use crate::sink::InMemorySink;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const SUBMITTER: &str = "0xAbC0000000000000000000000000000000000001";
    const DATA_HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";
    const PROPERTY_HASH: &str =
        "0x2222222222222222222222222222222222222222222222222222222222222222";

    fn event() -> SubmissionEvent {
        SubmissionEvent {
            chain_id: 137,
            block_number: 500,
            log_index: 3,
            timestamp: 1_700_000_000,
            submitter: SUBMITTER.to_string(),
            property_hash: PROPERTY_HASH.to_string(),
            data_group_hash: "0xgroup".to_string(),
            data_hash: DATA_HASH.to_string(),
        }
    }

    fn config() -> IndexerConfig {
        IndexerConfig {
            allowed_submitters: AllowList::new([SUBMITTER]),
            ..IndexerConfig::default()
        }
    }

    fn processor(store: LocalDocumentStore, config: IndexerConfig) -> (SubmissionProcessor, Arc<InMemorySink>) {
        let sink = Arc::new(InMemorySink::new());
        let reader = GraphReader::new(Arc::new(store));
        (SubmissionProcessor::new(reader, sink.clone(), config), sink)
    }

    fn data_cid() -> Cid {
        Cid::from_bytes32(DATA_HASH).unwrap()
    }

    /// Root with a property link that resolves to `P-7`.
    fn resolvable_store() -> LocalDocumentStore {
        let rel = Cid::new("bafyrelpa").unwrap();
        let prop = Cid::new("bafyprop").unwrap();
        let addr = Cid::new("bafyaddr").unwrap();
        LocalDocumentStore::new()
            .with(
                data_cid(),
                json!({"label": "County", "relationships": {"property_has_address": {"/": rel.as_str()}}}),
            )
            .with(rel, json!({"from": {"/": "bafyprop"}, "to": {"/": "bafyaddr"}}))
            .with(prop, json!({"parcel_identifier": "P-7"}))
            .with(addr, json!({"city_name": "Tampa"}))
    }

    #[tokio::test]
    async fn rejects_submitters_off_the_allow_list() {
        let (processor, sink) = processor(LocalDocumentStore::new(), config());
        let mut event = event();
        event.submitter = "0xdead".to_string();

        let err = processor.process_submission(&event).await.unwrap_err();
        assert!(matches!(err, AppError::SubmitterNotAllowed(s) if s == "0xdead"));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn minimal_mode_records_only_the_summary() {
        let config = IndexerConfig {
            minimal_mode: true,
            ..config()
        };
        let (processor, sink) = processor(LocalDocumentStore::new(), config);

        let processed = processor.process_submission(&event()).await.unwrap();
        assert!(processed.aggregate.is_none());

        let summary = sink
            .get(RecordKind::DataSubmission, &format!("137_{}", PROPERTY_HASH))
            .unwrap();
        assert_eq!(summary.text("label"), Some("Minimal"));
        assert_eq!(summary.text("cid"), Some(data_cid().as_str()));
        assert_eq!(summary.text("datetime"), Some("2023-11-14T22:13:20Z"));
        assert!(sink.get(RecordKind::Submission, "137_500_3").is_some());
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn writes_provisional_and_canonical_summaries() {
        let (processor, sink) = processor(resolvable_store(), config());

        let processed = processor.process_submission(&event()).await.unwrap();
        assert_eq!(processed.canonical_id.as_ref().map(|c| c.as_str()), Some("P-7"));

        let provisional = sink
            .get(RecordKind::DataSubmission, &processed.summary_id)
            .unwrap();
        assert_eq!(provisional.text("id_source"), Some("propertyHash"));
        assert_eq!(provisional.text("property_id"), Some("P-7"));
        assert_eq!(provisional.text("address_id"), Some("bafyaddr"));
        assert_eq!(provisional.text("label"), Some("County"));

        let canonical = sink.get(RecordKind::DataSubmission, "P-7").unwrap();
        assert_eq!(canonical.text("id_source"), Some("parcel_identifier"));
        assert!(sink.get(RecordKind::Property, "P-7").is_some());
    }

    #[tokio::test]
    async fn keeps_previous_address_when_new_walk_finds_none() {
        let store = LocalDocumentStore::new().with(
            data_cid(),
            json!({"label": "County", "relationships": {}}),
        );
        let (processor, sink) = processor(store, config());
        let id = event().provisional_summary_id();
        sink.set(Entity::new(RecordKind::DataSubmission, id.as_str()).with("address_id", "bafyold"));

        processor.process_submission(&event()).await.unwrap();

        let summary = sink.get(RecordKind::DataSubmission, &id).unwrap();
        assert_eq!(summary.text("address_id"), Some("bafyold"));
        assert_eq!(summary.get("property_id"), None);
    }

    #[tokio::test]
    async fn unreadable_root_is_an_error_after_the_raw_row() {
        let (processor, sink) = processor(LocalDocumentStore::new(), config());

        let err = processor.process_submission(&event()).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(e) if e.is_not_found()));
        assert!(sink.get(RecordKind::Submission, "137_500_3").is_some());
    }

    fn heartbeat(timestamp: i64) -> HeartbeatEvent {
        HeartbeatEvent {
            chain_id: 137,
            block_number: 900,
            log_index: 1,
            timestamp,
            submitter: SUBMITTER.to_lowercase(),
            property_hash: PROPERTY_HASH.to_string(),
            data_group_hash: "0xgroup".to_string(),
            data_hash: DATA_HASH.to_string(),
        }
    }

    #[tokio::test]
    async fn heartbeat_refreshes_the_canonical_summary() {
        // the property hash document is not in the store at all
        let (processor, sink) = processor(resolvable_store(), config());
        processor.process_submission(&event()).await.unwrap();

        let touched = processor.process_heartbeat(&heartbeat(1_700_000_600)).await.unwrap();

        assert_eq!(touched.as_deref(), Some("P-7"));
        let canonical = sink.get(RecordKind::DataSubmission, "P-7").unwrap();
        assert_eq!(canonical.text("datetime"), Some("2023-11-14T22:23:20Z"));
        let provisional = sink
            .get(RecordKind::DataSubmission, &event().provisional_summary_id())
            .unwrap();
        assert_eq!(provisional.text("datetime"), Some("2023-11-14T22:13:20Z"));

        let row = sink.get(RecordKind::Heartbeat, "137_900_1").unwrap();
        assert_eq!(row.text("dataHash"), Some(DATA_HASH));
    }

    #[tokio::test]
    async fn heartbeat_falls_back_to_the_provisional_summary() {
        let store = LocalDocumentStore::new().with(
            data_cid(),
            json!({"label": "County", "relationships": {}}),
        );
        let (processor, sink) = processor(store, config());
        let id = event().provisional_summary_id();
        sink.set(Entity::new(RecordKind::DataSubmission, id.as_str()));

        let touched = processor.process_heartbeat(&heartbeat(0)).await.unwrap();

        assert_eq!(touched, Some(id.clone()));
        let summary = sink.get(RecordKind::DataSubmission, &id).unwrap();
        assert_eq!(summary.text("datetime"), Some("1970-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn heartbeat_ignores_roots_that_are_not_county() {
        let store = LocalDocumentStore::new().with(
            data_cid(),
            json!({"label": "Property Improvement", "relationships": {}}),
        );
        let (processor, sink) = processor(store, config());
        let id = event().provisional_summary_id();
        sink.set(Entity::new(RecordKind::DataSubmission, id.as_str()).with("datetime", "old"));

        let touched = processor.process_heartbeat(&heartbeat(0)).await.unwrap();

        assert_eq!(touched, None);
        let summary = sink.get(RecordKind::DataSubmission, &id).unwrap();
        assert_eq!(summary.text("datetime"), Some("old"));
        assert!(sink.get(RecordKind::Heartbeat, "137_900_1").is_some());
    }

    /// Property hash root naming an address document and a seed document.
    fn with_property_hash_root(store: LocalDocumentStore, address: Value) -> LocalDocumentStore {
        let prop_root = Cid::from_bytes32(PROPERTY_HASH).unwrap();
        store
            .with(
                prop_root,
                json!({
                    "label": "Seed",
                    "relationships": {
                        "property_seed": {"/": "bafyseed"},
                        "property_address": {"/": "bafyseedaddr"}
                    }
                }),
            )
            .with(
                Cid::new("bafyseed").unwrap(),
                json!({
                    "parcel_identifier": "P-7",
                    "request_identifier": "REQ-1",
                    "address": "1 Main St, Tampa, FL 33602",
                    "city_name": "TAMPA",
                    "postal_code": "33602",
                    "state_code": "FL",
                    "country_code": "US"
                }),
            )
            .with(Cid::new("bafyseedaddr").unwrap(), address)
    }

    #[tokio::test]
    async fn property_hash_address_fills_gaps_from_the_seed() {
        let root_only = LocalDocumentStore::new().with(
            data_cid(),
            json!({"label": "County", "relationships": {}}),
        );
        let store = with_property_hash_root(
            root_only,
            json!({"street_name": "Main", "city_name": "Tampa", "postal_code": ""}),
        );
        let (processor, sink) = processor(store, config());

        processor.process_submission(&event()).await.unwrap();

        let address = sink.get(RecordKind::Address, "bafyseedaddr").unwrap();
        assert_eq!(address.text("street_name"), Some("Main"));
        assert_eq!(address.text("city_name"), Some("Tampa"));
        assert_eq!(address.text("postal_code"), Some("33602"));
        assert_eq!(address.text("state_code"), Some("FL"));
        assert_eq!(address.text("country_code"), Some("US"));
        assert_eq!(address.text("request_identifier"), Some("REQ-1"));
        assert_eq!(address.text("unnormalized_address"), Some("1 Main St, Tampa, FL 33602"));

        let summary = sink
            .get(RecordKind::DataSubmission, &event().provisional_summary_id())
            .unwrap();
        assert_eq!(summary.text("address_id"), Some("bafyseedaddr"));
    }

    #[tokio::test]
    async fn full_address_beats_the_seed_address_string() {
        let root_only = LocalDocumentStore::new().with(
            data_cid(),
            json!({"label": "County", "relationships": {}}),
        );
        let store = with_property_hash_root(
            root_only,
            json!({"full_address": "1 MAIN ST TAMPA FL"}),
        );
        let (processor, sink) = processor(store, config());

        processor.process_submission(&event()).await.unwrap();

        let address = sink.get(RecordKind::Address, "bafyseedaddr").unwrap();
        assert_eq!(address.text("unnormalized_address"), Some("1 MAIN ST TAMPA FL"));
    }

    #[tokio::test]
    async fn walked_address_wins_over_the_property_hash_address() {
        let store = with_property_hash_root(resolvable_store(), json!({"city_name": "Tampa"}));
        let (processor, sink) = processor(store, config());

        let processed = processor.process_submission(&event()).await.unwrap();

        assert!(sink.get(RecordKind::Address, "bafyseedaddr").is_some());
        for id in [processed.summary_id.as_str(), "P-7"] {
            let summary = sink.get(RecordKind::DataSubmission, id).unwrap();
            assert_eq!(summary.text("address_id"), Some("bafyaddr"), "{}", id);
        }
    }
}
