// src/scheduler/children.rs
//! Phase 2: records that hang off the parcel identifier.

use super::{kept, AggregateResult, Linked, Phase, Scheduler};
use crate::model::{Document, Entity, Label, RecordKind};
use crate::resolve::{both_targets, directional_target, first_link, links_for, Direction};
use crate::types::{CanonicalId, Cid, DocumentType};
use futures::future::join_all;

impl Scheduler {
    pub(super) async fn children_phase(
        &self,
        root: &Document,
        result: &mut AggregateResult,
        id: &CanonicalId,
    ) {
        let phase = Phase::SalesTax;
        let (sales, taxes, deeds, improvements, mailing) = futures::join!(
            self.linked_records(phase, root, "property_has_sales_history", DocumentType::SalesHistory),
            self.linked_records(phase, root, "property_has_tax", DocumentType::Tax),
            self.linked_records(phase, root, "sales_history_has_deed", DocumentType::Deed),
            self.improvements(root, id),
            self.mailing_addresses(root, id),
        );

        for linked in sales {
            let entity = keyed(RecordKind::SalesHistory, linked, id);
            self.emit(&entity);
            result.sales_history.push(entity);
        }
        for linked in taxes {
            let entity = keyed(RecordKind::Tax, linked, id);
            self.emit(&entity);
            result.taxes.push(entity);
        }
        for linked in deeds {
            let sales_history_id = linked.edge.from.clone();
            let entity = keyed(RecordKind::Deed, linked, id)
                .with_opt("sales_history_id", sales_history_id.map(|c| c.to_string()));
            self.emit(&entity);
            result.records.push(entity);
        }
        for entity in improvements.into_iter().chain(mailing) {
            self.emit(&entity);
            result.records.push(entity);
        }

        log::debug!(
            "phase[{}] {}: {} sales, {} tax, {} other records",
            phase,
            root.cid,
            result.sales_history.len(),
            result.taxes.len(),
            result.records.len()
        );
    }

    /// Improvements linked from the root, or the root itself when it is an
    /// improvement, with their inspections, files and contractors.
    async fn improvements(&self, root: &Document, id: &CanonicalId) -> Vec<Entity> {
        let phase = Phase::Improvements;
        if !self.options.improvements || !self.options.wants(DocumentType::Improvement) {
            log::info!("phase[{}] skipped for {}: improvements disabled", phase, root.cid);
            return Vec::new();
        }

        let edges = join_all(
            links_for(root, "property_has_improvement")
                .into_iter()
                .map(|rel| async move { self.edge(phase, Some(&rel)).await }),
        )
        .await;
        let mut targets: Vec<Cid> = edges
            .iter()
            .flatten()
            .filter_map(|edge| directional_target(edge, Direction::To).cloned())
            .collect();

        let root_is_improvement = root.label == Label::PropertyImprovement;
        if root_is_improvement {
            let rel = first_link(root, "parcel_has_property_improvement");
            let edge = self.edge(phase, rel.as_ref()).await;
            let target = edge
                .as_ref()
                .and_then(|e| e.to.clone())
                .unwrap_or_else(|| root.cid.clone());
            targets.push(target);
        }
        targets.sort();
        targets.dedup();

        let (linked, own) = futures::join!(
            join_all(targets.iter().map(|cid| self.improvement(cid, root, id))),
            async {
                if root_is_improvement {
                    self.expand_improvement(root, id).await
                } else {
                    Vec::new()
                }
            },
        );
        linked.into_iter().flatten().chain(own).collect()
    }

    /// One improvement record, plus its own sub-graph when the node is a
    /// labelled document other than the root.
    async fn improvement(&self, cid: &Cid, root: &Document, id: &CanonicalId) -> Vec<Entity> {
        let phase = Phase::Improvements;
        let (record, node) = futures::join!(
            self.record(phase, DocumentType::Improvement, Some(cid)),
            async {
                if *cid == root.cid {
                    None
                } else {
                    self.labelled(cid).await
                }
            },
        );

        let mut out = Vec::new();
        if let Some((cid, record)) = record {
            out.push(
                Entity::from_record(RecordKind::Improvement, cid.as_str(), record)
                    .with("property_id", id.as_str()),
            );
        }
        if let Some(node) = node {
            let (expanded, mailing) = futures::join!(
                self.expand_improvement(&node, id),
                self.mailing_addresses(&node, id),
            );
            out.extend(expanded);
            out.extend(mailing);
        }
        out
    }

    /// Inspections, files, contractor companies and their people.
    async fn expand_improvement(&self, node: &Document, id: &CanonicalId) -> Vec<Entity> {
        let phase = Phase::Improvements;
        let improvement_id = node.cid.as_str();
        let (inspections, files, companies, people) = futures::join!(
            self.linked_records(phase, node, "property_improvement_has_inspection", DocumentType::Inspection),
            self.linked_records(phase, node, "property_improvement_has_file", DocumentType::File),
            self.either_side(node, "property_improvement_has_contractor", DocumentType::Company, &["name", "request_identifier"]),
            self.either_side(node, "contractor_has_person", DocumentType::Person, &["first_name", "last_name", "request_identifier"]),
        );

        let mut out = Vec::new();
        for linked in inspections {
            out.push(keyed(RecordKind::Inspection, linked, id).with("improvement_id", improvement_id));
        }
        for linked in files {
            out.push(keyed(RecordKind::File, linked, id).with("improvement_id", improvement_id));
        }
        for (cid, record) in companies {
            out.push(
                Entity::from_record(RecordKind::Company, cid.as_str(), record)
                    .with("property_id", id.as_str()),
            );
        }
        for (cid, record) in people {
            out.push(
                Entity::from_record(RecordKind::Person, cid.as_str(), record)
                    .with("property_id", id.as_str()),
            );
        }
        out
    }

    /// Mailing addresses of people and companies described by `node`.
    async fn mailing_addresses(&self, node: &Document, id: &CanonicalId) -> Vec<Entity> {
        let phase = Phase::Improvements;
        let (of_people, of_companies) = futures::join!(
            self.linked_records(phase, node, "person_has_mailing_address", DocumentType::MailingAddress),
            self.linked_records(phase, node, "company_has_mailing_address", DocumentType::MailingAddress),
        );
        let owned = |linked: Linked, owner_field: &str| {
            let owner = linked.edge.from.clone();
            keyed(RecordKind::MailingAddress, linked, id)
                .with_opt(owner_field, owner.map(|c| c.to_string()))
        };

        let mut out: Vec<Entity> = of_people
            .into_iter()
            .map(|l| owned(l, "person_id"))
            .collect();
        out.extend(of_companies.into_iter().map(|l| owned(l, "company_id")));
        out
    }

    /// Relations whose direction is not reliable: both ends are read as
    /// `doc_type`, and an end is kept only when one of `evidence` is set.
    async fn either_side(
        &self,
        node: &Document,
        relation: &str,
        doc_type: DocumentType,
        evidence: &[&str],
    ) -> Vec<(Cid, crate::schema::TypedRecord)> {
        let phase = Phase::Improvements;
        if !self.options.wants(doc_type) {
            return Vec::new();
        }
        let edges = join_all(
            links_for(node, relation)
                .into_iter()
                .map(|rel| async move { self.edge(phase, Some(&rel)).await }),
        )
        .await;
        let ends: Vec<Cid> = edges.iter().flatten().flat_map(both_targets).collect();

        join_all(ends.iter().map(|cid| self.record(phase, doc_type, Some(cid))))
            .await
            .into_iter()
            .flatten()
            .filter(|(_, record)| evidence.iter().any(|field| record.text(field).is_some()))
            .collect()
    }

    /// The node as a labelled document, if it is one.
    async fn labelled(&self, cid: &Cid) -> Option<Document> {
        let raw = kept(Phase::Improvements, self.reader.probe(cid).await)?;
        Document::from_json(cid.clone(), &raw).ok()
    }
}

/// A linked record as an entity tied to the property.
fn keyed(kind: RecordKind, linked: Linked, id: &CanonicalId) -> Entity {
    Entity::from_record(kind, linked.cid.as_str(), linked.record).with("property_id", id.as_str())
}
