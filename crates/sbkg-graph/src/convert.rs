//! Artifact type -> persisted row type conversions (§4.9 schema).

use chrono::Utc;
use sbkg_common::artifact::{CanonicalEntity, Paper, RelationshipCandidate, Topic};
use sbkg_db::schema::{EntityRow, EvidenceRecord, OntologyRef, PaperRow, RelationshipRow, TopicRow};
use uuid::Uuid;

pub fn paper_to_row(paper: &Paper, topic_id: Option<i32>) -> PaperRow {
    PaperRow {
        literature_id: paper.literature_id.clone(),
        secondary_ids: paper.secondary_ids.clone(),
        title: paper.title.clone(),
        abstract_text: paper.abstract_text.clone(),
        full_text: paper.full_text.clone(),
        authors: paper.authors.clone(),
        publication_year: paper.publication_year,
        journal: paper.journal.clone(),
        source_tags: paper.source_tags.iter().cloned().collect(),
        mesh_tags: paper.mesh_tags.iter().cloned().collect(),
        clean_text: paper.clean_text.clone(),
        topic_id,
        ingested_at: Utc::now(),
    }
}

pub fn entity_to_row(entity: &CanonicalEntity) -> EntityRow {
    let now = Utc::now();
    EntityRow {
        id: Uuid::new_v4(),
        entity_type: entity.entity_type.to_string(),
        canonical_name: entity.canonical_name.clone(),
        canonical_name_normalized: entity.canonical_name_normalized.clone(),
        aliases: entity.aliases.iter().cloned().collect(),
        external_ids: entity.external_ids.clone(),
        ontology_refs: entity
            .ontology_refs
            .iter()
            .map(|m| OntologyRef {
                ontology: m.ontology.clone(),
                term_id: m.term_id.clone(),
                preferred_label: m.preferred_label.clone(),
                score: m.score,
            })
            .collect(),
        mention_count: entity.mention_count,
        paper_count: entity.paper_count,
        resolved: entity.resolved,
        created_at: now,
        updated_at: now,
    }
}

pub fn topic_to_row(topic: &Topic) -> TopicRow {
    TopicRow {
        topic_id: topic.topic_id,
        keywords: topic.keywords.clone(),
        coherence: topic.coherence,
        size: topic.size,
        created_at: Utc::now(),
    }
}

/// Converts a candidate to a fresh row. Callers merge this against any
/// existing row with the same natural key before upserting (§4.9 step 3).
pub fn relationship_to_row(candidate: &RelationshipCandidate) -> RelationshipRow {
    let now = Utc::now();
    RelationshipRow {
        id: Uuid::new_v4(),
        subject_type: candidate.subject_type.to_string(),
        subject_key: candidate.subject_key.clone(),
        predicate: candidate.predicate.to_string(),
        object_type: candidate.object_type.to_string(),
        object_key: candidate.object_key.clone(),
        headline_confidence: candidate.headline_confidence(),
        evidence: candidate
            .evidence
            .iter()
            .map(|e| EvidenceRecord::new(e.paper_id.clone(), e.sentence_index as i64, e.confidence, e.extractor_tag.clone()))
            .collect(),
        created_at: now,
        updated_at: now,
    }
}

/// Unions two evidence lists, deduped by (paper_id, sentence_index,
/// extractor_tag), and recomputes headline_confidence as their max (§4.9
/// step 3, §4.9 Idempotence).
pub fn merge_relationship(existing: &RelationshipRow, incoming: &RelationshipRow) -> RelationshipRow {
    let mut evidence = existing.evidence.clone();
    for e in &incoming.evidence {
        if !evidence.iter().any(|x| x.paper_id == e.paper_id && x.sentence_index == e.sentence_index && x.extractor_tag == e.extractor_tag) {
            evidence.push(e.clone());
        }
    }
    evidence.sort();
    let headline_confidence = evidence.iter().map(|e| e.confidence()).fold(0.0_f64, f64::max);
    RelationshipRow {
        id: existing.id,
        subject_type: incoming.subject_type.clone(),
        subject_key: incoming.subject_key.clone(),
        predicate: incoming.predicate.clone(),
        object_type: incoming.object_type.clone(),
        object_key: incoming.object_key.clone(),
        headline_confidence,
        evidence,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbkg_common::artifact::Evidence;
    use sbkg_common::domain::{EntityType, Predicate};

    fn candidate(confidence: f64) -> RelationshipCandidate {
        RelationshipCandidate {
            subject_type: EntityType::Gene,
            subject_key: "GENE::foxo3".into(),
            predicate: Predicate::Upregulates,
            object_type: EntityType::Phenotype,
            object_key: "PHENOTYPE::bone loss".into(),
            evidence: vec![Evidence { paper_id: "p1".into(), sentence_index: 0, confidence, extractor_tag: "trigger_pattern".into() }],
        }
    }

    #[test]
    fn merge_unions_distinct_evidence_and_takes_max_confidence() {
        let existing = relationship_to_row(&candidate(0.6));
        let mut incoming = relationship_to_row(&candidate(0.9));
        incoming.evidence[0].paper_id = "p2".into();
        let merged = merge_relationship(&existing, &incoming);
        assert_eq!(merged.evidence.len(), 2);
        assert!((merged.headline_confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn merge_dedups_identical_evidence() {
        let existing = relationship_to_row(&candidate(0.6));
        let incoming = relationship_to_row(&candidate(0.6));
        let merged = merge_relationship(&existing, &incoming);
        assert_eq!(merged.evidence.len(), 1);
    }
}
