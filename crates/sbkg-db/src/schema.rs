//! Record types stored in LanceDB, one flat table per node kind plus a
//! single generic edge table (§4.9). Complex fields (ordered lists, maps)
//! are stored as JSON-serialized `Utf8` columns, matching the way the rest
//! of the ambient stack already keeps Arrow schemas primitive-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TABLE_PAPERS: &str = "papers";
pub const TABLE_ENTITIES: &str = "entities";
pub const TABLE_RELATIONSHIPS: &str = "relationships";
pub const TABLE_TOPICS: &str = "topics";
pub const TABLE_EDGES: &str = "edges";

/// Paper node. Natural key: `literature_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperRow {
    pub literature_id: String,
    pub secondary_ids: Vec<String>,
    pub title: String,
    pub abstract_text: Option<String>,
    pub full_text: Option<String>,
    pub authors: Vec<String>,
    pub publication_year: Option<i32>,
    pub journal: Option<String>,
    pub source_tags: Vec<String>,
    pub mesh_tags: Vec<String>,
    pub clean_text: Option<String>,
    pub topic_id: Option<i32>,
    pub ingested_at: DateTime<Utc>,
}

/// Entity (canonical) node. Natural key: `(entity_type, canonical_name_normalized)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRow {
    pub id: Uuid,
    pub entity_type: String,
    pub canonical_name: String,
    pub canonical_name_normalized: String,
    pub aliases: Vec<String>,
    /// registry -> external id, populated by the Resolver.
    pub external_ids: std::collections::BTreeMap<String, String>,
    /// ontology tag -> term id, populated by the Aligner (primary first).
    pub ontology_refs: Vec<OntologyRef>,
    pub mention_count: i64,
    pub paper_count: i64,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyRef {
    pub ontology: String,
    pub term_id: String,
    pub preferred_label: String,
    pub score: f64,
}

impl EntityRow {
    pub fn natural_key(entity_type: &str, canonical_name_normalized: &str) -> String {
        format!("{entity_type}::{canonical_name_normalized}")
    }

    pub fn key(&self) -> String {
        Self::natural_key(&self.entity_type, &self.canonical_name_normalized)
    }
}

/// A single evidence pointer (§3 Relationship, GLOSSARY "Evidence record").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct EvidenceRecord {
    pub paper_id: String,
    pub sentence_index: i64,
    pub confidence_millis: i64,
    pub extractor_tag: String,
}

impl EvidenceRecord {
    pub fn new(paper_id: impl Into<String>, sentence_index: i64, confidence: f64, extractor_tag: impl Into<String>) -> Self {
        Self {
            paper_id: paper_id.into(),
            sentence_index,
            confidence_millis: (confidence.clamp(0.0, 1.0) * 1000.0).round() as i64,
            extractor_tag: extractor_tag.into(),
        }
    }

    pub fn confidence(&self) -> f64 {
        self.confidence_millis as f64 / 1000.0
    }
}

/// Relationship (edge-like, but kept in its own table because it carries an
/// evidence list). Natural key: `(subject_key, predicate, object_key)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipRow {
    pub id: Uuid,
    pub subject_type: String,
    pub subject_key: String,
    pub predicate: String,
    pub object_type: String,
    pub object_key: String,
    pub headline_confidence: f64,
    pub evidence: Vec<EvidenceRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RelationshipRow {
    pub fn natural_key(subject_key: &str, predicate: &str, object_key: &str) -> String {
        format!("{subject_key}|{predicate}|{object_key}")
    }

    pub fn key(&self) -> String {
        Self::natural_key(&self.subject_key, &self.predicate, &self.object_key)
    }
}

/// Topic node. Natural key: `topic_id` (may be -1 for "unclustered").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRow {
    pub topic_id: i32,
    pub keywords: Vec<String>,
    pub coherence: f64,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

/// Generic edge row. Natural key: `(source_key, edge_type, target_key)`.
/// Used for `MENTIONS` (Paper -> Entity), `HAS_TOPIC` (Paper -> Topic), and
/// the optional `STUDIED_IN` (Paper -> Organism entity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRow {
    pub id: Uuid,
    pub source_key: String,
    pub edge_type: String,
    pub target_key: String,
    pub mention_count: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EdgeRow {
    pub fn natural_key(source_key: &str, edge_type: &str, target_key: &str) -> String {
        format!("{source_key}->{edge_type}->{target_key}")
    }

    pub fn key(&self) -> String {
        Self::natural_key(&self.source_key, &self.edge_type, &self.target_key)
    }
}

pub const EDGE_MENTIONS: &str = "MENTIONS";
pub const EDGE_HAS_TOPIC: &str = "HAS_TOPIC";
pub const EDGE_STUDIED_IN: &str = "STUDIED_IN";
