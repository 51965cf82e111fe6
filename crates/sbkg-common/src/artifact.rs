//! In-flight pipeline artifact types — the shapes serialized to the stable
//! artifact files between stages (§6.5), as distinct from the persisted
//! LanceDB row types in sbkg-db.

use crate::domain::{EntityType, Predicate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A single token produced by preprocessing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub lemma: String,
    pub pos: String,
}

/// A sentence owned by a Paper. Ephemeral: rebuilt whenever a paper is
/// reprocessed, never itself persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sentence {
    pub index: usize,
    pub text: String,
    pub tokens: Vec<Token>,
}

/// Acquirer/Preprocessor output unit. Never mutated after preprocessing;
/// `clean_text`/`sentences` are attached as sibling fields rather than
/// overwriting the raw `title`/`abstract_text`/`full_text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    pub literature_id: String,
    pub secondary_ids: Vec<String>,
    pub title: String,
    pub abstract_text: Option<String>,
    pub full_text: Option<String>,
    pub authors: Vec<String>,
    pub publication_year: Option<i32>,
    pub journal: Option<String>,
    pub source_tags: BTreeSet<String>,
    pub mesh_tags: BTreeSet<String>,
    pub clean_text: Option<String>,
    pub sentences: Option<Vec<Sentence>>,
}

impl Paper {
    pub fn new(literature_id: impl Into<String>, title: impl Into<String>, source_tag: impl Into<String>) -> Self {
        let mut source_tags = BTreeSet::new();
        source_tags.insert(source_tag.into());
        Self {
            literature_id: literature_id.into(),
            secondary_ids: Vec::new(),
            title: title.into(),
            abstract_text: None,
            full_text: None,
            authors: Vec::new(),
            publication_year: None,
            journal: None,
            source_tags,
            mesh_tags: BTreeSet::new(),
            clean_text: None,
            sentences: None,
        }
    }
}

/// A typed span inside a Sentence (§3 Mention, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    pub paper_id: String,
    pub sentence_index: usize,
    pub start: usize,
    pub end: usize,
    pub surface: String,
    pub normalized_key: String,
    pub entity_type: EntityType,
    pub confidence: f64,
    pub extractor_tag: String,
}

impl Mention {
    /// §3: "offsets non-negative, end > start, surface substring equals
    /// Sentence[start:end] before casing normalization."
    pub fn is_valid(&self, sentence_text: &str) -> bool {
        self.end > self.start
            && sentence_text
                .get(self.start..self.end)
                .map(|s| s == self.surface)
                .unwrap_or(false)
    }
}

/// A single piece of supporting evidence for a Relationship (§3, §4.5).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    pub paper_id: String,
    pub sentence_index: usize,
    pub confidence: f64,
    pub extractor_tag: String,
}

/// A candidate relationship before GraphLoader persistence, keyed by
/// `(subject_key, predicate, object_key)` with an evidence list (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipCandidate {
    pub subject_type: EntityType,
    pub subject_key: String,
    pub predicate: Predicate,
    pub object_type: EntityType,
    pub object_key: String,
    pub evidence: Vec<Evidence>,
}

impl RelationshipCandidate {
    pub fn headline_confidence(&self) -> f64 {
        self.evidence.iter().map(|e| e.confidence).fold(0.0, f64::max)
    }
}

/// A de-duplicated surface cluster (§3 Entity (canonical)).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalEntity {
    pub entity_type: EntityType,
    pub canonical_name: String,
    pub canonical_name_normalized: String,
    pub aliases: BTreeSet<String>,
    pub external_ids: std::collections::BTreeMap<String, String>,
    pub ontology_refs: Vec<OntologyMatch>,
    pub mention_count: i64,
    pub paper_count: i64,
    pub resolved: bool,
}

impl CanonicalEntity {
    pub fn key(&self) -> String {
        format!("{}::{}", self.entity_type, self.canonical_name_normalized)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyMatch {
    pub ontology: String,
    pub term_id: String,
    pub preferred_label: String,
    pub score: f64,
}

/// A cluster produced by TopicModel (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub topic_id: i32,
    pub keywords: Vec<String>,
    pub coherence: f64,
    pub size: i64,
}
