//! Aligner (§4.8): matches canonical Entities against bundled ontology
//! term lists and records up to three `OntologyMatch` candidates, ranked
//! exact-label > exact-synonym > token-Jaccard, with the first entry as
//! the primary match. A miss is not an error.

use std::collections::HashSet;

use sbkg_common::{normalize_key, CanonicalEntity, EntityType, OntologyMatch};
use sbkg_config::{AlignerConfig, Ontology};

use crate::ontology_data::{bundled_terms, OntologyTerm};

const TOP_K: usize = 3;

const STOPWORDS: &[&str] = &["the", "a", "an", "of", "in", "and", "or", "to", "for"];

fn content_tokens(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| !t.is_empty() && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}

fn ontology_for(entity_type: EntityType) -> Option<Ontology> {
    match entity_type {
        EntityType::Gene | EntityType::Protein => Some(Ontology::Go),
        EntityType::Phenotype => Some(Ontology::Hpo),
        EntityType::Disease => Some(Ontology::Mondo),
        EntityType::Stressor => Some(Ontology::Envo),
        EntityType::CellType => Some(Ontology::Cl),
        _ => None,
    }
}

/// Match tier; lower sorts first. The recorded `OntologyMatch::score` still
/// carries an informative value (1.0 exact, 0.9 synonym, raw Jaccard for
/// token matches) but ranking is driven by `tier`, not by comparing scores
/// across tiers.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct Tier(u8);

const TIER_EXACT_LABEL: Tier = Tier(0);
const TIER_EXACT_SYNONYM: Tier = Tier(1);
const TIER_TOKEN_JACCARD: Tier = Tier(2);

struct Candidate {
    tier: Tier,
    score: f64,
    term: &'static OntologyTerm,
}

pub struct Aligner {
    config: AlignerConfig,
}

impl Aligner {
    pub fn new(config: AlignerConfig) -> Self {
        Self { config }
    }

    pub fn align_all(&self, entities: &mut [CanonicalEntity]) {
        for entity in entities.iter_mut() {
            entity.ontology_refs = self.align_one(entity);
        }
    }

    fn align_one(&self, entity: &CanonicalEntity) -> Vec<OntologyMatch> {
        let Some(ontology) = ontology_for(entity.entity_type) else {
            return Vec::new();
        };
        if !self.config.ontologies_enabled.contains(&ontology) {
            return Vec::new();
        }

        let query_normalized = &entity.canonical_name_normalized;
        let query_tokens = content_tokens(&entity.canonical_name);

        let mut candidates: Vec<Candidate> = Vec::new();
        for term in bundled_terms().iter().filter(|t| t.ontology == ontology) {
            if normalize_key(term.preferred_label) == *query_normalized {
                candidates.push(Candidate { tier: TIER_EXACT_LABEL, score: 1.0, term });
                continue;
            }
            if term.synonyms.iter().any(|s| normalize_key(s) == *query_normalized) {
                candidates.push(Candidate { tier: TIER_EXACT_SYNONYM, score: 0.9, term });
                continue;
            }
            let term_tokens = content_tokens(term.preferred_label);
            let score = jaccard(&query_tokens, &term_tokens);
            if score >= self.config.match_threshold {
                candidates.push(Candidate { tier: TIER_TOKEN_JACCARD, score, term });
            }
        }

        candidates.sort_by(|a, b| a.tier.cmp(&b.tier).then(b.score.partial_cmp(&a.score).unwrap()));
        candidates
            .into_iter()
            .take(TOP_K)
            .map(|c| OntologyMatch {
                ontology: format!("{:?}", c.term.ontology).to_uppercase(),
                term_id: c.term.term_id.to_string(),
                preferred_label: c.term.preferred_label.to_string(),
                score: c.score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbkg_config::Ontology;
    use std::collections::HashSet;

    fn entity(entity_type: EntityType, name: &str) -> CanonicalEntity {
        CanonicalEntity {
            entity_type,
            canonical_name: name.to_string(),
            canonical_name_normalized: normalize_key(name),
            aliases: Default::default(),
            external_ids: Default::default(),
            ontology_refs: Vec::new(),
            mention_count: 1,
            paper_count: 1,
            resolved: false,
        }
    }

    fn config() -> AlignerConfig {
        AlignerConfig {
            ontologies_enabled: HashSet::from([
                Ontology::Go,
                Ontology::Hpo,
                Ontology::Mondo,
                Ontology::Envo,
                Ontology::Cl,
                Ontology::Uberon,
            ]),
            match_threshold: 0.8,
        }
    }

    #[test]
    fn exact_label_match_wins_as_primary() {
        let aligner = Aligner::new(config());
        let mut entities = vec![entity(EntityType::Disease, "osteoporosis")];
        aligner.align_all(&mut entities);
        assert_eq!(entities[0].ontology_refs[0].term_id, "MONDO:0005298");
    }

    #[test]
    fn synonym_match_is_found() {
        let aligner = Aligner::new(config());
        let mut entities = vec![entity(EntityType::Stressor, "weightlessness")];
        aligner.align_all(&mut entities);
        assert_eq!(entities[0].ontology_refs[0].term_id, "ENVO:01000999");
    }

    #[test]
    fn unsupported_entity_type_yields_no_matches() {
        let aligner = Aligner::new(config());
        let mut entities = vec![entity(EntityType::Intervention, "exercise countermeasure")];
        aligner.align_all(&mut entities);
        assert!(entities[0].ontology_refs.is_empty());
    }

    #[test]
    fn disabled_ontology_yields_no_matches() {
        let mut cfg = config();
        cfg.ontologies_enabled = HashSet::from([Ontology::Go]);
        let aligner = Aligner::new(cfg);
        let mut entities = vec![entity(EntityType::Disease, "osteoporosis")];
        aligner.align_all(&mut entities);
        assert!(entities[0].ontology_refs.is_empty());
    }
}
