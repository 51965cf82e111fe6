//! Entity resolution (ER, §3 "Entity (canonical)"): clusters the Mention
//! stream produced by NER into one canonical record per (type,
//! normalized_key), many-to-one. Runs before the Resolver and Aligner, both
//! of which operate on the resulting canonical Entities.

use std::collections::{BTreeSet, HashMap, HashSet};

use sbkg_common::artifact::{CanonicalEntity, Mention};

struct Cluster {
    entity_type: sbkg_common::EntityType,
    normalized_key: String,
    surface_counts: HashMap<String, i64>,
    papers: HashSet<String>,
    mention_count: i64,
}

/// Groups mentions by `(entity_type, normalized_key)`. The canonical name is
/// the most frequent surface form seen (ties broken by first occurrence);
/// every other surface form becomes an alias.
pub fn canonicalize(mentions: &[Mention]) -> Vec<CanonicalEntity> {
    let mut clusters: HashMap<(sbkg_common::EntityType, String), Cluster> = HashMap::new();
    let mut order: Vec<(sbkg_common::EntityType, String)> = Vec::new();

    for m in mentions {
        let key = (m.entity_type, m.normalized_key.clone());
        let cluster = clusters.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            Cluster {
                entity_type: m.entity_type,
                normalized_key: m.normalized_key.clone(),
                surface_counts: HashMap::new(),
                papers: HashSet::new(),
                mention_count: 0,
            }
        });
        *cluster.surface_counts.entry(m.surface.clone()).or_insert(0) += 1;
        cluster.papers.insert(m.paper_id.clone());
        cluster.mention_count += 1;
    }

    order
        .into_iter()
        .map(|key| {
            let cluster = clusters.remove(&key).expect("cluster was just inserted");
            let mut surfaces: Vec<(String, i64)> = cluster.surface_counts.into_iter().collect();
            surfaces.sort_by(|a, b| b.1.cmp(&a.1));
            let canonical_name = surfaces.first().map(|(s, _)| s.clone()).unwrap_or_else(|| cluster.normalized_key.clone());
            let aliases: BTreeSet<String> = surfaces.into_iter().map(|(s, _)| s).filter(|s| *s != canonical_name).collect();
            CanonicalEntity {
                entity_type: cluster.entity_type,
                canonical_name,
                canonical_name_normalized: cluster.normalized_key,
                aliases,
                external_ids: Default::default(),
                ontology_refs: Vec::new(),
                mention_count: cluster.mention_count,
                paper_count: cluster.papers.len() as i64,
                resolved: false,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbkg_common::EntityType;

    fn mention(paper_id: &str, surface: &str, normalized_key: &str) -> Mention {
        Mention {
            paper_id: paper_id.to_string(),
            sentence_index: 0,
            start: 0,
            end: surface.len(),
            surface: surface.to_string(),
            normalized_key: normalized_key.to_string(),
            entity_type: EntityType::Gene,
            confidence: 0.9,
            extractor_tag: "dictionary".to_string(),
        }
    }

    #[test]
    fn clusters_by_type_and_normalized_key() {
        let mentions = vec![mention("p1", "FOXO3", "foxo3"), mention("p1", "FOXO3", "foxo3"), mention("p2", "Foxo3", "foxo3")];
        let entities = canonicalize(&mentions);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].mention_count, 3);
        assert_eq!(entities[0].paper_count, 2);
        assert_eq!(entities[0].canonical_name, "FOXO3");
        assert!(entities[0].aliases.contains("Foxo3"));
    }

    #[test]
    fn distinct_keys_yield_distinct_entities() {
        let mut b = mention("p1", "TP53", "tp53");
        b.normalized_key = "tp53".to_string();
        let mentions = vec![mention("p1", "FOXO3", "foxo3"), b];
        let entities = canonicalize(&mentions);
        assert_eq!(entities.len(), 2);
    }
}
