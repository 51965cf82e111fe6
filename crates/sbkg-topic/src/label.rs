//! Topic labeling via class-based TF-IDF (§4.6 step 4): each cluster is
//! treated as one "document" (its papers' text concatenated) and scored
//! against the rest of the corpus, the way c-TF-IDF treats clusters as
//! classes rather than scoring individual documents.

use std::collections::{BTreeMap, HashSet};

const TOP_K_KEYWORDS: usize = 10;

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(|w| w.to_lowercase())
        .collect()
}

fn stop_words() -> &'static HashSet<&'static str> {
    use std::sync::OnceLock;
    static WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    WORDS.get_or_init(|| {
        ["the", "and", "for", "with", "that", "this", "from", "were", "was", "are", "has", "have", "been", "not", "but", "can", "its", "into", "than", "then"]
            .into_iter()
            .collect()
    })
}

/// Top keywords per non-outlier cluster, ranked by class-based TF-IDF.
/// `cluster_texts` maps topic_id to the concatenated text of its papers.
pub fn label_clusters(cluster_texts: &BTreeMap<i32, String>) -> BTreeMap<i32, Vec<String>> {
    let stop = stop_words();
    let class_terms: BTreeMap<i32, BTreeMap<String, usize>> = cluster_texts
        .iter()
        .map(|(topic_id, text)| {
            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for token in tokenize(text) {
                if stop.contains(token.as_str()) {
                    continue;
                }
                *counts.entry(token).or_insert(0) += 1;
            }
            (*topic_id, counts)
        })
        .collect();

    let num_classes = class_terms.len().max(1) as f64;
    let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
    for terms in class_terms.values() {
        for term in terms.keys() {
            *document_frequency.entry(term.clone()).or_insert(0) += 1;
        }
    }

    class_terms
        .into_iter()
        .map(|(topic_id, counts)| {
            let class_total: usize = counts.values().sum::<usize>().max(1);
            let mut scored: Vec<(String, f64)> = counts
                .into_iter()
                .map(|(term, count)| {
                    let tf = count as f64 / class_total as f64;
                    let df = *document_frequency.get(&term).unwrap_or(&1) as f64;
                    let idf = (num_classes / df).ln() + 1.0;
                    (term, tf * idf)
                })
                .collect();
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
            scored.truncate(TOP_K_KEYWORDS);
            (topic_id, scored.into_iter().map(|(term, _)| term).collect())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinctive_terms_rank_above_shared_terms() {
        let mut texts = BTreeMap::new();
        texts.insert(0, "microgravity bone loss osteoblast microgravity".to_string());
        texts.insert(1, "radiation dna damage repair pathway radiation".to_string());
        let labels = label_clusters(&texts);
        assert!(labels[&0].contains(&"microgravity".to_string()));
        assert!(labels[&1].contains(&"radiation".to_string()));
    }
}
