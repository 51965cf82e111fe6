//! Topic coherence via normalized pointwise mutual information (§4.6 step
//! 5): averaged NPMI of every keyword pair over the document set a keyword
//! co-occurs with another, at the document (paper) granularity.

use std::collections::HashSet;

/// `keywords` are one topic's labels; `documents` is the tokenized-lowercased
/// text of every paper in the corpus (not just the topic's own papers).
pub fn npmi_coherence(keywords: &[String], documents: &[HashSet<String>]) -> f64 {
    let n = documents.len();
    if n == 0 || keywords.len() < 2 {
        return 0.0;
    }

    let doc_count = |word: &str| documents.iter().filter(|d| d.contains(word)).count();
    let co_doc_count = |a: &str, b: &str| documents.iter().filter(|d| d.contains(a) && d.contains(b)).count();

    let mut total = 0.0;
    let mut pairs = 0usize;

    for i in 0..keywords.len() {
        for j in (i + 1)..keywords.len() {
            let co = co_doc_count(&keywords[i], &keywords[j]);
            if co == 0 {
                total += -1.0; // log(epsilon) normalized floors to -1
                pairs += 1;
                continue;
            }
            let p_co = co as f64 / n as f64;
            let p_i = doc_count(&keywords[i]) as f64 / n as f64;
            let p_j = doc_count(&keywords[j]) as f64 / n as f64;
            if p_i == 0.0 || p_j == 0.0 {
                continue;
            }
            let pmi = (p_co / (p_i * p_j)).ln();
            let npmi = pmi / -p_co.ln();
            total += npmi;
            pairs += 1;
        }
    }

    if pairs == 0 {
        0.0
    } else {
        total / pairs as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_cooccurring_pair_has_high_coherence() {
        let docs: Vec<HashSet<String>> = (0..10)
            .map(|_| ["bone".to_string(), "loss".to_string()].into_iter().collect())
            .collect();
        let coherence = npmi_coherence(&["bone".to_string(), "loss".to_string()], &docs);
        assert!(coherence > 0.9);
    }

    #[test]
    fn never_cooccurring_pair_floors_at_minus_one() {
        let docs = vec![
            ["bone".to_string()].into_iter().collect::<HashSet<_>>(),
            ["radiation".to_string()].into_iter().collect(),
        ];
        let coherence = npmi_coherence(&["bone".to_string(), "radiation".to_string()], &docs);
        assert!((coherence + 1.0).abs() < 1e-9);
    }
}
