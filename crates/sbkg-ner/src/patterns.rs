//! Pattern extractor (§4.4): curated space-biology regex/lexical patterns
//! for STRESSOR, PHENOTYPE, and INTERVENTION. Confidence 0.8 by default.

use regex::Regex;
use sbkg_common::EntityType;

use crate::extractor::{CandidateSpan, Extractor};

const EXTRACTOR_TAG: &str = "patterns_space_biology";
const PATTERN_CONFIDENCE: f64 = 0.8;

pub struct PatternExtractor {
    rules: Vec<(Regex, EntityType)>,
}

impl PatternExtractor {
    pub fn with_bundled_patterns() -> anyhow::Result<Self> {
        let mut rules = Vec::new();
        rules.push((build_regex(STRESSOR_TERMS)?, EntityType::Stressor));
        rules.push((build_regex(PHENOTYPE_TERMS)?, EntityType::Phenotype));
        rules.push((build_regex(INTERVENTION_TERMS)?, EntityType::Intervention));
        Ok(Self { rules })
    }

    fn remove_overlapping(mut spans: Vec<CandidateSpan>) -> Vec<CandidateSpan> {
        spans.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| (b.end - b.start).cmp(&(a.end - a.start))));
        let mut result = Vec::new();
        let mut last_end = 0;
        for span in spans {
            if span.start >= last_end {
                last_end = span.end;
                result.push(span);
            }
        }
        result
    }
}

fn build_regex(terms: &[&str]) -> anyhow::Result<Regex> {
    let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    Ok(Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))?)
}

impl Extractor for PatternExtractor {
    fn tag(&self) -> &'static str {
        EXTRACTOR_TAG
    }

    fn extract(&self, text: &str) -> anyhow::Result<Vec<CandidateSpan>> {
        let mut spans = Vec::new();
        for (regex, entity_type) in &self.rules {
            for m in regex.find_iter(text) {
                spans.push(CandidateSpan {
                    start: m.start(),
                    end: m.end(),
                    surface: m.as_str().to_string(),
                    entity_type: *entity_type,
                    confidence: PATTERN_CONFIDENCE,
                    extractor_tag: EXTRACTOR_TAG,
                });
            }
        }
        Ok(Self::remove_overlapping(spans))
    }
}

const STRESSOR_TERMS: &[&str] = &[
    "simulated microgravity",
    "microgravity",
    "spaceflight",
    "weightlessness",
    "hindlimb unloading",
    "ionizing radiation",
    "cosmic radiation",
    "galactic cosmic rays",
    "solar particle event",
    "partial gravity",
];

const PHENOTYPE_TERMS: &[&str] = &[
    "bone density loss",
    "bone loss",
    "muscle atrophy",
    "cardiac atrophy",
    "immune suppression",
    "oxidative stress",
    "spatial disorientation",
    "fluid shift",
    "vestibular dysfunction",
];

const INTERVENTION_TERMS: &[&str] = &[
    "resistive exercise",
    "artificial gravity",
    "exercise countermeasure",
    "nutritional supplementation",
    "bisphosphonate treatment",
    "centrifugation",
    "pharmacological countermeasure",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_stressor_and_phenotype_terms() {
        let ex = PatternExtractor::with_bundled_patterns().unwrap();
        let spans = ex.extract("Microgravity exposure led to bone loss in the cohort.").unwrap();
        assert!(spans.iter().any(|s| s.entity_type == EntityType::Stressor));
        assert!(spans.iter().any(|s| s.entity_type == EntityType::Phenotype));
        assert!(spans.iter().all(|s| s.confidence == PATTERN_CONFIDENCE));
    }

    #[test]
    fn longer_phrase_wins_over_substring() {
        let ex = PatternExtractor::with_bundled_patterns().unwrap();
        let spans = ex.extract("Bone density loss was measured after flight.").unwrap();
        assert!(spans.iter().any(|s| s.surface.eq_ignore_ascii_case("bone density loss")));
        assert!(!spans.iter().any(|s| s.surface.eq_ignore_ascii_case("bone loss")));
    }
}
