//! Dictionary biomedical NER extractor (§4.4): Aho-Corasick matching
//! against bundled lexica for DISEASE, CHEMICAL, ORGANISM, and CELL_TYPE.
//! Canonical forms match at confidence 1.0, aliases at 0.7.

use aho_corasick::{AhoCorasick, MatchKind};
use sbkg_common::EntityType;

use crate::extractor::{CandidateSpan, Extractor};

const EXTRACTOR_TAG: &str = "dictionary_biomedical";
const EXACT_CONFIDENCE: f64 = 1.0;
const PARTIAL_CONFIDENCE: f64 = 0.7;

pub struct DictionaryExtractor {
    automaton: AhoCorasick,
    pattern_info: Vec<(EntityType, f64)>,
}

impl DictionaryExtractor {
    pub fn with_bundled_lexicon() -> anyhow::Result<Self> {
        let mut patterns = Vec::new();
        let mut pattern_info = Vec::new();

        for (term, entity_type) in CANONICAL_TERMS {
            patterns.push(term.to_string());
            pattern_info.push((*entity_type, EXACT_CONFIDENCE));
        }
        for (alias, entity_type) in ALIAS_TERMS {
            patterns.push(alias.to_string());
            pattern_info.push((*entity_type, PARTIAL_CONFIDENCE));
        }

        let automaton = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .ascii_case_insensitive(true)
            .build(&patterns)?;

        Ok(Self { automaton, pattern_info })
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

impl Extractor for DictionaryExtractor {
    fn tag(&self) -> &'static str {
        EXTRACTOR_TAG
    }

    fn extract(&self, text: &str) -> anyhow::Result<Vec<CandidateSpan>> {
        let spans: Vec<CandidateSpan> = self
            .automaton
            .find_iter(text)
            .map(|m| {
                let (entity_type, confidence) = self.pattern_info[m.pattern().as_usize()];
                CandidateSpan {
                    start: m.start(),
                    end: m.end(),
                    surface: text[m.start()..m.end()].to_string(),
                    entity_type,
                    confidence,
                    extractor_tag: EXTRACTOR_TAG,
                }
            })
            .collect();
        Ok(Self::remove_overlapping(spans))
    }
}

const CANONICAL_TERMS: &[(&str, EntityType)] = &[
    ("osteoporosis", EntityType::Disease),
    ("cardiovascular disease", EntityType::Disease),
    ("radiation sickness", EntityType::Disease),
    ("immune dysfunction", EntityType::Disease),
    ("cataracts", EntityType::Disease),
    ("kidney stones", EntityType::Disease),
    ("dexamethasone", EntityType::Chemical),
    ("ascorbic acid", EntityType::Chemical),
    ("vitamin d", EntityType::Chemical),
    ("cortisol", EntityType::Chemical),
    ("reactive oxygen species", EntityType::Chemical),
    ("mus musculus", EntityType::Organism),
    ("rattus norvegicus", EntityType::Organism),
    ("arabidopsis thaliana", EntityType::Organism),
    ("drosophila melanogaster", EntityType::Organism),
    ("homo sapiens", EntityType::Organism),
    ("caenorhabditis elegans", EntityType::Organism),
    ("osteoblast", EntityType::CellType),
    ("osteoclast", EntityType::CellType),
    ("myocyte", EntityType::CellType),
    ("lymphocyte", EntityType::CellType),
    ("macrophage", EntityType::CellType),
];

const ALIAS_TERMS: &[(&str, EntityType)] = &[
    ("mouse", EntityType::Organism),
    ("mice", EntityType::Organism),
    ("rat", EntityType::Organism),
    ("fruit fly", EntityType::Organism),
    ("c. elegans", EntityType::Organism),
    ("vit d", EntityType::Chemical),
    ("ros", EntityType::Chemical),
    ("bone disease", EntityType::Disease),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_canonical_terms_at_full_confidence() {
        let ex = DictionaryExtractor::with_bundled_lexicon().unwrap();
        let spans = ex.extract("Mice were treated with dexamethasone.").unwrap();
        let dex = spans.iter().find(|s| s.surface.eq_ignore_ascii_case("dexamethasone")).unwrap();
        assert_eq!(dex.confidence, EXACT_CONFIDENCE);
        assert_eq!(dex.entity_type, EntityType::Chemical);
    }

    #[test]
    fn matches_alias_at_partial_confidence() {
        let ex = DictionaryExtractor::with_bundled_lexicon().unwrap();
        let spans = ex.extract("The mouse model showed bone loss.").unwrap();
        let mouse = spans.iter().find(|s| s.surface.eq_ignore_ascii_case("mouse")).unwrap();
        assert_eq!(mouse.confidence, PARTIAL_CONFIDENCE);
    }

    #[test]
    fn longest_match_wins_over_overlap() {
        let ex = DictionaryExtractor::with_bundled_lexicon().unwrap();
        let spans = ex.extract("Rattus norvegicus was exposed to microgravity.").unwrap();
        assert!(spans.iter().any(|s| s.surface.eq_ignore_ascii_case("Rattus norvegicus")));
    }
}
