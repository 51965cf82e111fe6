//! Shared candidate-span type and the trait every NER extractor implements
//! (§4.4).

use sbkg_common::EntityType;

/// One extractor's guess at an entity span within a single sentence.
#[derive(Debug, Clone)]
pub struct CandidateSpan {
    pub start: usize,
    pub end: usize,
    pub surface: String,
    pub entity_type: EntityType,
    pub confidence: f64,
    pub extractor_tag: &'static str,
}

/// A sentence extractor contributes candidate spans for one sentence. Each
/// extractor is independently enable-able and independently fails: a
/// extractor whose `extract` call errors is disabled for the rest of the run
/// by the ensemble, not the extractor itself.
pub trait Extractor: Send + Sync {
    fn tag(&self) -> &'static str;
    fn extract(&self, text: &str) -> anyhow::Result<Vec<CandidateSpan>>;
}

/// Priority used by reconciliation's tie-break (§4.4 step 2): lower wins.
pub fn priority_rank(tag: &str) -> u8 {
    match tag {
        "transformer_scientific" => 0,
        "dictionary_biomedical" => 1,
        "patterns_space_biology" => 2,
        _ => 3,
    }
}
