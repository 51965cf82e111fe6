//! NER ensemble (§4.4): runs the enabled extractors over every sentence of
//! a paper, reconciles their candidate spans into Mentions, and isolates
//! per-extractor failures so one bad extractor doesn't fail the whole run.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use sbkg_common::{Mention, Paper, SbkgError};
use sbkg_config::{NerConfig, NerModelKind};
use tracing::warn;

use crate::dictionary::DictionaryExtractor;
use crate::extractor::Extractor;
use crate::patterns::PatternExtractor;
use crate::reconcile::reconcile;
use crate::transformer::{TransformerExtractor, DEFAULT_MODEL_ID};

struct Slot {
    extractor: Box<dyn Extractor>,
    disabled: AtomicBool,
}

pub struct NerEnsemble {
    slots: Vec<Slot>,
    min_confidence: f64,
}

impl NerEnsemble {
    /// Builds the ensemble from the configured model set. The transformer
    /// extractor is the only one requiring a network/disk load, so building
    /// the ensemble is async; dictionary and pattern extractors are
    /// constructed in-process from bundled lexica.
    pub async fn build(config: &NerConfig) -> anyhow::Result<Self> {
        let mut slots = Vec::new();

        if config.models_enabled.contains(&NerModelKind::TransformerScientific) {
            match TransformerExtractor::load(DEFAULT_MODEL_ID).await {
                Ok(extractor) => slots.push(Slot { extractor: Box::new(extractor), disabled: AtomicBool::new(false) }),
                Err(e) => warn!(error = %e, "transformer NER model failed to load, extractor disabled"),
            }
        }
        if config.models_enabled.contains(&NerModelKind::DictionaryBiomedical) {
            let extractor = DictionaryExtractor::with_bundled_lexicon()?;
            slots.push(Slot { extractor: Box::new(extractor), disabled: AtomicBool::new(false) });
        }
        if config.models_enabled.contains(&NerModelKind::PatternsSpaceBiology) {
            let extractor = PatternExtractor::with_bundled_patterns()?;
            slots.push(Slot { extractor: Box::new(extractor), disabled: AtomicBool::new(false) });
        }

        if slots.is_empty() {
            return Err(anyhow::anyhow!("no NER extractors enabled"));
        }

        Ok(Self { slots, min_confidence: config.min_confidence })
    }

    fn all_disabled(&self) -> bool {
        self.slots.iter().all(|s| s.disabled.load(Ordering::Relaxed))
    }

    /// Runs every enabled, not-yet-failed extractor over each sentence of
    /// `paper` and returns the reconciled Mentions. Sentences are independent
    /// of each other, so they're extracted batch-parallel across a rayon
    /// pool (§5); a slot disabling itself mid-batch is visible to every
    /// in-flight sentence via its shared `AtomicBool`.
    pub fn process_paper(&self, paper: &Paper) -> Result<Vec<Mention>, SbkgError> {
        let Some(sentences) = paper.sentences.as_ref() else {
            return Ok(Vec::new());
        };

        let per_sentence: Result<Vec<Vec<Mention>>, SbkgError> = sentences
            .par_iter()
            .map(|sentence| {
                let mut candidates = Vec::new();
                for slot in &self.slots {
                    if slot.disabled.load(Ordering::Relaxed) {
                        continue;
                    }
                    match slot.extractor.extract(&sentence.text) {
                        Ok(spans) => candidates.extend(spans),
                        Err(e) => {
                            warn!(extractor = slot.extractor.tag(), error = %e, "extractor failed, disabling for remainder of run");
                            slot.disabled.store(true, Ordering::Relaxed);
                            if self.all_disabled() {
                                return Err(SbkgError::ModelUnavailable("all NER extractors failed".into()));
                            }
                        }
                    }
                }
                Ok(reconcile(candidates, self.min_confidence, &paper.literature_id, sentence.index))
            })
            .collect();

        Ok(per_sentence?.into_iter().flatten().collect())
    }
}
