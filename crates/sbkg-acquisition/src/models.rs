//! Source-facing metadata shape. Each `LiteratureSource` adapter returns
//! `PaperMetadata`; the acquirer assigns a `literature_id` and folds it into
//! a `sbkg_common::Paper` (§4.2).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub doi: Option<String>,
    pub pmid: Option<String>,
    pub pmcid: Option<String>,
    pub title: String,
    pub abstract_text: Option<String>,
    pub authors: Vec<Author>,
    pub journal: Option<String>,
    pub pub_date: Option<NaiveDate>,
    pub source: IngestionSource,
    pub open_access: bool,
    pub full_text_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub affiliation: Option<String>,
    pub orcid: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IngestionSource {
    Curated,
    PubMed,
    EuropePmc,
    BioRxiv,
    MedRxiv,
    CrossRef,
}

impl IngestionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionSource::Curated => "curated",
            IngestionSource::PubMed => "pubmed",
            IngestionSource::EuropePmc => "europepmc",
            IngestionSource::BioRxiv => "biorxiv",
            IngestionSource::MedRxiv => "medrxiv",
            IngestionSource::CrossRef => "crossref",
        }
    }

    /// Source priority for literature-ID dedup first-write-wins (§4.2 step 4):
    /// explicit ids > curated > literature service > secondary.
    pub fn priority(&self) -> u8 {
        match self {
            IngestionSource::Curated => 0,
            IngestionSource::PubMed | IngestionSource::EuropePmc => 1,
            IngestionSource::BioRxiv | IngestionSource::MedRxiv | IngestionSource::CrossRef => 2,
        }
    }
}

impl PaperMetadata {
    /// The identifier used as `literature_id`: PMID, then DOI, then PMCID.
    /// Callers fall back to a source-qualified synthetic id if all are absent.
    pub fn preferred_id(&self) -> Option<&str> {
        self.pmid
            .as_deref()
            .or(self.doi.as_deref())
            .or(self.pmcid.as_deref())
    }
}
