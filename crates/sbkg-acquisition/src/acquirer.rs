//! Acquirer orchestration (§4.2): curated ingest, literature search, and
//! secondary sources feeding one deduper, bounded by `max_papers`.

use crate::curated::load_curated;
use crate::dedup::Deduper;
use crate::models::{IngestionSource, PaperMetadata};
use crate::sources::biorxiv::BioRxivClient;
use crate::sources::crossref::CrossRefClient;
use crate::sources::europepmc::EuropePmcClient;
use crate::sources::pubmed::PubMedClient;
use crate::sources::LiteratureSource;
use secrecy::ExposeSecret;
use sbkg_common::rate_limit::{self, SharedLimiter};
use sbkg_common::{ErrorKind, Paper, RejectedRecord, Result, SbkgError};
use sbkg_config::AcquisitionConfig;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

const BACKOFF_SCHEDULE_SECS: [u64; 3] = [1, 2, 4];

pub struct AcquisitionOutput {
    pub papers: Vec<Paper>,
    pub rejected: Vec<RejectedRecord>,
}

pub struct Acquirer {
    config: AcquisitionConfig,
    limiter: SharedLimiter,
}

impl Acquirer {
    pub fn new(config: AcquisitionConfig) -> Self {
        Self { config, limiter: rate_limit::per_second(3) }
    }

    /// Runs curated ingest (if enabled and `curated_path` given), literature
    /// search (if enabled), and any configured secondary sources, folding
    /// everything into one deduplicated, `max_papers`-bounded sequence.
    pub async fn run(&self, curated_path: Option<&Path>) -> Result<AcquisitionOutput> {
        let mut dedup = Deduper::new();
        let mut rejected = Vec::new();

        if self.config.curated_enabled {
            if let Some(path) = curated_path {
                let (papers, mut curated_rejected) = load_curated(path)?;
                for paper in papers {
                    dedup.offer(paper);
                }
                rejected.append(&mut curated_rejected);
            }
        }

        if self.config.literature_enabled {
            let contact = self.config.literature_contact_email.as_ref().ok_or_else(|| {
                SbkgError::Config("literature_enabled requires literature_contact_email".into())
            })?;
            let query = self.config.search_terms.join(" AND ");
            let hits = self.search_literature(&query, contact).await?;
            for hit in hits {
                if hit.abstract_text.is_none() {
                    rejected.push(RejectedRecord::new(
                        "acquirer",
                        hit.preferred_id().map(str::to_string),
                        ErrorKind::MissingField,
                        "literature hit has no abstract",
                    ));
                    continue;
                }
                dedup.offer(metadata_to_paper(hit));
            }
        }

        for name in &self.config.secondary_sources {
            match self.search_secondary(name, &self.config.search_terms.join(" ")).await {
                Ok(hits) => {
                    for hit in hits {
                        if hit.abstract_text.is_some() {
                            dedup.offer(metadata_to_paper(hit));
                        }
                    }
                }
                Err(e) => warn!(source = name.as_str(), error = %e, "secondary source failed, continuing"),
            }
        }

        let mut papers = dedup.into_papers();
        papers.truncate(self.config.max_papers);

        if papers.is_empty() && (self.config.curated_enabled || self.config.literature_enabled) {
            return Err(SbkgError::Acquisition("zero papers acquired".into()));
        }

        info!(count = papers.len(), rejected = rejected.len(), "acquisition complete");
        Ok(AcquisitionOutput { papers, rejected })
    }

    async fn search_literature(&self, query: &str, _contact: &str) -> Result<Vec<PaperMetadata>> {
        let api_key = self.config.literature_api_key.as_ref().map(|k| k.expose_secret().to_string());
        let client = PubMedClient::new(api_key).map_err(|e| SbkgError::ExternalService(e.to_string()))?;
        self.with_retries(|| async {
            rate_limit::acquire(&self.limiter).await;
            client.search(query, self.config.max_papers).await
        })
        .await
        .map_err(|e| SbkgError::ExternalService(e.to_string()))
    }

    async fn search_secondary(&self, name: &str, query: &str) -> anyhow::Result<Vec<PaperMetadata>> {
        rate_limit::acquire(&self.limiter).await;
        match name {
            "europepmc" => EuropePmcClient::new()?.search(query, self.config.max_papers).await,
            "biorxiv" => BioRxivClient::new_biorxiv()?.search(query, self.config.max_papers).await,
            "crossref" => CrossRefClient::new()?.search(query, self.config.max_papers).await,
            other => Err(anyhow::anyhow!("unknown secondary source: {other}")),
        }
    }

    /// Exponential back-off retry: 1s, 2s, 4s (§4.2 step 2), up to
    /// `retry_count` attempts after the first.
    async fn with_retries<F, Fut, T>(&self, mut f: F) -> anyhow::Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < self.config.retry_count => {
                    let delay = BACKOFF_SCHEDULE_SECS[(attempt as usize).min(BACKOFF_SCHEDULE_SECS.len() - 1)];
                    warn!(attempt, error = %e, "transient failure, retrying after {delay}s");
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn metadata_to_paper(meta: PaperMetadata) -> Paper {
    let literature_id = meta
        .preferred_id()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}:{}", meta.source.as_str(), sbkg_common::domain::normalize_key(&meta.title)));

    let mut paper = Paper::new(literature_id, meta.title, meta.source.as_str());
    paper.secondary_ids = [meta.doi, meta.pmid, meta.pmcid].into_iter().flatten().collect();
    paper.abstract_text = meta.abstract_text;
    paper.authors = meta.authors.into_iter().map(|a| a.name).collect();
    paper.journal = meta.journal;
    paper.publication_year = meta.pub_date.map(|d| chrono::Datelike::year(&d));
    paper
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_without_ids_gets_synthetic_literature_id() {
        let meta = PaperMetadata {
            doi: None,
            pmid: None,
            pmcid: None,
            title: "Microgravity and bone loss".into(),
            abstract_text: Some("...".into()),
            authors: vec![],
            journal: None,
            pub_date: None,
            source: IngestionSource::BioRxiv,
            open_access: true,
            full_text_url: None,
        };
        let paper = metadata_to_paper(meta);
        assert!(paper.literature_id.starts_with("biorxiv:"));
    }
}
