//! Curated ingest (§4.2 step 1): a bundled list of records read from disk,
//! each validated to have a literature ID and title before being handed to
//! the deduper.

use sbkg_common::{Paper, RejectedRecord, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratedRecord {
    pub literature_id: String,
    #[serde(default)]
    pub secondary_ids: Vec<String>,
    pub title: String,
    #[serde(default)]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub mesh_tags: Vec<String>,
}

pub const CURATED_SOURCE_TAG: &str = "curated";

/// Reads a JSON array of [`CuratedRecord`] from `path`. Records missing a
/// literature ID or title are rejected rather than failing the whole read.
pub fn load_curated(path: &Path) -> Result<(Vec<Paper>, Vec<RejectedRecord>)> {
    let raw = std::fs::read_to_string(path)?;
    let records: Vec<CuratedRecord> = serde_json::from_str(&raw)?;

    let mut papers = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();

    for record in records {
        if record.literature_id.trim().is_empty() {
            rejected.push(RejectedRecord::new(
                "acquirer",
                None,
                sbkg_common::ErrorKind::MissingField,
                "curated record missing literature_id",
            ));
            continue;
        }
        if record.title.trim().is_empty() {
            rejected.push(RejectedRecord::new(
                "acquirer",
                Some(record.literature_id.clone()),
                sbkg_common::ErrorKind::MissingField,
                "curated record missing title",
            ));
            continue;
        }

        let mut paper = Paper::new(record.literature_id, record.title, CURATED_SOURCE_TAG);
        paper.secondary_ids = record.secondary_ids;
        paper.abstract_text = record.abstract_text;
        paper.full_text = record.full_text;
        paper.authors = record.authors;
        paper.publication_year = record.publication_year;
        paper.journal = record.journal;
        paper.mesh_tags = record.mesh_tags.into_iter().collect();
        papers.push(paper);
    }

    Ok((papers, rejected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn rejects_records_missing_required_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"literature_id": "p1", "title": "Microgravity and bone loss"}},
                {{"literature_id": "", "title": "missing id"}},
                {{"literature_id": "p2", "title": ""}}
            ]"#
        )
        .unwrap();

        let (papers, rejected) = load_curated(file.path()).unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(rejected.len(), 2);
    }
}
