//! TopicModel orchestration (§4.6): embed -> reduce -> cluster -> label ->
//! score coherence, with the small-corpus and degenerate-cluster edge
//! cases called out in the module docs of `cluster`/`label`.

use std::collections::{BTreeMap, HashSet};

use sbkg_common::{Paper, Topic};
use sbkg_config::TopicConfig;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::embedder::BiomedBertEmbedder;
use crate::error::Result;
use crate::{cluster, coherence, label, reduce};

const UNCLUSTERED_TOPIC_ID: i32 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicAssignment {
    pub paper_id: String,
    pub topic_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicModelOutput {
    pub assignments: Vec<TopicAssignment>,
    pub topics: Vec<Topic>,
}

fn paper_text(paper: &Paper) -> String {
    let mut text = paper.title.clone();
    if let Some(abstract_text) = &paper.abstract_text {
        text.push(' ');
        text.push_str(abstract_text);
    }
    text
}

fn tokenize_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(|w| w.to_lowercase())
        .collect()
}

pub async fn run_topic_model(papers: &[Paper], config: &TopicConfig) -> Result<TopicModelOutput> {
    if papers.is_empty() {
        return Ok(TopicModelOutput { assignments: Vec::new(), topics: Vec::new() });
    }

    if papers.len() < config.min_topic_size * 2 {
        return Ok(unclustered_output(papers));
    }

    let embedder = BiomedBertEmbedder::new(EmbeddingConfig::from_topic_config(config)).await?;
    let texts: Vec<String> = papers.iter().map(paper_text).collect();
    let embeddings = embedder.embed(&texts).await?;

    let reduced = reduce::reduce(&embeddings, config.umap_params.n_components)?;
    let labels = cluster::cluster(&reduced, config.min_topic_size, config.hdbscan_params.min_samples)?;

    let assignments: Vec<TopicAssignment> = papers
        .iter()
        .zip(labels.iter())
        .map(|(paper, &topic_id)| TopicAssignment { paper_id: paper.literature_id.clone(), topic_id })
        .collect();

    let mut cluster_texts: BTreeMap<i32, String> = BTreeMap::new();
    let mut cluster_sizes: BTreeMap<i32, i64> = BTreeMap::new();
    for (paper, &topic_id) in papers.iter().zip(labels.iter()) {
        if topic_id == UNCLUSTERED_TOPIC_ID {
            continue;
        }
        cluster_texts.entry(topic_id).or_default().push_str(&paper_text(paper));
        cluster_texts.entry(topic_id).or_default().push(' ');
        *cluster_sizes.entry(topic_id).or_insert(0) += 1;
    }

    let keywords_by_topic = label::label_clusters(&cluster_texts);
    let documents: Vec<HashSet<String>> = texts.iter().map(|t| tokenize_set(t)).collect();

    let topics = keywords_by_topic
        .into_iter()
        .map(|(topic_id, keywords)| {
            let coherence = coherence::npmi_coherence(&keywords, &documents);
            Topic { topic_id, keywords, coherence, size: *cluster_sizes.get(&topic_id).unwrap_or(&0) }
        })
        .collect();

    Ok(TopicModelOutput { assignments, topics })
}

fn unclustered_output(papers: &[Paper]) -> TopicModelOutput {
    let assignments = papers
        .iter()
        .map(|p| TopicAssignment { paper_id: p.literature_id.clone(), topic_id: UNCLUSTERED_TOPIC_ID })
        .collect();
    let topics = vec![Topic {
        topic_id: UNCLUSTERED_TOPIC_ID,
        keywords: Vec::new(),
        coherence: 0.0,
        size: papers.len() as i64,
    }];
    TopicModelOutput { assignments, topics }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn small_corpus_skips_clustering() {
        let mut papers = Vec::new();
        for i in 0..3 {
            let mut p = Paper::new(format!("p{i}"), "title", "nasa_osdr");
            p.abstract_text = Some("bone loss in microgravity".to_string());
            papers.push(p);
        }
        let config = TopicConfig { min_topic_size: 10, ..TopicConfig::default() };
        let out = run_topic_model(&papers, &config).await.unwrap();
        assert!(out.assignments.iter().all(|a| a.topic_id == -1));
        assert_eq!(out.topics.len(), 1);
    }

    #[tokio::test]
    async fn empty_corpus_yields_nothing() {
        let out = run_topic_model(&[], &TopicConfig::default()).await.unwrap();
        assert!(out.assignments.is_empty());
        assert!(out.topics.is_empty());
    }
}
