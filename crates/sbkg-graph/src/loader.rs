//! GraphLoader (§4.9): loads Papers, Entities, Relationships, and Topics
//! into the graph store in natural-key upsert order, then their edges.
//! Batch failures retry with back-off; persistent failures are quarantined
//! into the returned report rather than failing the run (unless
//! `fail_fast`).

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use sbkg_common::artifact::{CanonicalEntity, Mention, Paper, RelationshipCandidate, Topic};
use sbkg_common::domain::EntityType;
use sbkg_common::error::{ErrorKind, RejectedRecord};
use sbkg_config::{GraphConfig, GraphMode};
use sbkg_db::schema::{
    EdgeRow, EntityRow, PaperRow, RelationshipRow, TopicRow, EDGE_HAS_TOPIC, EDGE_MENTIONS, EDGE_STUDIED_IN, TABLE_ENTITIES, TABLE_PAPERS,
    TABLE_TOPICS,
};
use sbkg_db::{Database, EdgeRepository, EntityRepository, PaperRepository, RelationshipRepository, TopicRepository};
use tracing::warn;
use uuid::Uuid;

use crate::convert::{entity_to_row, merge_relationship, paper_to_row, relationship_to_row, topic_to_row};
use crate::report::GraphLoadReport;

const MAX_BATCH_RETRIES: u32 = 3;
const BACKOFF_SCHEDULE_SECS: [u64; 3] = [1, 2, 4];
const STAGE: &str = "graph_loader";

pub struct GraphLoader {
    db: Database,
    config: GraphConfig,
}

impl GraphLoader {
    pub fn new(db: Database, config: GraphConfig) -> Self {
        Self { db, config }
    }

    pub async fn load(
        &self,
        papers: &[Paper],
        paper_topics: &HashMap<String, i32>,
        entities: &[CanonicalEntity],
        mentions: &[Mention],
        relationships: &[RelationshipCandidate],
        topics: &[Topic],
        fail_fast: bool,
    ) -> anyhow::Result<GraphLoadReport> {
        self.db.initialize().await?;
        let mut report = GraphLoadReport::default();

        self.load_papers(papers, paper_topics, &mut report, fail_fast).await?;
        for entity_type in EntityType::all() {
            let group: Vec<&CanonicalEntity> = entities.iter().filter(|e| e.entity_type == entity_type).collect();
            self.load_entities(&group, &mut report, fail_fast).await?;
        }
        self.load_topics(topics, &mut report, fail_fast).await?;

        self.load_mentions_edges(papers, mentions, &mut report, fail_fast).await?;
        self.load_has_topic_edges(paper_topics, &mut report, fail_fast).await?;
        self.load_studied_in_edges(mentions, &mut report, fail_fast).await?;
        self.load_relationships(relationships, &mut report, fail_fast).await?;

        Ok(report)
    }

    async fn load_papers(&self, papers: &[Paper], paper_topics: &HashMap<String, i32>, report: &mut GraphLoadReport, fail_fast: bool) -> anyhow::Result<()> {
        if self.config.mode == GraphMode::Replace && !papers.is_empty() {
            let keys: Vec<String> = papers.iter().map(|p| p.literature_id.clone()).collect();
            self.delete_by_column(TABLE_PAPERS, "literature_id", &keys).await?;
        }
        let repo = PaperRepository::new(&self.db);
        for batch in papers.chunks(self.config.batch_size.max(1)) {
            let rows: Vec<PaperRow> = batch
                .iter()
                .map(|p| paper_to_row(p, paper_topics.get(&p.literature_id).copied()))
                .collect();
            let outcome = with_batch_retries(|| async {
                for row in &rows {
                    repo.upsert(row).await?;
                }
                Ok(())
            })
            .await;
            match outcome {
                Ok(()) => report.add_nodes("Paper", rows.len()),
                Err(e) => self.quarantine_or_fail(report, "Paper", &e.to_string(), fail_fast)?,
            }
        }
        Ok(())
    }

    async fn load_entities(&self, entities: &[&CanonicalEntity], report: &mut GraphLoadReport, fail_fast: bool) -> anyhow::Result<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let label = format!("Entity:{}", entities[0].entity_type);
        if self.config.mode == GraphMode::Replace {
            let entity_type = entities[0].entity_type.to_string();
            let keys: Vec<String> = entities.iter().map(|e| e.canonical_name_normalized.clone()).collect();
            self.delete_entities(&entity_type, &keys).await?;
        }
        let repo = EntityRepository::new(&self.db);
        for batch in entities.chunks(self.config.batch_size.max(1)) {
            let rows: Vec<EntityRow> = batch.iter().map(|e| entity_to_row(e)).collect();
            let outcome = with_batch_retries(|| repo.upsert_batch(&rows)).await;
            match outcome {
                Ok(()) => report.add_nodes(label.clone(), rows.len()),
                Err(e) => self.quarantine_or_fail(report, &label, &e.to_string(), fail_fast)?,
            }
        }
        Ok(())
    }

    async fn load_topics(&self, topics: &[Topic], report: &mut GraphLoadReport, fail_fast: bool) -> anyhow::Result<()> {
        if topics.is_empty() {
            return Ok(());
        }
        if self.config.mode == GraphMode::Replace {
            let keys: Vec<String> = topics.iter().map(|t| t.topic_id.to_string()).collect();
            self.delete_by_column(TABLE_TOPICS, "topic_id", &keys).await?;
        }
        let repo = TopicRepository::new(&self.db);
        for batch in topics.chunks(self.config.batch_size.max(1)) {
            let rows: Vec<TopicRow> = batch.iter().map(topic_to_row).collect();
            let outcome = with_batch_retries(|| repo.upsert_batch(&rows)).await;
            match outcome {
                Ok(()) => report.add_nodes("Topic", rows.len()),
                Err(e) => self.quarantine_or_fail(report, "Topic", &e.to_string(), fail_fast)?,
            }
        }
        Ok(())
    }

    /// `MENTIONS` edges: one per (paper, entity) pair mentioned in that
    /// paper, property `mention_count` = number of mentions of that entity
    /// within the paper (§4.9 Edge types).
    async fn load_mentions_edges(&self, papers: &[Paper], mentions: &[Mention], report: &mut GraphLoadReport, fail_fast: bool) -> anyhow::Result<()> {
        let known_papers: std::collections::HashSet<&str> = papers.iter().map(|p| p.literature_id.as_str()).collect();
        let mut counts: BTreeMap<(String, String), i64> = BTreeMap::new();
        for m in mentions {
            if !known_papers.contains(m.paper_id.as_str()) {
                continue;
            }
            let target_key = format!("{}::{}", m.entity_type, m.normalized_key);
            *counts.entry((m.paper_id.clone(), target_key)).or_insert(0) += 1;
        }
        let rows: Vec<EdgeRow> = counts
            .into_iter()
            .map(|((paper_id, target_key), count)| edge_row(&paper_id, EDGE_MENTIONS, &target_key, Some(count)))
            .collect();
        self.load_edge_rows(rows, EDGE_MENTIONS, report, fail_fast).await
    }

    async fn load_has_topic_edges(&self, paper_topics: &HashMap<String, i32>, report: &mut GraphLoadReport, fail_fast: bool) -> anyhow::Result<()> {
        let rows: Vec<EdgeRow> = paper_topics
            .iter()
            .map(|(paper_id, topic_id)| edge_row(paper_id, EDGE_HAS_TOPIC, &topic_id.to_string(), None))
            .collect();
        self.load_edge_rows(rows, EDGE_HAS_TOPIC, report, fail_fast).await
    }

    /// Optional `STUDIED_IN` edges, one per paper that mentions at least one
    /// ORGANISM entity (§4.9 Edge types, "optional").
    async fn load_studied_in_edges(&self, mentions: &[Mention], report: &mut GraphLoadReport, fail_fast: bool) -> anyhow::Result<()> {
        let mut seen: std::collections::HashSet<(String, String)> = std::collections::HashSet::new();
        let mut rows = Vec::new();
        for m in mentions {
            if m.entity_type != EntityType::Organism {
                continue;
            }
            let target_key = format!("{}::{}", m.entity_type, m.normalized_key);
            if seen.insert((m.paper_id.clone(), target_key.clone())) {
                rows.push(edge_row(&m.paper_id, EDGE_STUDIED_IN, &target_key, None));
            }
        }
        self.load_edge_rows(rows, EDGE_STUDIED_IN, report, fail_fast).await
    }

    async fn load_edge_rows(&self, rows: Vec<EdgeRow>, edge_type: &str, report: &mut GraphLoadReport, fail_fast: bool) -> anyhow::Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let repo = EdgeRepository::new(&self.db);
        for batch in rows.chunks(self.config.batch_size.max(1)) {
            let outcome = with_batch_retries(|| repo.upsert_batch(batch)).await;
            match outcome {
                Ok(()) => report.add_edges(edge_type, batch.len()),
                Err(e) => self.quarantine_or_fail(report, edge_type, &e.to_string(), fail_fast)?,
            }
        }
        Ok(())
    }

    /// Predicate edges (§4.9): persisted as `RelationshipRow`s, with
    /// existing evidence unioned in rather than overwritten.
    async fn load_relationships(&self, relationships: &[RelationshipCandidate], report: &mut GraphLoadReport, fail_fast: bool) -> anyhow::Result<()> {
        if relationships.is_empty() {
            return Ok(());
        }
        let repo = RelationshipRepository::new(&self.db);
        for batch in relationships.chunks(self.config.batch_size.max(1)) {
            let outcome = with_batch_retries(|| async {
                let mut rows = Vec::with_capacity(batch.len());
                for candidate in batch {
                    let incoming = relationship_to_row(candidate);
                    let row = match repo.find_by_key(&incoming.subject_key, &incoming.predicate, &incoming.object_key).await? {
                        Some(existing) => merge_relationship(&existing, &incoming),
                        None => incoming,
                    };
                    rows.push(row);
                }
                repo.upsert_batch(&rows).await
            })
            .await;
            match outcome {
                Ok(()) => {
                    for candidate in batch {
                        report.add_edges(candidate.predicate.to_string(), 1);
                    }
                }
                Err(e) => self.quarantine_or_fail(report, "Relationship", &e.to_string(), fail_fast)?,
            }
        }
        Ok(())
    }

    async fn delete_by_column(&self, table: &str, column: &str, keys: &[String]) -> anyhow::Result<()> {
        if keys.is_empty() || !self.db.table_exists(table).await? {
            return Ok(());
        }
        let list = keys.iter().map(|k| format!("'{}'", k.replace('\'', "''"))).collect::<Vec<_>>().join(", ");
        let predicate = format!("{column} IN ({list})");
        let t = self.db.open_table(table).await?;
        t.delete(&predicate).await?;
        Ok(())
    }

    async fn delete_entities(&self, entity_type: &str, normalized_keys: &[String]) -> anyhow::Result<()> {
        if normalized_keys.is_empty() || !self.db.table_exists(TABLE_ENTITIES).await? {
            return Ok(());
        }
        let list = normalized_keys.iter().map(|k| format!("'{}'", k.replace('\'', "''"))).collect::<Vec<_>>().join(", ");
        let predicate = format!("entity_type = '{}' AND canonical_name_normalized IN ({list})", entity_type.replace('\'', "''"));
        let t = self.db.open_table(TABLE_ENTITIES).await?;
        t.delete(&predicate).await?;
        Ok(())
    }

    fn quarantine_or_fail(&self, report: &mut GraphLoadReport, label: &str, message: &str, fail_fast: bool) -> anyhow::Result<()> {
        warn!(label, message, "graph batch quarantined after exhausting retries");
        report.rejections.push(RejectedRecord::new(STAGE, None, ErrorKind::Other, format!("{label}: {message}")));
        if fail_fast {
            anyhow::bail!("graph load failed for {label}: {message}");
        }
        Ok(())
    }
}

fn edge_row(source_key: &str, edge_type: &str, target_key: &str, mention_count: Option<i64>) -> EdgeRow {
    let now = chrono::Utc::now();
    EdgeRow {
        id: Uuid::new_v4(),
        source_key: source_key.to_string(),
        edge_type: edge_type.to_string(),
        target_key: target_key.to_string(),
        mention_count,
        created_at: now,
        updated_at: now,
    }
}

async fn with_batch_retries<F, Fut, T, E>(mut f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) if attempt < MAX_BATCH_RETRIES => {
                let delay = BACKOFF_SCHEDULE_SECS[(attempt as usize).min(BACKOFF_SCHEDULE_SECS.len() - 1)];
                warn!(attempt, error = %e, "graph batch failed, retrying after {delay}s");
                tokio::time::sleep(Duration::from_secs(delay)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
