//! Read interface (§6.3): graph statistics and a pass-through query used by
//! `status`/`stats` and by callers embedding this pipeline. Neither
//! interprets query semantics beyond routing to the named table's natural
//! key lookup.

use serde::Serialize;
use sbkg_db::{Database, EdgeRepository, EntityRepository, PaperRepository, RelationshipRepository, TopicRepository};

#[derive(Debug, Serialize)]
pub struct GraphStatistics {
    pub node_counts: std::collections::BTreeMap<String, usize>,
    pub relationship_counts: std::collections::BTreeMap<String, usize>,
    pub total_nodes: usize,
    pub total_relationships: usize,
}

pub async fn get_graph_statistics(db: &Database) -> anyhow::Result<GraphStatistics> {
    let stats = db.stats().await?;
    let mut node_counts = std::collections::BTreeMap::new();
    node_counts.insert("paper".to_string(), stats.papers);
    node_counts.insert("entity".to_string(), stats.entities);
    node_counts.insert("topic".to_string(), stats.topics);

    let mut relationship_counts = std::collections::BTreeMap::new();
    relationship_counts.insert("relationship".to_string(), stats.relationships);
    relationship_counts.insert("edge".to_string(), stats.edges);

    let total_nodes = stats.papers + stats.entities + stats.topics;
    let total_relationships = stats.relationships + stats.edges;

    Ok(GraphStatistics { node_counts, relationship_counts, total_nodes, total_relationships })
}

/// Pass-through query over one of the five tables, keyed by natural key
/// where the repository supports a point lookup, or a full scan otherwise.
/// `params` is whatever the caller's repository method needs; this
/// function does not parse or validate the query language itself.
pub async fn execute_query(db: &Database, table: &str, params: &serde_json::Value) -> anyhow::Result<Vec<serde_json::Value>> {
    fn to_values<T: Serialize>(rows: Vec<T>) -> anyhow::Result<Vec<serde_json::Value>> {
        rows.into_iter().map(|r| Ok(serde_json::to_value(r)?)).collect()
    }

    match table {
        "papers" => {
            let repo = PaperRepository::new(db);
            let Some(literature_id) = params.get("literature_id").and_then(|v| v.as_str()) else {
                anyhow::bail!("papers query requires a \"literature_id\" param");
            };
            to_values(repo.find_by_literature_id(literature_id).await?.into_iter().collect::<Vec<_>>())
        }
        "entities" => {
            let repo = EntityRepository::new(db);
            match (params.get("entity_type").and_then(|v| v.as_str()), params.get("canonical_name_normalized").and_then(|v| v.as_str())) {
                (Some(entity_type), Some(key)) => to_values(repo.find_by_key(entity_type, key).await?.into_iter().collect::<Vec<_>>()),
                (Some(entity_type), None) => to_values(repo.find_by_type(entity_type).await?),
                _ => anyhow::bail!("entities query requires at least an \"entity_type\" param"),
            }
        }
        "relationships" => {
            let repo = RelationshipRepository::new(db);
            match (
                params.get("subject_key").and_then(|v| v.as_str()),
                params.get("predicate").and_then(|v| v.as_str()),
                params.get("object_key").and_then(|v| v.as_str()),
            ) {
                (Some(s), Some(p), Some(o)) => to_values(repo.find_by_key(s, p, o).await?.into_iter().collect::<Vec<_>>()),
                (Some(s), None, None) => to_values(repo.find_by_subject(s).await?),
                _ => anyhow::bail!("relationships query requires \"subject_key\" (and optionally \"predicate\"+\"object_key\")"),
            }
        }
        "edges" => {
            let repo = EdgeRepository::new(db);
            let Some(source_key) = params.get("source_key").and_then(|v| v.as_str()) else {
                anyhow::bail!("edges query requires a \"source_key\" param");
            };
            to_values(repo.find_by_source(source_key).await?)
        }
        "topics" => {
            let repo = TopicRepository::new(db);
            to_values(repo.all().await?)
        }
        other => anyhow::bail!("unknown table \"{other}\""),
    }
}
