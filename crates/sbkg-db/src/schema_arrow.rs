//! Arrow schema definitions and row <-> `RecordBatch` conversions.

use crate::arrow_util::*;
use crate::error::{DbError, Result};
use crate::schema::*;
use arrow_array::{Array, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;
use uuid::Uuid;

fn rfc3339(dt: chrono::DateTime<chrono::Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_rfc3339(s: &str) -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_else(|_| chrono::Utc::now())
}

// ---------------------------------------------------------------------
// Papers
// ---------------------------------------------------------------------

pub fn paper_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("literature_id", DataType::Utf8, false),
        Field::new("secondary_ids", DataType::Utf8, true),
        Field::new("title", DataType::Utf8, false),
        Field::new("abstract_text", DataType::Utf8, true),
        Field::new("full_text", DataType::Utf8, true),
        Field::new("authors", DataType::Utf8, true),
        Field::new("publication_year", DataType::Int64, true),
        Field::new("journal", DataType::Utf8, true),
        Field::new("source_tags", DataType::Utf8, false),
        Field::new("mesh_tags", DataType::Utf8, true),
        Field::new("clean_text", DataType::Utf8, true),
        Field::new("topic_id", DataType::Int64, true),
        Field::new("ingested_at", DataType::Utf8, false),
    ]))
}

pub fn paper_to_record(row: &PaperRow) -> Result<RecordBatch> {
    RecordBatch::try_new(
        paper_schema(),
        vec![
            Arc::new(StringArray::from(vec![row.literature_id.as_str()])) as Arc<dyn Array>,
            Arc::new(StringArray::from(vec![Some(to_json(&row.secondary_ids)?)])),
            Arc::new(StringArray::from(vec![row.title.as_str()])),
            Arc::new(StringArray::from(vec![row.abstract_text.as_deref()])),
            Arc::new(StringArray::from(vec![row.full_text.as_deref()])),
            Arc::new(StringArray::from(vec![Some(to_json(&row.authors)?)])),
            Arc::new(Int64Array::from(vec![row.publication_year.map(|y| y as i64)])),
            Arc::new(StringArray::from(vec![row.journal.as_deref()])),
            Arc::new(StringArray::from(vec![to_json(&row.source_tags)?])),
            Arc::new(StringArray::from(vec![Some(to_json(&row.mesh_tags)?)])),
            Arc::new(StringArray::from(vec![row.clean_text.as_deref()])),
            Arc::new(Int64Array::from(vec![row.topic_id.map(|t| t as i64)])),
            Arc::new(StringArray::from(vec![rfc3339(row.ingested_at)])),
        ],
    )
    .map_err(DbError::from)
}

pub fn record_to_paper(batch: &RecordBatch, row: usize) -> Result<PaperRow> {
    Ok(PaperRow {
        literature_id: get_string(batch, 0, row),
        secondary_ids: get_json(batch, 1, row)?,
        title: get_string(batch, 2, row),
        abstract_text: get_opt_string(batch, 3, row),
        full_text: get_opt_string(batch, 4, row),
        authors: get_json(batch, 5, row)?,
        publication_year: get_opt_i64(batch, 6, row).map(|y| y as i32),
        journal: get_opt_string(batch, 7, row),
        source_tags: get_json(batch, 8, row)?,
        mesh_tags: get_json(batch, 9, row)?,
        clean_text: get_opt_string(batch, 10, row),
        topic_id: get_opt_i64(batch, 11, row).map(|t| t as i32),
        ingested_at: parse_rfc3339(&get_string(batch, 12, row)),
    })
}

// ---------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------

pub fn entity_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("entity_type", DataType::Utf8, false),
        Field::new("canonical_name", DataType::Utf8, false),
        Field::new("canonical_name_normalized", DataType::Utf8, false),
        Field::new("aliases", DataType::Utf8, true),
        Field::new("external_ids", DataType::Utf8, true),
        Field::new("ontology_refs", DataType::Utf8, true),
        Field::new("mention_count", DataType::Int64, false),
        Field::new("paper_count", DataType::Int64, false),
        Field::new("resolved", DataType::Boolean, false),
        Field::new("created_at", DataType::Utf8, false),
        Field::new("updated_at", DataType::Utf8, false),
    ]))
}

pub fn entity_to_record(row: &EntityRow) -> Result<RecordBatch> {
    RecordBatch::try_new(
        entity_schema(),
        vec![
            Arc::new(StringArray::from(vec![row.id.to_string()])) as Arc<dyn Array>,
            Arc::new(StringArray::from(vec![row.entity_type.as_str()])),
            Arc::new(StringArray::from(vec![row.canonical_name.as_str()])),
            Arc::new(StringArray::from(vec![row.canonical_name_normalized.as_str()])),
            Arc::new(StringArray::from(vec![Some(to_json(&row.aliases)?)])),
            Arc::new(StringArray::from(vec![Some(to_json(&row.external_ids)?)])),
            Arc::new(StringArray::from(vec![Some(to_json(&row.ontology_refs)?)])),
            Arc::new(Int64Array::from(vec![row.mention_count])),
            Arc::new(Int64Array::from(vec![row.paper_count])),
            Arc::new(BooleanArray::from(vec![row.resolved])),
            Arc::new(StringArray::from(vec![rfc3339(row.created_at)])),
            Arc::new(StringArray::from(vec![rfc3339(row.updated_at)])),
        ],
    )
    .map_err(DbError::from)
}

pub fn record_to_entity(batch: &RecordBatch, row: usize) -> Result<EntityRow> {
    Ok(EntityRow {
        id: Uuid::parse_str(&get_string(batch, 0, row)).map_err(|e| DbError::InvalidQuery(e.to_string()))?,
        entity_type: get_string(batch, 1, row),
        canonical_name: get_string(batch, 2, row),
        canonical_name_normalized: get_string(batch, 3, row),
        aliases: get_json(batch, 4, row)?,
        external_ids: get_json(batch, 5, row)?,
        ontology_refs: get_json(batch, 6, row)?,
        mention_count: get_i64(batch, 7, row),
        paper_count: get_i64(batch, 8, row),
        resolved: get_bool(batch, 9, row),
        created_at: parse_rfc3339(&get_string(batch, 10, row)),
        updated_at: parse_rfc3339(&get_string(batch, 11, row)),
    })
}

// ---------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------

pub fn relationship_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("subject_type", DataType::Utf8, false),
        Field::new("subject_key", DataType::Utf8, false),
        Field::new("predicate", DataType::Utf8, false),
        Field::new("object_type", DataType::Utf8, false),
        Field::new("object_key", DataType::Utf8, false),
        Field::new("headline_confidence", DataType::Float64, false),
        Field::new("evidence", DataType::Utf8, false),
        Field::new("created_at", DataType::Utf8, false),
        Field::new("updated_at", DataType::Utf8, false),
    ]))
}

pub fn relationship_to_record(row: &RelationshipRow) -> Result<RecordBatch> {
    RecordBatch::try_new(
        relationship_schema(),
        vec![
            Arc::new(StringArray::from(vec![row.id.to_string()])) as Arc<dyn Array>,
            Arc::new(StringArray::from(vec![row.subject_type.as_str()])),
            Arc::new(StringArray::from(vec![row.subject_key.as_str()])),
            Arc::new(StringArray::from(vec![row.predicate.as_str()])),
            Arc::new(StringArray::from(vec![row.object_type.as_str()])),
            Arc::new(StringArray::from(vec![row.object_key.as_str()])),
            Arc::new(Float64Array::from(vec![row.headline_confidence])),
            Arc::new(StringArray::from(vec![to_json(&row.evidence)?])),
            Arc::new(StringArray::from(vec![rfc3339(row.created_at)])),
            Arc::new(StringArray::from(vec![rfc3339(row.updated_at)])),
        ],
    )
    .map_err(DbError::from)
}

pub fn record_to_relationship(batch: &RecordBatch, row: usize) -> Result<RelationshipRow> {
    Ok(RelationshipRow {
        id: Uuid::parse_str(&get_string(batch, 0, row)).map_err(|e| DbError::InvalidQuery(e.to_string()))?,
        subject_type: get_string(batch, 1, row),
        subject_key: get_string(batch, 2, row),
        predicate: get_string(batch, 3, row),
        object_type: get_string(batch, 4, row),
        object_key: get_string(batch, 5, row),
        headline_confidence: get_f64(batch, 6, row),
        evidence: get_json(batch, 7, row)?,
        created_at: parse_rfc3339(&get_string(batch, 8, row)),
        updated_at: parse_rfc3339(&get_string(batch, 9, row)),
    })
}

// ---------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------

pub fn topic_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("topic_id", DataType::Int64, false),
        Field::new("keywords", DataType::Utf8, false),
        Field::new("coherence", DataType::Float64, false),
        Field::new("size", DataType::Int64, false),
        Field::new("created_at", DataType::Utf8, false),
    ]))
}

pub fn topic_to_record(row: &TopicRow) -> Result<RecordBatch> {
    RecordBatch::try_new(
        topic_schema(),
        vec![
            Arc::new(Int64Array::from(vec![row.topic_id as i64])) as Arc<dyn Array>,
            Arc::new(StringArray::from(vec![to_json(&row.keywords)?])),
            Arc::new(Float64Array::from(vec![row.coherence])),
            Arc::new(Int64Array::from(vec![row.size])),
            Arc::new(StringArray::from(vec![rfc3339(row.created_at)])),
        ],
    )
    .map_err(DbError::from)
}

pub fn record_to_topic(batch: &RecordBatch, row: usize) -> Result<TopicRow> {
    Ok(TopicRow {
        topic_id: get_i64(batch, 0, row) as i32,
        keywords: get_json(batch, 1, row)?,
        coherence: get_f64(batch, 2, row),
        size: get_i64(batch, 3, row),
        created_at: parse_rfc3339(&get_string(batch, 4, row)),
    })
}

// ---------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------

pub fn edge_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("source_key", DataType::Utf8, false),
        Field::new("edge_type", DataType::Utf8, false),
        Field::new("target_key", DataType::Utf8, false),
        Field::new("mention_count", DataType::Int64, true),
        Field::new("created_at", DataType::Utf8, false),
        Field::new("updated_at", DataType::Utf8, false),
    ]))
}

pub fn edge_to_record(row: &EdgeRow) -> Result<RecordBatch> {
    RecordBatch::try_new(
        edge_schema(),
        vec![
            Arc::new(StringArray::from(vec![row.id.to_string()])) as Arc<dyn Array>,
            Arc::new(StringArray::from(vec![row.source_key.as_str()])),
            Arc::new(StringArray::from(vec![row.edge_type.as_str()])),
            Arc::new(StringArray::from(vec![row.target_key.as_str()])),
            Arc::new(Int64Array::from(vec![row.mention_count])),
            Arc::new(StringArray::from(vec![rfc3339(row.created_at)])),
            Arc::new(StringArray::from(vec![rfc3339(row.updated_at)])),
        ],
    )
    .map_err(DbError::from)
}

pub fn record_to_edge(batch: &RecordBatch, row: usize) -> Result<EdgeRow> {
    Ok(EdgeRow {
        id: Uuid::parse_str(&get_string(batch, 0, row)).map_err(|e| DbError::InvalidQuery(e.to_string()))?,
        source_key: get_string(batch, 1, row),
        edge_type: get_string(batch, 2, row),
        target_key: get_string(batch, 3, row),
        mention_count: get_opt_i64(batch, 4, row),
        created_at: parse_rfc3339(&get_string(batch, 5, row)),
        updated_at: parse_rfc3339(&get_string(batch, 6, row)),
    })
}
