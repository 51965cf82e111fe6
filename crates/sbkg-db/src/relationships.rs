//! Relationship repository: upsert-by-`(subject_key, predicate, object_key)`.
//!
//! Merging an existing relationship with a newly extracted one is the
//! loader's job (evidence-list union, headline confidence recompute, §6.6);
//! this repository only persists whatever row it is handed.

use crate::database::Database;
use crate::error::Result;
use crate::schema::{RelationshipRow, TABLE_RELATIONSHIPS};
use crate::schema_arrow::{record_to_relationship, relationship_schema, relationship_to_record};
use arrow_array::RecordBatchIterator;
use futures::TryStreamExt;

pub struct RelationshipRepository<'a> {
    db: &'a Database,
}

impl<'a> RelationshipRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn upsert_batch(&self, rows: &[RelationshipRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let table = self.db.open_table(TABLE_RELATIONSHIPS).await?;
        let batches: std::result::Result<Vec<_>, _> = rows.iter().map(relationship_to_record).collect();
        let batches = batches?;
        let reader = RecordBatchIterator::new(batches.into_iter().map(Ok), relationship_schema());
        table
            .merge_insert(&["subject_key", "predicate", "object_key"])
            .when_matched_update_all(None)
            .when_not_matched_insert_all()
            .execute(Box::new(reader))
            .await?;
        Ok(())
    }

    pub async fn find_by_key(&self, subject_key: &str, predicate: &str, object_key: &str) -> Result<Option<RelationshipRow>> {
        let table = self.db.open_table(TABLE_RELATIONSHIPS).await?;
        let filter = format!(
            "subject_key = '{}' AND predicate = '{}' AND object_key = '{}'",
            subject_key.replace('\'', "''"),
            predicate.replace('\'', "''"),
            object_key.replace('\'', "''"),
        );
        let batches: Vec<_> = table.query().only_if(filter).limit(1).execute().await?.try_collect().await?;
        for batch in &batches {
            if batch.num_rows() > 0 {
                return Ok(Some(record_to_relationship(batch, 0)?));
            }
        }
        Ok(None)
    }

    pub async fn find_by_subject(&self, subject_key: &str) -> Result<Vec<RelationshipRow>> {
        let table = self.db.open_table(TABLE_RELATIONSHIPS).await?;
        let filter = format!("subject_key = '{}'", subject_key.replace('\'', "''"));
        let batches: Vec<_> = table.query().only_if(filter).execute().await?.try_collect().await?;
        let mut out = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                out.push(record_to_relationship(batch, row)?);
            }
        }
        Ok(out)
    }

    pub async fn count(&self) -> Result<usize> {
        let table = self.db.open_table(TABLE_RELATIONSHIPS).await?;
        Ok(table.count_rows(None).await?)
    }
}
