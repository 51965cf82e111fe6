//! Entity repository: upsert-by-`(entity_type, canonical_name_normalized)`.

use crate::database::Database;
use crate::error::Result;
use crate::schema::{EntityRow, TABLE_ENTITIES};
use crate::schema_arrow::{entity_schema, entity_to_record, record_to_entity};
use arrow_array::RecordBatchIterator;
use futures::TryStreamExt;

pub struct EntityRepository<'a> {
    db: &'a Database,
}

impl<'a> EntityRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn upsert(&self, row: &EntityRow) -> Result<()> {
        self.upsert_batch(std::slice::from_ref(row)).await
    }

    /// Batched upsert keyed on the entity's natural key, mirroring the
    /// graph loader's per-stage batching (§6.4).
    pub async fn upsert_batch(&self, rows: &[EntityRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let table = self.db.open_table(TABLE_ENTITIES).await?;
        let batches: std::result::Result<Vec<_>, _> = rows.iter().map(entity_to_record).collect();
        let batches = batches?;
        let reader = RecordBatchIterator::new(batches.into_iter().map(Ok), entity_schema());
        table
            .merge_insert(&["entity_type", "canonical_name_normalized"])
            .when_matched_update_all(None)
            .when_not_matched_insert_all()
            .execute(Box::new(reader))
            .await?;
        Ok(())
    }

    pub async fn find_by_key(&self, entity_type: &str, canonical_name_normalized: &str) -> Result<Option<EntityRow>> {
        let table = self.db.open_table(TABLE_ENTITIES).await?;
        let filter = format!(
            "entity_type = '{}' AND canonical_name_normalized = '{}'",
            entity_type.replace('\'', "''"),
            canonical_name_normalized.replace('\'', "''"),
        );
        let batches: Vec<_> = table.query().only_if(filter).limit(1).execute().await?.try_collect().await?;
        for batch in &batches {
            if batch.num_rows() > 0 {
                return Ok(Some(record_to_entity(batch, 0)?));
            }
        }
        Ok(None)
    }

    pub async fn find_by_type(&self, entity_type: &str) -> Result<Vec<EntityRow>> {
        let table = self.db.open_table(TABLE_ENTITIES).await?;
        let filter = format!("entity_type = '{}'", entity_type.replace('\'', "''"));
        let batches: Vec<_> = table.query().only_if(filter).execute().await?.try_collect().await?;
        let mut out = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                out.push(record_to_entity(batch, row)?);
            }
        }
        Ok(out)
    }

    pub async fn count(&self) -> Result<usize> {
        let table = self.db.open_table(TABLE_ENTITIES).await?;
        Ok(table.count_rows(None).await?)
    }
}
