//! Edge repository: upsert-by-`(source_key, edge_type, target_key)`.

use crate::database::Database;
use crate::error::Result;
use crate::schema::{EdgeRow, TABLE_EDGES};
use crate::schema_arrow::{edge_schema, edge_to_record, record_to_edge};
use arrow_array::RecordBatchIterator;
use futures::TryStreamExt;

pub struct EdgeRepository<'a> {
    db: &'a Database,
}

impl<'a> EdgeRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn upsert_batch(&self, rows: &[EdgeRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let table = self.db.open_table(TABLE_EDGES).await?;
        let batches: std::result::Result<Vec<_>, _> = rows.iter().map(edge_to_record).collect();
        let batches = batches?;
        let reader = RecordBatchIterator::new(batches.into_iter().map(Ok), edge_schema());
        table
            .merge_insert(&["source_key", "edge_type", "target_key"])
            .when_matched_update_all(None)
            .when_not_matched_insert_all()
            .execute(Box::new(reader))
            .await?;
        Ok(())
    }

    pub async fn find_by_source(&self, source_key: &str) -> Result<Vec<EdgeRow>> {
        let table = self.db.open_table(TABLE_EDGES).await?;
        let filter = format!("source_key = '{}'", source_key.replace('\'', "''"));
        let batches: Vec<_> = table.query().only_if(filter).execute().await?.try_collect().await?;
        let mut out = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                out.push(record_to_edge(batch, row)?);
            }
        }
        Ok(out)
    }

    pub async fn count(&self) -> Result<usize> {
        let table = self.db.open_table(TABLE_EDGES).await?;
        Ok(table.count_rows(None).await?)
    }
}
