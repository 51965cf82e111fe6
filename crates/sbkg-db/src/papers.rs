//! Paper repository: upsert-by-`literature_id` and point lookups.

use crate::database::Database;
use crate::error::Result;
use crate::schema::{PaperRow, TABLE_PAPERS};
use crate::schema_arrow::{paper_schema, paper_to_record, record_to_paper};
use arrow_array::RecordBatchIterator;
use futures::TryStreamExt;

pub struct PaperRepository<'a> {
    db: &'a Database,
}

impl<'a> PaperRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Idempotent upsert keyed on `literature_id` (§4.9 natural-key upsert).
    pub async fn upsert(&self, row: &PaperRow) -> Result<()> {
        let table = self.db.open_table(TABLE_PAPERS).await?;
        let batch = paper_to_record(row)?;
        let reader = RecordBatchIterator::new(vec![Ok(batch)], paper_schema());
        table
            .merge_insert(&["literature_id"])
            .when_matched_update_all(None)
            .when_not_matched_insert_all()
            .execute(Box::new(reader))
            .await?;
        Ok(())
    }

    pub async fn find_by_literature_id(&self, literature_id: &str) -> Result<Option<PaperRow>> {
        let table = self.db.open_table(TABLE_PAPERS).await?;
        let filter = format!("literature_id = '{}'", literature_id.replace('\'', "''"));
        let batches: Vec<_> = table
            .query()
            .only_if(filter)
            .limit(1)
            .execute()
            .await?
            .try_collect()
            .await?;
        for batch in &batches {
            if batch.num_rows() > 0 {
                return Ok(Some(record_to_paper(batch, 0)?));
            }
        }
        Ok(None)
    }

    pub async fn count(&self) -> Result<usize> {
        let table = self.db.open_table(TABLE_PAPERS).await?;
        Ok(table.count_rows(None).await?)
    }
}
