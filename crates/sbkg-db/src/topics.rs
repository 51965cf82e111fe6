//! Topic repository: upsert-by-`topic_id`.

use crate::database::Database;
use crate::error::Result;
use crate::schema::{TopicRow, TABLE_TOPICS};
use crate::schema_arrow::{record_to_topic, topic_schema, topic_to_record};
use arrow_array::RecordBatchIterator;
use futures::TryStreamExt;

pub struct TopicRepository<'a> {
    db: &'a Database,
}

impl<'a> TopicRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn upsert_batch(&self, rows: &[TopicRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let table = self.db.open_table(TABLE_TOPICS).await?;
        let batches: std::result::Result<Vec<_>, _> = rows.iter().map(topic_to_record).collect();
        let batches = batches?;
        let reader = RecordBatchIterator::new(batches.into_iter().map(Ok), topic_schema());
        table
            .merge_insert(&["topic_id"])
            .when_matched_update_all(None)
            .when_not_matched_insert_all()
            .execute(Box::new(reader))
            .await?;
        Ok(())
    }

    pub async fn all(&self) -> Result<Vec<TopicRow>> {
        let table = self.db.open_table(TABLE_TOPICS).await?;
        let batches: Vec<_> = table.query().execute().await?.try_collect().await?;
        let mut out = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                out.push(record_to_topic(batch, row)?);
            }
        }
        Ok(out)
    }

    pub async fn count(&self) -> Result<usize> {
        let table = self.db.open_table(TABLE_TOPICS).await?;
        Ok(table.count_rows(None).await?)
    }
}
