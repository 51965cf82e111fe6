//! Connection lifecycle and table bootstrap for the LanceDB-backed graph store.

use crate::error::{DbError, Result};
use crate::schema::{TABLE_EDGES, TABLE_ENTITIES, TABLE_PAPERS, TABLE_RELATIONSHIPS, TABLE_TOPICS};
use crate::schema_arrow::{edge_schema, entity_schema, paper_schema, relationship_schema, topic_schema};
use arrow_array::RecordBatchIterator;
use lancedb::connection::Connection;
use tracing::{debug, info};

/// Owns the LanceDB connection used by every repository.
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

#[derive(Debug, Clone, Default)]
pub struct DatabaseStats {
    pub papers: usize,
    pub entities: usize,
    pub relationships: usize,
    pub topics: usize,
    pub edges: usize,
}

impl Database {
    pub async fn connect(uri: &str) -> Result<Self> {
        let conn = lancedb::connect(uri).execute().await?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Creates every table that doesn't already exist. Safe to call on every
    /// run (`build`/`init-db`); existing tables and their rows are untouched.
    pub async fn initialize(&self) -> Result<()> {
        self.ensure_table(TABLE_PAPERS, paper_schema()).await?;
        self.ensure_table(TABLE_ENTITIES, entity_schema()).await?;
        self.ensure_table(TABLE_RELATIONSHIPS, relationship_schema()).await?;
        self.ensure_table(TABLE_TOPICS, topic_schema()).await?;
        self.ensure_table(TABLE_EDGES, edge_schema()).await?;
        info!("graph store initialized");
        Ok(())
    }

    async fn ensure_table(&self, name: &str, schema: std::sync::Arc<arrow_schema::Schema>) -> Result<()> {
        if self.table_exists(name).await? {
            debug!(table = name, "table already exists");
            return Ok(());
        }
        let batches = RecordBatchIterator::new(std::iter::empty::<std::result::Result<_, arrow_schema::ArrowError>>(), schema.clone());
        self.conn.create_table(name, Box::new(batches)).execute().await?;
        debug!(table = name, "table created");
        Ok(())
    }

    pub async fn table_exists(&self, name: &str) -> Result<bool> {
        let names = self.conn.table_names().execute().await?;
        Ok(names.iter().any(|n| n == name))
    }

    pub async fn open_table(&self, name: &str) -> Result<lancedb::Table> {
        self.conn
            .open_table(name)
            .execute()
            .await
            .map_err(|e| match e {
                lancedb::Error::TableNotFound { .. } => DbError::TableNotFound(name.to_string()),
                other => DbError::from(other),
            })
    }

    pub async fn stats(&self) -> Result<DatabaseStats> {
        Ok(DatabaseStats {
            papers: self.count_rows(TABLE_PAPERS).await?,
            entities: self.count_rows(TABLE_ENTITIES).await?,
            relationships: self.count_rows(TABLE_RELATIONSHIPS).await?,
            topics: self.count_rows(TABLE_TOPICS).await?,
            edges: self.count_rows(TABLE_EDGES).await?,
        })
    }

    async fn count_rows(&self, name: &str) -> Result<usize> {
        if !self.table_exists(name).await? {
            return Ok(0);
        }
        let table = self.open_table(name).await?;
        Ok(table.count_rows(None).await?)
    }

    pub async fn optimize(&self) -> Result<()> {
        for name in [TABLE_PAPERS, TABLE_ENTITIES, TABLE_RELATIONSHIPS, TABLE_TOPICS, TABLE_EDGES] {
            if !self.table_exists(name).await? {
                continue;
            }
            let table = self.open_table(name).await?;
            table.optimize(lancedb::table::OptimizeAction::All).await?;
        }
        Ok(())
    }
}
