//! Graph storage layer.
//!
//! LanceDB-backed, embedded (no external database server) storage for the
//! five node/edge tables the pipeline produces: papers, entities,
//! relationships, topics, and a generic edge table (§4.9, §6.6). Complex
//! fields are JSON-encoded into `Utf8` columns rather than modeled as native
//! Arrow List/Struct types, keeping the schema-building code a flat list of
//! columns per table.

pub mod arrow_util;
pub mod database;
pub mod edges;
pub mod entities;
pub mod error;
pub mod papers;
pub mod relationships;
pub mod schema;
pub mod schema_arrow;
pub mod topics;

pub use database::{Database, DatabaseStats};
pub use edges::EdgeRepository;
pub use entities::EntityRepository;
pub use error::{DbError, Result};
pub use papers::PaperRepository;
pub use relationships::RelationshipRepository;
pub use schema::{
    EdgeRow, EntityRow, EvidenceRecord, OntologyRef, PaperRow, RelationshipRow, TopicRow,
    EDGE_HAS_TOPIC, EDGE_MENTIONS, EDGE_STUDIED_IN, TABLE_EDGES, TABLE_ENTITIES, TABLE_PAPERS,
    TABLE_RELATIONSHIPS, TABLE_TOPICS,
};
pub use topics::TopicRepository;
