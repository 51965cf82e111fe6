//! Topic modelling (§4.6): embed paper text with a biomedical sentence
//! embedder, reduce dimensionality, cluster, and label the resulting
//! topics with class-based TF-IDF keywords and NPMI coherence.
//!
//! # Example
//! ```rust,no_run
//! use sbkg_topic::{BiomedBertEmbedder, EmbeddingConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let embedder = BiomedBertEmbedder::new(EmbeddingConfig::default()).await?;
//!     let texts = vec!["Microgravity induces bone loss in mice.".to_string()];
//!     let embeddings = embedder.embed(&texts).await?;
//!     println!("Embedding dimension: {}", embeddings[0].len());
//!     Ok(())
//! }
//! ```

pub mod cluster;
pub mod coherence;
pub mod config;
pub mod embedder;
pub mod error;
pub mod label;
pub mod pipeline;
pub mod pooling;
pub mod reduce;

pub use config::EmbeddingConfig;
pub use embedder::BiomedBertEmbedder;
pub use error::{Result, TopicError};
pub use pipeline::{run_topic_model, TopicAssignment, TopicModelOutput};
pub use pooling::PoolingStrategy;
