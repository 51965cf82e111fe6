//! Entity enrichment (§4.7, §4.8): the Resolver attaches external
//! identifiers to canonical Entities via cached, rate-limited, fan-out
//! lookups against type-appropriate registries; the Aligner attaches
//! ontology cross-references from a bundled term set. Both stages leave
//! entities unresolved/unmatched rather than fail the run.
//!
//! # Example
//!
//! ```rust,no_run
//! use sbkg_enrich::{Aligner, Resolver};
//! use sbkg_config::{AlignerConfig, ResolverConfig};
//!
//! # async fn run(mut entities: Vec<sbkg_common::CanonicalEntity>) {
//! let resolver = Resolver::new(ResolverConfig::default());
//! resolver.resolve_all(&mut entities).await;
//!
//! let aligner = Aligner::new(AlignerConfig::default());
//! aligner.align_all(&mut entities);
//! # }
//! ```

pub mod aligner;
pub mod cache;
pub mod canonicalize;
pub mod ontology_data;
pub mod resolver;
pub mod service;

pub use aligner::Aligner;
pub use canonicalize::canonicalize;
pub use resolver::{ResolvedRecord, Resolver};
pub use service::ServiceClient;
