//! sbkg-common — Shared types, errors, and traits used across the SB-KG pipeline crates.

pub mod artifact;
pub mod domain;
pub mod error;
pub mod logging;
pub mod rate_limit;
pub mod sandbox;

pub use artifact::{
    CanonicalEntity, Evidence, Mention, OntologyMatch, Paper, RelationshipCandidate, Sentence,
    Token, Topic,
};
pub use domain::{normalize_key, EntityType, Predicate};
pub use error::{ErrorKind, RejectedRecord, SbkgError, Result};
