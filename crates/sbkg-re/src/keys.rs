//! Pre-resolution natural keys for relationship endpoints, shaped the same
//! way `CanonicalEntity::key()` is: `"{entity_type}::{normalized_key}"`. The
//! resolver stage reconciles these into stable entity identities later.

use sbkg_common::Mention;

pub fn mention_key(mention: &Mention) -> String {
    format!("{}::{}", mention.entity_type, mention.normalized_key)
}
