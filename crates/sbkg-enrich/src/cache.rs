//! TTL-bounded resolver cache (§4.7 step 1), keyed by
//! (EntityType, normalized_key).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use sbkg_common::EntityType;

use crate::resolver::ResolvedRecord;

pub struct ResolverCache {
    entries: HashMap<(EntityType, String), (Instant, ResolvedRecord)>,
    ttl: Duration,
}

impl ResolverCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self { entries: HashMap::new(), ttl: Duration::from_secs(ttl_seconds) }
    }

    pub fn get(&self, entity_type: EntityType, normalized_key: &str) -> Option<ResolvedRecord> {
        self.entries.get(&(entity_type, normalized_key.to_string())).and_then(|(inserted, record)| {
            if inserted.elapsed() < self.ttl {
                Some(record.clone())
            } else {
                None
            }
        })
    }

    pub fn insert(&mut self, entity_type: EntityType, normalized_key: &str, record: ResolvedRecord) {
        self.entries.insert((entity_type, normalized_key.to_string()), (Instant::now(), record));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ResolvedRecord {
        ResolvedRecord { canonical_name: "FOXO3".into(), primary_id: "ENSG00000118689".into(), secondary_ids: vec![], source: "gene_service".into() }
    }

    #[test]
    fn fresh_entry_is_returned() {
        let mut cache = ResolverCache::new(60);
        cache.insert(EntityType::Gene, "foxo3", record());
        assert!(cache.get(EntityType::Gene, "foxo3").is_some());
    }

    #[test]
    fn expired_entry_is_not_returned() {
        let mut cache = ResolverCache::new(0);
        cache.insert(EntityType::Gene, "foxo3", record());
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(EntityType::Gene, "foxo3").is_none());
    }
}
