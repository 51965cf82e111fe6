//! Resolver (§4.7): enriches canonical Entities with external identifiers,
//! gated by a TTL cache, an offline mode, bounded fan-out, and per-service
//! token-bucket rate limits. Resolver failures are never fatal — unresolved
//! entities continue with `resolved = false`.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use sbkg_common::rate_limit::{self, SharedLimiter};
use sbkg_common::{normalize_key, CanonicalEntity, EntityType};
use sbkg_config::{ResolverConfig, ResolverService as ResolverServiceKind};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::warn;

use crate::cache::ResolverCache;
use crate::service::{ChemicalService, GeneProteinService, ServiceClient, TaxonomyService};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedRecord {
    pub canonical_name: String,
    pub primary_id: String,
    pub secondary_ids: Vec<String>,
    pub source: String,
}

fn service_kind_for(entity_type: EntityType) -> Option<ResolverServiceKind> {
    match entity_type {
        EntityType::Gene => Some(ResolverServiceKind::GeneService),
        EntityType::Protein => Some(ResolverServiceKind::ProteinService),
        EntityType::Organism => Some(ResolverServiceKind::TaxonomyService),
        EntityType::Chemical => Some(ResolverServiceKind::ChemicalService),
        _ => None,
    }
}

pub struct Resolver {
    config: ResolverConfig,
    cache: Mutex<ResolverCache>,
    gene_protein: GeneProteinService,
    taxonomy: TaxonomyService,
    chemical: ChemicalService,
    limiters: std::collections::HashMap<ResolverServiceKind, SharedLimiter>,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        let mut limiters = std::collections::HashMap::new();
        for kind in [
            ResolverServiceKind::GeneService,
            ResolverServiceKind::ProteinService,
            ResolverServiceKind::TaxonomyService,
            ResolverServiceKind::ChemicalService,
        ] {
            limiters.insert(kind, rate_limit::per_second(3));
        }
        Self {
            cache: Mutex::new(ResolverCache::new(config.cache_ttl_s)),
            gene_protein: GeneProteinService::new(),
            taxonomy: TaxonomyService::new(),
            chemical: ChemicalService::new(),
            limiters,
            config,
        }
    }

    /// Resolves every entity up to the configured fan-out, mutating each
    /// in place. Never returns `Err` for individual resolution failures.
    pub async fn resolve_all(&self, entities: &mut [CanonicalEntity]) {
        let fanout = self.config.fanout.max(1);
        let results: Vec<Option<ResolvedRecord>> = stream::iter(entities.iter())
            .map(|entity| self.resolve_one(entity))
            .buffer_unordered(fanout)
            .collect()
            .await;

        for (entity, resolved) in entities.iter_mut().zip(results) {
            apply_resolution(entity, resolved);
        }
    }

    async fn resolve_one(&self, entity: &CanonicalEntity) -> Option<ResolvedRecord> {
        let Some(service_kind) = service_kind_for(entity.entity_type) else {
            return None;
        };

        if let Some(cached) = self.cache.lock().await.get(entity.entity_type, &entity.canonical_name_normalized) {
            return Some(cached);
        }

        if self.config.offline_mode {
            return None;
        }
        if !self.config.services_enabled.contains(&service_kind) {
            return None;
        }

        let limiter = self.limiters.get(&service_kind).cloned();
        let record = self.call_with_retry(service_kind, &entity.canonical_name, limiter).await;

        if let Some(record) = &record {
            if normalize_key(&record.canonical_name) == entity.canonical_name_normalized {
                self.cache.lock().await.insert(entity.entity_type, &entity.canonical_name_normalized, record.clone());
                return Some(record.clone());
            }
        }
        None
    }

    async fn call_with_retry(&self, kind: ResolverServiceKind, query: &str, limiter: Option<SharedLimiter>) -> Option<ResolvedRecord> {
        for attempt in 0..2 {
            if let Some(limiter) = &limiter {
                rate_limit::acquire(limiter).await;
            }
            let timeout = Duration::from_millis(self.config.per_entity_timeout_ms);
            let outcome = tokio::time::timeout(timeout, self.call_service(kind, query)).await;
            match outcome {
                Ok(Ok(Some(record))) => return Some(record),
                Ok(Ok(None)) => return None,
                Ok(Err(e)) if attempt == 0 => {
                    warn!(service = ?kind, error = %e, "transient resolver failure, retrying once");
                    continue;
                }
                Ok(Err(e)) => {
                    warn!(service = ?kind, error = %e, "resolver call failed permanently, leaving unresolved");
                    return None;
                }
                Err(_) if attempt == 0 => {
                    warn!(service = ?kind, "resolver call timed out, retrying once");
                    continue;
                }
                Err(_) => {
                    warn!(service = ?kind, "resolver call timed out twice, leaving unresolved");
                    return None;
                }
            }
        }
        None
    }

    async fn call_service(&self, kind: ResolverServiceKind, query: &str) -> anyhow::Result<Option<ResolvedRecord>> {
        match kind {
            ResolverServiceKind::GeneService | ResolverServiceKind::ProteinService => self.gene_protein.lookup(query).await,
            ResolverServiceKind::TaxonomyService => self.taxonomy.lookup(query).await,
            ResolverServiceKind::ChemicalService => self.chemical.lookup(query).await,
        }
    }
}

fn apply_resolution(entity: &mut CanonicalEntity, resolved: Option<ResolvedRecord>) {
    let Some(record) = resolved else {
        return;
    };
    if record.canonical_name != entity.canonical_name {
        entity.aliases.insert(entity.canonical_name.clone());
        entity.canonical_name = record.canonical_name.clone();
        entity.canonical_name_normalized = normalize_key(&record.canonical_name);
    }
    entity.external_ids.insert(record.source.clone(), record.primary_id.clone());
    for (i, secondary) in record.secondary_ids.iter().enumerate() {
        entity.external_ids.insert(format!("{}_alt{}", record.source, i), secondary.clone());
    }
    entity.resolved = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(entity_type: EntityType, name: &str) -> CanonicalEntity {
        CanonicalEntity {
            entity_type,
            canonical_name: name.to_string(),
            canonical_name_normalized: normalize_key(name),
            aliases: Default::default(),
            external_ids: Default::default(),
            ontology_refs: Vec::new(),
            mention_count: 1,
            paper_count: 1,
            resolved: false,
        }
    }

    #[tokio::test]
    async fn offline_mode_never_fails_and_leaves_unresolved() {
        let mut config = ResolverConfig::default();
        config.offline_mode = true;
        let resolver = Resolver::new(config);
        let mut entities = vec![entity(EntityType::Gene, "FOXO3")];
        resolver.resolve_all(&mut entities).await;
        assert!(!entities[0].resolved);
    }

    #[test]
    fn non_resolvable_type_is_skipped() {
        assert!(service_kind_for(EntityType::Disease).is_none());
    }

    #[test]
    fn apply_resolution_records_alias_and_ids() {
        let mut e = entity(EntityType::Gene, "foxo3 gene");
        let record = ResolvedRecord { canonical_name: "FOXO3".into(), primary_id: "2309".into(), secondary_ids: vec!["ENSG00000118689".into()], source: "gene_service".into() };
        apply_resolution(&mut e, Some(record));
        assert!(e.resolved);
        assert!(e.aliases.contains("foxo3 gene"));
        assert_eq!(e.canonical_name, "FOXO3");
        assert_eq!(e.external_ids.get("gene_service"), Some(&"2309".to_string()));
    }
}
