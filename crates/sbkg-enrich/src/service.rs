//! Per-type service adapters behind one capability interface (§4.7): the
//! Resolver drives them uniformly, oblivious to which public registry a
//! given `EntityType` actually maps to.

use std::time::Duration;

use async_trait::async_trait;
use sbkg_common::sandbox::SandboxClient as Client;

use crate::resolver::ResolvedRecord;

const SERVICE_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait ServiceClient: Send + Sync {
    /// Looks up `query` in the backing registry. `Ok(None)` means "not
    /// found" (not an error); `Err` means a transient or permanent failure.
    async fn lookup(&self, query: &str) -> anyhow::Result<Option<ResolvedRecord>>;
}

/// Gene/protein registry lookup via MyGene.info.
pub struct GeneProteinService {
    client: Client,
}

impl GeneProteinService {
    pub fn new() -> Self {
        let mut client = Client::new(SERVICE_TIMEOUT).expect("sandboxed client builds with a fixed timeout");
        client.allow_domain("mygene.info");
        Self { client }
    }
}

impl Default for GeneProteinService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceClient for GeneProteinService {
    async fn lookup(&self, query: &str) -> anyhow::Result<Option<ResolvedRecord>> {
        let url = format!("https://mygene.info/v3/query?q=symbol:{query}&species=human&fields=symbol,name,entrezgene");
        let response = self.client.get(&url)?.send().await?.error_for_status()?;
        let body: serde_json::Value = response.json().await?;
        let Some(hit) = body.get("hits").and_then(|h| h.as_array()).and_then(|a| a.first()) else {
            return Ok(None);
        };
        let Some(symbol) = hit.get("symbol").and_then(|v| v.as_str()) else {
            return Ok(None);
        };
        let primary_id = hit.get("entrezgene").map(|v| v.to_string()).unwrap_or_else(|| symbol.to_string());
        Ok(Some(ResolvedRecord {
            canonical_name: symbol.to_string(),
            primary_id,
            secondary_ids: Vec::new(),
            source: "gene_service".to_string(),
        }))
    }
}

/// Taxonomy lookup via GBIF's species-match endpoint.
pub struct TaxonomyService {
    client: Client,
}

impl TaxonomyService {
    pub fn new() -> Self {
        let mut client = Client::new(SERVICE_TIMEOUT).expect("sandboxed client builds with a fixed timeout");
        client.allow_domain("api.gbif.org");
        Self { client }
    }
}

impl Default for TaxonomyService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceClient for TaxonomyService {
    async fn lookup(&self, query: &str) -> anyhow::Result<Option<ResolvedRecord>> {
        let url = format!("https://api.gbif.org/v1/species/match?name={query}");
        let response = self.client.get(&url)?.send().await?.error_for_status()?;
        let body: serde_json::Value = response.json().await?;
        let Some(name) = body.get("canonicalName").and_then(|v| v.as_str()) else {
            return Ok(None);
        };
        let Some(key) = body.get("usageKey").and_then(|v| v.as_u64()) else {
            return Ok(None);
        };
        Ok(Some(ResolvedRecord {
            canonical_name: name.to_string(),
            primary_id: key.to_string(),
            secondary_ids: Vec::new(),
            source: "taxonomy_service".to_string(),
        }))
    }
}

/// Chemical compound lookup via PubChem's PUG REST API.
pub struct ChemicalService {
    client: Client,
}

impl ChemicalService {
    pub fn new() -> Self {
        let mut client = Client::new(SERVICE_TIMEOUT).expect("sandboxed client builds with a fixed timeout");
        client.allow_domain("pubchem.ncbi.nlm.nih.gov");
        Self { client }
    }
}

impl Default for ChemicalService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceClient for ChemicalService {
    async fn lookup(&self, query: &str) -> anyhow::Result<Option<ResolvedRecord>> {
        let url = format!("https://pubchem.ncbi.nlm.nih.gov/rest/pug/compound/name/{query}/property/IUPACName/JSON");
        let response = self.client.get(&url)?.send().await?.error_for_status()?;
        let body: serde_json::Value = response.json().await?;
        let Some(props) = body.get("PropertyTable").and_then(|t| t.get("Properties")).and_then(|p| p.as_array()).and_then(|a| a.first()) else {
            return Ok(None);
        };
        let Some(cid) = props.get("CID").and_then(|v| v.as_u64()) else {
            return Ok(None);
        };
        let name = props.get("IUPACName").and_then(|v| v.as_str()).unwrap_or(query).to_string();
        Ok(Some(ResolvedRecord {
            canonical_name: name,
            primary_id: cid.to_string(),
            secondary_ids: Vec::new(),
            source: "chemical_service".to_string(),
        }))
    }
}
