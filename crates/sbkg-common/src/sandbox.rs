use crate::error::SbkgError;
use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// A capability-capped HTTP client: only requests to an approved set of
/// hostnames are allowed. Acquirer and Resolver adapters are built on top
/// of this instead of a bare `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    pub fn new(timeout: Duration) -> Result<Self, SbkgError> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .build()
            .map_err(SbkgError::Http)?;
        Ok(Self { client, allowlist: HashSet::new() })
    }

    /// Allowlist used by the Acquirer's literature and secondary-source
    /// adapters.
    pub fn with_literature_allowlist(timeout: Duration) -> Result<Self, SbkgError> {
        let mut client = Self::new(timeout)?;
        for d in [
            "eutils.ncbi.nlm.nih.gov",
            "www.ebi.ac.uk",
            "api.biorxiv.org",
            "api.crossref.org",
            "huggingface.co",
            "cdn-lfs.huggingface.co",
        ] {
            client.allow_domain(d);
        }
        Ok(client)
    }

    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else { return false };
        let Some(host) = parsed.host_str() else { return false };
        self.allowlist
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{allowed}")))
    }

    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, SbkgError> {
        self.check(url)?;
        Ok(self.client.get(url))
    }

    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, SbkgError> {
        self.check(url)?;
        Ok(self.client.post(url))
    }

    fn check(&self, url: &str) -> Result<(), SbkgError> {
        if !self.is_allowed(url) {
            return Err(SbkgError::ExternalService(format!(
                "network capability denied: {url} is not in the sandbox allowlist"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unlisted_domain() {
        let client = SandboxClient::new(Duration::from_secs(5)).unwrap();
        assert!(!client.is_allowed("https://evil.example.com/x"));
    }

    #[test]
    fn allows_subdomains() {
        let mut client = SandboxClient::new(Duration::from_secs(5)).unwrap();
        client.allow_domain("ebi.ac.uk");
        assert!(client.is_allowed("https://www.ebi.ac.uk/chembl"));
    }
}
