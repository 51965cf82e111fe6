//! Typed, validated pipeline configuration (§4.1).
//!
//! Populated from defaults → a sectioned TOML file → environment overrides
//! (`<SECTION>_<KEY>` upper-snake-case, §6.1). Invalid configurations fail
//! fast with [`SbkgError::Config`] naming the offending key.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use sbkg_common::error::SbkgError;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub ner: NerConfig,
    #[serde(default)]
    pub re: ReConfig,
    #[serde(default)]
    pub topic: TopicConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub aligner: AlignerConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

// ---------------------------------------------------------------------
// Acquisition
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    #[serde(default = "default_true")]
    pub curated_enabled: bool,
    #[serde(default)]
    pub literature_enabled: bool,
    #[serde(default)]
    pub literature_contact_email: Option<String>,
    #[serde(default, skip_serializing)]
    pub literature_api_key: Option<SecretString>,
    #[serde(default = "default_max_papers")]
    pub max_papers: usize,
    #[serde(default)]
    pub search_terms: Vec<String>,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub secondary_sources: HashSet<String>,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            curated_enabled: true,
            literature_enabled: false,
            literature_contact_email: None,
            literature_api_key: None,
            max_papers: default_max_papers(),
            search_terms: Vec::new(),
            date_range: DateRange::default(),
            secondary_sources: HashSet::new(),
            retry_count: default_retry_count(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

fn default_max_papers() -> usize {
    1000
}
fn default_retry_count() -> u32 {
    3
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    #[serde(default = "default_min_sentence_length")]
    pub min_sentence_length: usize,
    #[serde(default = "default_true")]
    pub remove_citation_markers: bool,
    #[serde(default = "default_true")]
    pub lemmatize: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            min_sentence_length: default_min_sentence_length(),
            remove_citation_markers: true,
            lemmatize: true,
        }
    }
}

fn default_min_sentence_length() -> usize {
    10
}

// ---------------------------------------------------------------------
// NER
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NerModelKind {
    TransformerScientific,
    DictionaryBiomedical,
    PatternsSpaceBiology,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Device {
    Cpu,
    GpuIfAvailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NerConfig {
    #[serde(default = "default_ner_models")]
    pub models_enabled: HashSet<NerModelKind>,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_device")]
    pub device: Device,
}

impl Default for NerConfig {
    fn default() -> Self {
        Self {
            models_enabled: default_ner_models(),
            min_confidence: default_min_confidence(),
            batch_size: default_batch_size(),
            device: default_device(),
        }
    }
}

fn default_ner_models() -> HashSet<NerModelKind> {
    [
        NerModelKind::TransformerScientific,
        NerModelKind::DictionaryBiomedical,
        NerModelKind::PatternsSpaceBiology,
    ]
    .into_iter()
    .collect()
}
fn default_min_confidence() -> f64 {
    0.5
}
fn default_batch_size() -> usize {
    16
}
fn default_device() -> Device {
    Device::Cpu
}

// ---------------------------------------------------------------------
// RE
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReConfig {
    #[serde(default = "default_true")]
    pub dependency_enabled: bool,
    #[serde(default = "default_true")]
    pub patterns_enabled: bool,
    #[serde(default = "default_true")]
    pub cooccurrence_enabled: bool,
    #[serde(default = "default_cooccurrence_window")]
    pub cooccurrence_window_sentences: usize,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

impl Default for ReConfig {
    fn default() -> Self {
        Self {
            dependency_enabled: true,
            patterns_enabled: true,
            cooccurrence_enabled: true,
            cooccurrence_window_sentences: default_cooccurrence_window(),
            min_confidence: default_min_confidence(),
        }
    }
}

fn default_cooccurrence_window() -> usize {
    1
}

// ---------------------------------------------------------------------
// Topic
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UmapParams {
    #[serde(default = "default_umap_neighbors")]
    pub n_neighbors: usize,
    #[serde(default = "default_umap_components")]
    pub n_components: usize,
}
impl Default for UmapParams {
    fn default() -> Self {
        Self { n_neighbors: default_umap_neighbors(), n_components: default_umap_components() }
    }
}
fn default_umap_neighbors() -> usize {
    15
}
fn default_umap_components() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HdbscanParams {
    #[serde(default)]
    pub min_samples: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    #[serde(default = "default_min_topic_size")]
    pub min_topic_size: usize,
    #[serde(default = "default_embedding_model_tag")]
    pub embedding_model_tag: String,
    #[serde(default)]
    pub umap_params: UmapParams,
    #[serde(default)]
    pub hdbscan_params: HdbscanParams,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            min_topic_size: default_min_topic_size(),
            embedding_model_tag: default_embedding_model_tag(),
            umap_params: UmapParams::default(),
            hdbscan_params: HdbscanParams { min_samples: None },
            seed: default_seed(),
        }
    }
}

fn default_min_topic_size() -> usize {
    10
}
fn default_embedding_model_tag() -> String {
    "pritamdeka/BioBERT-mnli-snli-scinli-scitail-mednli-stsb".to_string()
}
fn default_seed() -> u64 {
    42
}

// ---------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverService {
    GeneService,
    ProteinService,
    TaxonomyService,
    ChemicalService,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_resolver_services")]
    pub services_enabled: HashSet<ResolverService>,
    #[serde(default = "default_per_entity_timeout_ms")]
    pub per_entity_timeout_ms: u64,
    #[serde(default = "default_cache_ttl_s")]
    pub cache_ttl_s: u64,
    #[serde(default)]
    pub offline_mode: bool,
    #[serde(default = "default_resolver_fanout")]
    pub fanout: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            services_enabled: default_resolver_services(),
            per_entity_timeout_ms: default_per_entity_timeout_ms(),
            cache_ttl_s: default_cache_ttl_s(),
            offline_mode: false,
            fanout: default_resolver_fanout(),
        }
    }
}

fn default_resolver_services() -> HashSet<ResolverService> {
    [
        ResolverService::GeneService,
        ResolverService::ProteinService,
        ResolverService::TaxonomyService,
        ResolverService::ChemicalService,
    ]
    .into_iter()
    .collect()
}
fn default_per_entity_timeout_ms() -> u64 {
    2000
}
fn default_cache_ttl_s() -> u64 {
    86_400
}
fn default_resolver_fanout() -> usize {
    8
}

// ---------------------------------------------------------------------
// Aligner
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Ontology {
    Go,
    Hpo,
    Mondo,
    Envo,
    Cl,
    Uberon,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignerConfig {
    #[serde(default = "default_ontologies")]
    pub ontologies_enabled: HashSet<Ontology>,
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self { ontologies_enabled: default_ontologies(), match_threshold: default_match_threshold() }
    }
}

fn default_ontologies() -> HashSet<Ontology> {
    [Ontology::Go, Ontology::Hpo, Ontology::Mondo, Ontology::Envo, Ontology::Cl, Ontology::Uberon]
        .into_iter()
        .collect()
}
fn default_match_threshold() -> f64 {
    0.8
}

// ---------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphMode {
    Merge,
    Replace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_graph_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<SecretString>,
    #[serde(default = "default_graph_database")]
    pub database: String,
    #[serde(default = "default_graph_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_graph_mode")]
    pub mode: GraphMode,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            endpoint: default_graph_endpoint(),
            user: None,
            password: None,
            database: default_graph_database(),
            batch_size: default_graph_batch_size(),
            mode: default_graph_mode(),
        }
    }
}

fn default_graph_endpoint() -> String {
    "./sbkg_data/graph.lance".to_string()
}
fn default_graph_database() -> String {
    "sbkg".to_string()
}
fn default_graph_batch_size() -> usize {
    500
}
fn default_graph_mode() -> GraphMode {
    GraphMode::Merge
}

// ---------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Acquire,
    Preprocess,
    Ner,
    Re,
    Topic,
    Resolve,
    Align,
    Load,
}

impl Stage {
    pub fn ordered() -> [Stage; 8] {
        [
            Stage::Acquire,
            Stage::Preprocess,
            Stage::Ner,
            Stage::Re,
            Stage::Topic,
            Stage::Resolve,
            Stage::Align,
            Stage::Load,
        ]
    }

    pub fn artifact_name(&self) -> &'static str {
        match self {
            Stage::Acquire => "raw_papers.json",
            Stage::Preprocess => "preprocessed_papers.json",
            Stage::Ner => "extracted_entities.json",
            Stage::Re => "extracted_relationships.json",
            Stage::Topic => "topic_model/assignments.json",
            Stage::Resolve => "resolved_entities.json",
            Stage::Align => "aligned_entities.json",
            Stage::Load => "graph_load_report.json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub resume: bool,
    #[serde(default)]
    pub incremental: bool,
    #[serde(default = "default_stages")]
    pub stages: Vec<Stage>,
    #[serde(default)]
    pub fail_fast: bool,
    #[serde(default)]
    pub include_cooccurrence_edges: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            resume: false,
            incremental: false,
            stages: default_stages(),
            fail_fast: false,
            include_cooccurrence_edges: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}
fn default_stages() -> Vec<Stage> {
    Stage::ordered().to_vec()
}

// ---------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------

impl Config {
    /// Defaults → sectioned file (TOML or YAML by extension) → env overrides.
    ///
    /// A `.env` file in the working directory, if present, is loaded first so
    /// its values are visible to the env-override step below; its absence is
    /// not an error.
    pub fn load(file: Option<&Path>) -> Result<Self, SbkgError> {
        let _ = dotenvy::dotenv();
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, SbkgError> {
        let raw = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => toml::from_str(&raw)
                .map_err(|e| SbkgError::Config(format!("invalid TOML config {path:?}: {e}"))),
            Some("yaml") | Some("yml") => serde_yaml::from_str(&raw)
                .map_err(|e| SbkgError::Config(format!("invalid YAML config {path:?}: {e}"))),
            _ => Err(SbkgError::Config(format!(
                "unrecognized config extension for {path:?}; expected .toml or .yaml"
            ))),
        }
    }

    /// Overlay `<SECTION>_<KEY>` env vars (§6.1) plus the named vars in §6.4.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("LITERATURE_CONTACT_EMAIL") {
            self.acquisition.literature_contact_email = Some(v);
        }
        if let Ok(v) = std::env::var("LITERATURE_API_KEY") {
            self.acquisition.literature_api_key = Some(SecretString::from(v));
        }
        if let Ok(v) = std::env::var("GRAPH_ENDPOINT") {
            self.graph.endpoint = v;
        }
        if let Ok(v) = std::env::var("GRAPH_USER") {
            self.graph.user = Some(v);
        }
        if let Ok(v) = std::env::var("GRAPH_PASSWORD") {
            self.graph.password = Some(SecretString::from(v));
        }
        if let Ok(v) = std::env::var("GRAPH_DATABASE") {
            self.graph.database = v;
        }
        if let Ok(v) = std::env::var("OUTPUT_DIR") {
            self.pipeline.output_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ACQUISITION_MAX_PAPERS") {
            if let Ok(n) = v.parse() {
                self.acquisition.max_papers = n;
            }
        }
        if let Ok(v) = std::env::var("ACQUISITION_LITERATURE_ENABLED") {
            self.acquisition.literature_enabled = parse_bool(&v);
        }
    }

    pub fn validate(&self) -> Result<(), SbkgError> {
        if self.acquisition.literature_enabled && self.acquisition.literature_contact_email.is_none() {
            return Err(SbkgError::Config(
                "acquisition.literature_contact_email is required when acquisition.literature_enabled is true"
                    .to_string(),
            ));
        }
        if self.acquisition.max_papers < 1 {
            return Err(SbkgError::Config("acquisition.max_papers must be >= 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.ner.min_confidence) {
            return Err(SbkgError::Config("ner.min_confidence must be in [0,1]".to_string()));
        }
        if self.ner.batch_size < 1 {
            return Err(SbkgError::Config("ner.batch_size must be >= 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.re.min_confidence) {
            return Err(SbkgError::Config("re.min_confidence must be in [0,1]".to_string()));
        }
        if !(0.0..=1.0).contains(&self.aligner.match_threshold) {
            return Err(SbkgError::Config("aligner.match_threshold must be in [0,1]".to_string()));
        }
        if self.graph.batch_size < 1 {
            return Err(SbkgError::Config("graph.batch_size must be >= 1".to_string()));
        }
        validate_stage_order(&self.pipeline.stages)?;
        Ok(())
    }
}

fn parse_bool(v: &str) -> bool {
    matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// `stages` must be a (possibly strict) subset of the canonical order, kept
/// in that relative order (§4.10 "topological order of dependencies").
fn validate_stage_order(stages: &[Stage]) -> Result<(), SbkgError> {
    let canonical = Stage::ordered();
    let mut last_index = None;
    for stage in stages {
        let idx = canonical.iter().position(|s| s == stage).ok_or_else(|| {
            SbkgError::Config(format!("pipeline.stages contains unknown stage {stage:?}"))
        })?;
        if let Some(last) = last_index {
            if idx <= last {
                return Err(SbkgError::Config(
                    "pipeline.stages must respect the canonical dependency order".to_string(),
                ));
            }
        }
        last_index = Some(idx);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn literature_enabled_requires_contact_email() {
        let mut config = Config::default();
        config.acquisition.literature_enabled = true;
        assert!(config.validate().is_err());
        config.acquisition.literature_contact_email = Some("team@example.org".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_order_stages() {
        let mut config = Config::default();
        config.pipeline.stages = vec![Stage::Ner, Stage::Acquire];
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_confidence_out_of_range() {
        let mut config = Config::default();
        config.ner.min_confidence = 1.5;
        assert!(config.validate().is_err());
    }
}
