//! Pipeline sequencing (§4.10): runs the eight stages in declared order,
//! each reading its predecessor's artifact from disk and writing its own
//! under the stable layout in `artifact`. Owns `resume`, `incremental`,
//! stage subsetting, cooperative cancellation, and the run log.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use sbkg_acquisition::{preprocess_paper, Acquirer, ScientificTagger};
use sbkg_common::{CanonicalEntity, ErrorKind, Mention, Paper, RejectedRecord};
use sbkg_config::{Config, GraphMode, Stage};
use sbkg_db::{Database, PaperRepository};
use sbkg_graph::GraphLoader;
use sbkg_ner::NerEnsemble;
use sbkg_topic::{Topic, TopicModelOutput};

use crate::artifact::{self, ArtifactFile};
use crate::runlog::{RunLog, StageStatus};

/// Cooperative cancellation checkpoint, honored between stages (not
/// mid-batch, per §4.10: a stage below batch-size granularity cannot be
/// interrupted).
#[derive(Clone)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn listen_for_ctrl_c(&self) {
        let flag = self.0.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                flag.store(true, Ordering::Relaxed);
            }
        });
    }
}

impl Default for CancellationFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub run_id: String,
    pub stage_statuses: BTreeMap<Stage, StageStatus>,
    pub rejections: usize,
    pub cancelled: bool,
    pub failed: bool,
}

struct StageOutcome {
    count: usize,
    rejections: usize,
}

pub struct Orchestrator {
    config: Config,
    run_log: RunLog,
}

fn predecessor(stage: Stage) -> Option<Stage> {
    let ordered = Stage::ordered();
    let idx = ordered.iter().position(|s| *s == stage)?;
    if idx == 0 {
        None
    } else {
        Some(ordered[idx - 1])
    }
}

fn write_rejections(output_dir: &Path, stage: &str, records: &[RejectedRecord]) -> anyhow::Result<()> {
    if records.is_empty() {
        return Ok(());
    }
    let dir = output_dir.join("rejections");
    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join(format!("{stage}.json")), serde_json::to_vec_pretty(records)?)?;
    Ok(())
}

impl Orchestrator {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let run_log = RunLog::open(&config.pipeline.output_dir)?;
        Ok(Self { config, run_log })
    }

    pub async fn run_build(&self, curated_path: Option<&Path>, cancel: &CancellationFlag) -> anyhow::Result<RunSummary> {
        let run_id = Uuid::new_v4().to_string();
        let output_dir = self.config.pipeline.output_dir.clone();
        std::fs::create_dir_all(&output_dir)?;

        let selected: Vec<Stage> = Stage::ordered().into_iter().filter(|s| self.config.pipeline.stages.contains(s)).collect();
        if selected.is_empty() {
            anyhow::bail!("no stages selected to run");
        }

        for stage in &selected {
            if let Some(pred) = predecessor(*stage) {
                if !selected.contains(&pred) {
                    let path = output_dir.join(pred.artifact_name());
                    if !artifact::probe_valid(&path) {
                        return Err(sbkg_common::SbkgError::PipelineDependency(format!(
                            "stage {stage:?} needs the output of {pred:?} at {}, which is missing or invalid",
                            path.display()
                        ))
                        .into());
                    }
                }
            }
        }

        let mut statuses = BTreeMap::new();
        let mut total_rejections = 0usize;

        let mut papers: Vec<Paper> = Vec::new();
        let mut mentions: Vec<Mention> = Vec::new();
        let mut relationships: Vec<sbkg_common::RelationshipCandidate> = Vec::new();
        let mut topic_output: Option<TopicModelOutput> = None;
        let mut entities: Vec<CanonicalEntity> = Vec::new();

        for stage in selected {
            if cancel.is_cancelled() {
                statuses.insert(stage, StageStatus::Cancelled);
                self.run_log.record(&run_id, stage, StageStatus::Cancelled, Duration::ZERO, json!({}), None)?;
                let summary = RunSummary { run_id, stage_statuses: statuses, rejections: total_rejections, cancelled: true, failed: false };
                self.write_run_summary(&output_dir, &summary)?;
                return Ok(summary);
            }

            let artifact_path = output_dir.join(stage.artifact_name());
            if self.config.pipeline.resume && artifact::probe_valid(&artifact_path) {
                self.load_stage_output(stage, &output_dir, &mut papers, &mut mentions, &mut relationships, &mut topic_output, &mut entities)?;
                statuses.insert(stage, StageStatus::Skipped);
                self.run_log.record(&run_id, stage, StageStatus::Skipped, Duration::ZERO, json!({}), None)?;
                continue;
            }

            let start = Instant::now();
            let outcome = self
                .run_stage(stage, &run_id, curated_path, &output_dir, &mut papers, &mut mentions, &mut relationships, &mut topic_output, &mut entities)
                .await;
            let elapsed = start.elapsed();

            match outcome {
                Ok(StageOutcome { count, rejections }) => {
                    total_rejections += rejections;
                    let status = if rejections > 0 { StageStatus::SuccessWithRejections } else { StageStatus::Success };
                    statuses.insert(stage, status);
                    self.run_log.record(&run_id, stage, status, elapsed, json!({ "count": count, "rejections": rejections }), None)?;
                }
                Err(e) => {
                    statuses.insert(stage, StageStatus::Failed);
                    self.run_log.record(&run_id, stage, StageStatus::Failed, elapsed, json!({}), Some(e.to_string()))?;
                    let optional = matches!(stage, Stage::Resolve | Stage::Align);
                    if self.config.pipeline.fail_fast || !optional {
                        let summary = RunSummary { run_id, stage_statuses: statuses, rejections: total_rejections, cancelled: false, failed: true };
                        self.write_run_summary(&output_dir, &summary)?;
                        return Ok(summary);
                    }
                    warn!(?stage, error = %e, "optional stage failed, continuing run with a warning");
                }
            }
        }

        let summary = RunSummary { run_id, stage_statuses: statuses, rejections: total_rejections, cancelled: false, failed: false };
        self.write_run_summary(&output_dir, &summary)?;
        Ok(summary)
    }

    fn write_run_summary(&self, output_dir: &Path, summary: &RunSummary) -> anyhow::Result<()> {
        let body = json!({
            "run_id": summary.run_id,
            "stage_statuses": summary.stage_statuses,
            "rejections": summary.rejections,
            "cancelled": summary.cancelled,
            "failed": summary.failed,
            "seed": self.config.topic.seed,
        });
        std::fs::write(output_dir.join("pipeline_results.json"), serde_json::to_vec_pretty(&body)?)?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_stage(
        &self,
        stage: Stage,
        run_id: &str,
        curated_path: Option<&Path>,
        output_dir: &Path,
        papers: &mut Vec<Paper>,
        mentions: &mut Vec<Mention>,
        relationships: &mut Vec<sbkg_common::RelationshipCandidate>,
        topic_output: &mut Option<TopicModelOutput>,
        entities: &mut Vec<CanonicalEntity>,
    ) -> anyhow::Result<StageOutcome> {
        match stage {
            Stage::Acquire => self.run_acquire(run_id, curated_path, output_dir, papers).await,
            Stage::Preprocess => self.run_preprocess(run_id, output_dir, papers),
            Stage::Ner => self.run_ner(run_id, output_dir, papers, mentions).await,
            Stage::Re => self.run_re(run_id, output_dir, papers, mentions, relationships),
            Stage::Topic => self.run_topic(run_id, output_dir, papers, topic_output).await,
            Stage::Resolve => self.run_resolve(run_id, output_dir, mentions, entities).await,
            Stage::Align => self.run_align(run_id, output_dir, entities),
            Stage::Load => self.run_load(output_dir, papers, mentions, relationships, topic_output, entities).await,
        }
    }

    async fn run_acquire(&self, run_id: &str, curated_path: Option<&Path>, output_dir: &Path, papers: &mut Vec<Paper>) -> anyhow::Result<StageOutcome> {
        let acquirer = Acquirer::new(self.config.acquisition.clone());
        let output = acquirer.run(curated_path).await?;
        let mut out_papers = output.papers;
        if self.config.pipeline.incremental {
            out_papers = self.filter_already_ingested(out_papers).await;
        }
        write_rejections(output_dir, "acquirer", &output.rejected)?;
        ArtifactFile::new("acquirer", run_id, out_papers.clone()).write(&output_dir.join(Stage::Acquire.artifact_name()))?;
        let rejections = output.rejected.len();
        let count = out_papers.len();
        *papers = out_papers;
        Ok(StageOutcome { count, rejections })
    }

    async fn filter_already_ingested(&self, papers: Vec<Paper>) -> Vec<Paper> {
        match Database::connect(&self.config.graph.endpoint).await {
            Ok(db) => {
                let repo = PaperRepository::new(&db);
                let mut kept = Vec::with_capacity(papers.len());
                for paper in papers {
                    match repo.find_by_literature_id(&paper.literature_id).await {
                        Ok(Some(_)) => {}
                        _ => kept.push(paper),
                    }
                }
                kept
            }
            Err(e) => {
                warn!(error = %e, "incremental mode requested but the graph store is unreachable, acquiring the full set");
                papers
            }
        }
    }

    fn run_preprocess(&self, run_id: &str, output_dir: &Path, papers: &mut Vec<Paper>) -> anyhow::Result<StageOutcome> {
        let tagger = ScientificTagger::load().ok();
        let mut rejected = Vec::new();
        let mut cleaned_papers = Vec::with_capacity(papers.len());
        for paper in papers.iter() {
            match preprocess_paper(paper, tagger.as_ref()) {
                Ok(cleaned) => {
                    let mut p = paper.clone();
                    p.clean_text = Some(cleaned.clean_text);
                    p.sentences = Some(cleaned.sentences);
                    cleaned_papers.push(p);
                }
                Err(rejection) => rejected.push(rejection),
            }
        }
        write_rejections(output_dir, "preprocessor", &rejected)?;
        ArtifactFile::new("preprocessor", run_id, cleaned_papers.clone()).write(&output_dir.join(Stage::Preprocess.artifact_name()))?;
        let rejections = rejected.len();
        let count = cleaned_papers.len();
        *papers = cleaned_papers;
        Ok(StageOutcome { count, rejections })
    }

    async fn run_ner(&self, run_id: &str, output_dir: &Path, papers: &[Paper], mentions: &mut Vec<Mention>) -> anyhow::Result<StageOutcome> {
        let ensemble = NerEnsemble::build(&self.config.ner).await?;
        let mut all_mentions = Vec::new();
        let mut rejected = Vec::new();
        for paper in papers {
            match ensemble.process_paper(paper) {
                Ok(mut m) => all_mentions.append(&mut m),
                Err(e) => rejected.push(RejectedRecord::new("ner", Some(paper.literature_id.clone()), ErrorKind::ExtractorFailure, e.to_string())),
            }
        }
        write_rejections(output_dir, "ner", &rejected)?;
        ArtifactFile::new("ner", run_id, all_mentions.clone()).write(&output_dir.join(Stage::Ner.artifact_name()))?;
        let rejections = rejected.len();
        let count = all_mentions.len();
        *mentions = all_mentions;
        Ok(StageOutcome { count, rejections })
    }

    fn run_re(
        &self,
        run_id: &str,
        output_dir: &Path,
        papers: &[Paper],
        mentions: &[Mention],
        relationships: &mut Vec<sbkg_common::RelationshipCandidate>,
    ) -> anyhow::Result<StageOutcome> {
        let mut all = Vec::new();
        for paper in papers {
            let paper_mentions: Vec<Mention> = mentions.iter().filter(|m| m.paper_id == paper.literature_id).cloned().collect();
            all.extend(sbkg_re::process_paper(paper, &paper_mentions, &self.config.re));
        }
        let merged = sbkg_re::dedup::merge(all);
        ArtifactFile::new("re", run_id, merged.clone()).write(&output_dir.join(Stage::Re.artifact_name()))?;
        let count = merged.len();
        *relationships = merged;
        Ok(StageOutcome { count, rejections: 0 })
    }

    async fn run_topic(&self, run_id: &str, output_dir: &Path, papers: &[Paper], topic_output: &mut Option<TopicModelOutput>) -> anyhow::Result<StageOutcome> {
        let output = sbkg_topic::run_topic_model(papers, &self.config.topic).await?;
        let assignments_path = output_dir.join(Stage::Topic.artifact_name());
        ArtifactFile::new("topic_model", run_id, output.assignments.clone()).write(&assignments_path)?;
        let topics_path = assignments_path.with_file_name("topics.json");
        ArtifactFile::new("topic_model", run_id, output.topics.clone()).write(&topics_path)?;
        let count = output.assignments.len();
        *topic_output = Some(output);
        Ok(StageOutcome { count, rejections: 0 })
    }

    async fn run_resolve(&self, run_id: &str, output_dir: &Path, mentions: &[Mention], entities: &mut Vec<CanonicalEntity>) -> anyhow::Result<StageOutcome> {
        let mut resolved = sbkg_enrich::canonicalize(mentions);
        let resolver = sbkg_enrich::Resolver::new(self.config.resolver.clone());
        resolver.resolve_all(&mut resolved).await;
        ArtifactFile::new("resolver", run_id, resolved.clone()).write(&output_dir.join(Stage::Resolve.artifact_name()))?;
        let count = resolved.len();
        *entities = resolved;
        Ok(StageOutcome { count, rejections: 0 })
    }

    fn run_align(&self, run_id: &str, output_dir: &Path, entities: &mut Vec<CanonicalEntity>) -> anyhow::Result<StageOutcome> {
        let aligner = sbkg_enrich::Aligner::new(self.config.aligner.clone());
        aligner.align_all(entities);
        ArtifactFile::new("aligner", run_id, entities.clone()).write(&output_dir.join(Stage::Align.artifact_name()))?;
        Ok(StageOutcome { count: entities.len(), rejections: 0 })
    }

    async fn run_load(
        &self,
        output_dir: &Path,
        papers: &[Paper],
        mentions: &[Mention],
        relationships: &[sbkg_common::RelationshipCandidate],
        topic_output: &Option<TopicModelOutput>,
        entities: &[CanonicalEntity],
    ) -> anyhow::Result<StageOutcome> {
        let db = Database::connect(&self.config.graph.endpoint).await?;
        let mut graph_config = self.config.graph.clone();
        if self.config.pipeline.incremental {
            graph_config.mode = GraphMode::Merge;
        }
        let paper_topics: HashMap<String, i32> =
            topic_output.as_ref().map(|o| o.assignments.iter().map(|a| (a.paper_id.clone(), a.topic_id)).collect()).unwrap_or_default();
        let topics: Vec<Topic> = topic_output.as_ref().map(|o| o.topics.clone()).unwrap_or_default();

        // ASSOCIATED_WITH is the co-occurrence fallback's predicate; it is
        // noisy by construction, so it is suppressed at load time unless
        // the run opts in (§9 open question, resolved toward suppression).
        let loadable: Vec<sbkg_common::RelationshipCandidate> = if self.config.pipeline.include_cooccurrence_edges {
            relationships.to_vec()
        } else {
            relationships.iter().filter(|r| r.predicate != sbkg_common::Predicate::AssociatedWith).cloned().collect()
        };

        let loader = GraphLoader::new(db, graph_config);
        let report = loader.load(papers, &paper_topics, entities, mentions, &loadable, &topics, self.config.pipeline.fail_fast).await?;

        let report_path = output_dir.join(Stage::Load.artifact_name());
        std::fs::write(&report_path, serde_json::to_vec_pretty(&report)?)?;
        let rejections = report.rejections.len();
        Ok(StageOutcome { count: papers.len(), rejections })
    }

    #[allow(clippy::too_many_arguments)]
    fn load_stage_output(
        &self,
        stage: Stage,
        output_dir: &Path,
        papers: &mut Vec<Paper>,
        mentions: &mut Vec<Mention>,
        relationships: &mut Vec<sbkg_common::RelationshipCandidate>,
        topic_output: &mut Option<TopicModelOutput>,
        entities: &mut Vec<CanonicalEntity>,
    ) -> anyhow::Result<()> {
        match stage {
            Stage::Acquire | Stage::Preprocess => {
                *papers = ArtifactFile::<Paper>::read(&output_dir.join(stage.artifact_name()))?.records;
            }
            Stage::Ner => {
                *mentions = ArtifactFile::<Mention>::read(&output_dir.join(stage.artifact_name()))?.records;
            }
            Stage::Re => {
                *relationships = ArtifactFile::<sbkg_common::RelationshipCandidate>::read(&output_dir.join(stage.artifact_name()))?.records;
            }
            Stage::Topic => {
                let assignments_path = output_dir.join(stage.artifact_name());
                let topics_path = assignments_path.with_file_name("topics.json");
                let assignments = ArtifactFile::<sbkg_topic::TopicAssignment>::read(&assignments_path)?.records;
                let topics = ArtifactFile::<Topic>::read(&topics_path)?.records;
                *topic_output = Some(TopicModelOutput { assignments, topics });
            }
            Stage::Resolve | Stage::Align => {
                *entities = ArtifactFile::<CanonicalEntity>::read(&output_dir.join(stage.artifact_name()))?.records;
            }
            Stage::Load => {}
        }
        Ok(())
    }
}
