//! Binary entry point: structured logging, config load, CLI dispatch (§6.2).

mod artifact;
mod cli;
mod pipeline;
mod readapi;
mod runlog;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use cli::{Cli, Command};
use pipeline::{CancellationFlag, Orchestrator};
use sbkg_config::{Config, Stage};
use sbkg_db::Database;

const EXIT_SUCCESS: u8 = 0;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_STAGE_FAILURE: u8 = 3;
const EXIT_PARTIAL_SUCCESS: u8 = 4;
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    sbkg_common::logging::init();
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "configuration error");
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    match run(&mut config, cli.command).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %e, "fatal error");
            ExitCode::from(EXIT_STAGE_FAILURE)
        }
    }
}

fn parse_stage(name: &str) -> anyhow::Result<Stage> {
    match name.trim() {
        "acquire" => Ok(Stage::Acquire),
        "preprocess" => Ok(Stage::Preprocess),
        "ner" => Ok(Stage::Ner),
        "re" => Ok(Stage::Re),
        "topic" => Ok(Stage::Topic),
        "resolve" => Ok(Stage::Resolve),
        "align" => Ok(Stage::Align),
        "load" => Ok(Stage::Load),
        other => anyhow::bail!("unknown stage \"{other}\""),
    }
}

async fn run(config: &mut Config, command: Command) -> anyhow::Result<u8> {
    match command {
        Command::Build {
            papers,
            use_curated,
            no_curated,
            use_literature,
            no_literature,
            use_secondary,
            no_secondary,
            load_graph,
            skip_graph,
            resume,
            incremental,
            output_dir,
            fail_fast,
            stages,
            curated_path,
        } => {
            if let Some(n) = papers {
                config.acquisition.max_papers = n;
            }
            if use_curated {
                config.acquisition.curated_enabled = true;
            }
            if no_curated {
                config.acquisition.curated_enabled = false;
            }
            if use_literature {
                config.acquisition.literature_enabled = true;
            }
            if no_literature {
                config.acquisition.literature_enabled = false;
            }
            if no_secondary {
                config.acquisition.secondary_sources.clear();
            }
            let _ = use_secondary;
            if let Some(dir) = output_dir {
                config.pipeline.output_dir = dir;
            }
            config.pipeline.resume = resume;
            config.pipeline.incremental = incremental;
            config.pipeline.fail_fast = fail_fast;
            if let Some(names) = stages {
                let mut parsed = Vec::with_capacity(names.len());
                for name in names {
                    parsed.push(parse_stage(&name)?);
                }
                config.pipeline.stages = parsed;
            }
            if skip_graph {
                config.pipeline.stages.retain(|s| *s != Stage::Load);
            }
            let _ = load_graph;

            config.validate()?;

            let orchestrator = Orchestrator::new(config.clone())?;
            let cancel = CancellationFlag::new();
            cancel.listen_for_ctrl_c();
            let summary = orchestrator.run_build(curated_path.as_deref(), &cancel).await?;

            info!(run_id = %summary.run_id, rejections = summary.rejections, "run complete");
            if summary.cancelled {
                return Ok(EXIT_CANCELLED);
            }
            if summary.failed {
                return Ok(EXIT_STAGE_FAILURE);
            }
            if summary.rejections > 0 {
                return Ok(EXIT_PARTIAL_SUCCESS);
            }
            Ok(EXIT_SUCCESS)
        }
        Command::AcquireCurated { curated_path, output_dir } => {
            config.acquisition.curated_enabled = true;
            config.acquisition.literature_enabled = false;
            config.acquisition.secondary_sources.clear();
            config.pipeline.stages = vec![Stage::Acquire];
            if let Some(dir) = output_dir {
                config.pipeline.output_dir = dir;
            }
            config.validate()?;
            let orchestrator = Orchestrator::new(config.clone())?;
            let cancel = CancellationFlag::new();
            let summary = orchestrator.run_build(Some(curated_path.as_path()), &cancel).await?;
            Ok(if summary.failed { EXIT_STAGE_FAILURE } else { EXIT_SUCCESS })
        }
        Command::AcquireAll { output_dir } => {
            config.acquisition.literature_enabled = true;
            config.pipeline.stages = vec![Stage::Acquire];
            if let Some(dir) = output_dir {
                config.pipeline.output_dir = dir;
            }
            config.validate()?;
            let orchestrator = Orchestrator::new(config.clone())?;
            let cancel = CancellationFlag::new();
            let summary = orchestrator.run_build(None, &cancel).await?;
            Ok(if summary.failed { EXIT_STAGE_FAILURE } else { EXIT_SUCCESS })
        }
        Command::InitDb => {
            let db = Database::connect(&config.graph.endpoint).await?;
            db.initialize().await?;
            println!("graph store initialized at {}", config.graph.endpoint);
            Ok(EXIT_SUCCESS)
        }
        Command::Status { output_dir } => {
            let dir: PathBuf = output_dir.unwrap_or_else(|| config.pipeline.output_dir.clone());
            let log_path = dir.join("logs").join("kg_construction.log");
            match std::fs::read_to_string(&log_path) {
                Ok(body) => {
                    if let Some(last_line) = body.lines().last() {
                        println!("{last_line}");
                    } else {
                        println!("no runs recorded yet");
                    }
                }
                Err(_) => println!("no run log found at {}", log_path.display()),
            }
            Ok(EXIT_SUCCESS)
        }
        Command::Stats => {
            let db = Database::connect(&config.graph.endpoint).await?;
            let stats = readapi::get_graph_statistics(&db).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(EXIT_SUCCESS)
        }
    }
}
