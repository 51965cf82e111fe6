//! Command-line surface (§6.2): `build` runs the full or a restricted
//! pipeline; the remaining commands are thin single-purpose entry points
//! layered on the same config and stage crates.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sbkg", about = "Space-biology knowledge graph construction pipeline")]
pub struct Cli {
    /// Path to a TOML or YAML config file (defaults layered under it, then env overrides).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the construction pipeline end to end (or a restricted subset).
    Build {
        #[arg(long)]
        papers: Option<usize>,
        #[arg(long, overrides_with = "no_curated")]
        use_curated: bool,
        #[arg(long, overrides_with = "use_curated")]
        no_curated: bool,
        #[arg(long, overrides_with = "no_literature")]
        use_literature: bool,
        #[arg(long, overrides_with = "use_literature")]
        no_literature: bool,
        #[arg(long, overrides_with = "no_secondary")]
        use_secondary: bool,
        #[arg(long, overrides_with = "use_secondary")]
        no_secondary: bool,
        #[arg(long, overrides_with = "skip_graph")]
        load_graph: bool,
        #[arg(long, overrides_with = "load_graph")]
        skip_graph: bool,
        #[arg(long)]
        resume: bool,
        #[arg(long)]
        incremental: bool,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        fail_fast: bool,
        /// Comma-separated subset of stages (kebab-case), e.g. "acquire,preprocess,ner".
        #[arg(long, value_delimiter = ',')]
        stages: Option<Vec<String>>,
        /// Path to a curated-paper JSON file, used when curated ingest is enabled.
        #[arg(long)]
        curated_path: Option<PathBuf>,
    },
    /// Acquire only the curated paper list, skipping every other stage.
    AcquireCurated {
        #[arg(long)]
        curated_path: PathBuf,
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Acquire curated, literature, and secondary sources, skipping every other stage.
    AcquireAll {
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Create the graph store's tables if they don't already exist.
    InitDb,
    /// Print the status of the most recent run (from the run log).
    Status {
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print graph store node/relationship counts.
    Stats,
}
