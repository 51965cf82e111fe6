//! Per-stage run log (§4.10, §6.5): one JSON line per stage transition,
//! appended to `<output_dir>/logs/kg_construction.log`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use serde::Serialize;
use sbkg_config::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    SuccessWithRejections,
    Skipped,
    Failed,
    Cancelled,
}

#[derive(Debug, Serialize)]
struct RunLogEntry<'a> {
    run_id: &'a str,
    stage: Stage,
    status: StageStatus,
    duration_ms: u128,
    counts: serde_json::Value,
    error: Option<String>,
}

pub struct RunLog {
    path: std::path::PathBuf,
}

impl RunLog {
    pub fn open(output_dir: &Path) -> anyhow::Result<Self> {
        let dir = output_dir.join("logs");
        fs::create_dir_all(&dir)?;
        Ok(Self { path: dir.join("kg_construction.log") })
    }

    pub fn record(
        &self,
        run_id: &str,
        stage: Stage,
        status: StageStatus,
        duration: Duration,
        counts: serde_json::Value,
        error: Option<String>,
    ) -> anyhow::Result<()> {
        let entry = RunLogEntry { run_id, stage, status, duration_ms: duration.as_millis(), counts, error };
        let line = serde_json::to_string(&entry)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}
