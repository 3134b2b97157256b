// JSON result files for a batch run.
//
//   analysis_<group>.json     rows for one group, input order
//   analysis_all_groups.json  every row, highest total first
//   summary.json              per-group and overall statistics + run metadata

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::pipeline::batch::{BatchOutcome, RunMetadata};
use crate::pipeline::rank::rank_descending;
use crate::scoring::record::RecordScore;
use crate::summary::Describe;

pub const ALL_GROUPS_FILE: &str = "analysis_all_groups.json";
pub const SUMMARY_FILE: &str = "summary.json";

pub fn group_file_name(group: &str) -> String {
    format!("analysis_{group}.json")
}

#[derive(Serialize)]
struct SummaryReport<'a> {
    groups: BTreeMap<&'a str, Option<&'a Describe>>,
    overall: Option<&'a Describe>,
    metadata: &'a RunMetadata,
}

fn rows<'a>(scores: impl IntoIterator<Item = &'a RecordScore>) -> Value {
    Value::Array(
        scores
            .into_iter()
            .map(|s| Value::Object(s.to_row()))
            .collect(),
    )
}

/// Write a value as pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write every result file for `outcome` into `dir`. Returns the paths written.
pub fn write_outcome(outcome: &BatchOutcome, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for group in &outcome.groups {
        let path = dir.join(group_file_name(&group.group));
        write_json(&path, &rows(&group.scores))?;
        written.push(path);
    }

    let all = outcome.all_scores();
    let path = dir.join(ALL_GROUPS_FILE);
    write_json(&path, &rows(rank_descending(&all)))?;
    written.push(path);

    let summary = SummaryReport {
        groups: outcome
            .groups
            .iter()
            .map(|g| (g.group.as_str(), g.summary.as_ref()))
            .collect(),
        overall: outcome.overall.as_ref(),
        metadata: &outcome.metadata,
    };
    let path = dir.join(SUMMARY_FILE);
    write_json(&path, &summary)?;
    written.push(path);

    info!(dir = %dir.display(), files = written.len(), "Wrote results");
    Ok(written)
}
