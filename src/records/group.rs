// Group files: one JSON array of records per source (e.g. per university).
//
// Files follow the scrapers' naming, `faculty_data_<group>.json`, and the
// group id is the stem's last `_`-separated segment.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use super::Record;

const INPUT_PREFIX: &str = "faculty_data_";

/// All records read from one group file.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordGroup {
    pub group: String,
    pub records: Vec<Record>,
}

impl RecordGroup {
    pub fn new(group: impl Into<String>, records: Vec<Record>) -> Self {
        Self {
            group: group.into(),
            records,
        }
    }
}

/// Group id for a file: the last `_`-separated segment of its stem.
///
/// `faculty_data_yale.json` → `yale`; a stem with no underscore is used whole.
pub fn group_name_from_path(path: &Path) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("Cannot derive a group name from {}", path.display()))?;
    let group = stem.rsplit('_').next().unwrap_or(stem);
    if group.is_empty() {
        anyhow::bail!("Cannot derive a group name from {}", path.display());
    }
    Ok(group.to_string())
}

/// Load one group file. `group` overrides the name derived from the path.
pub fn load_group(path: &Path, group: Option<&str>) -> Result<RecordGroup> {
    let group = match group {
        Some(g) => g.to_string(),
        None => group_name_from_path(path)?,
    };

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let records: Vec<Record> = serde_json::from_str(&json)
        .with_context(|| format!("{} is not a JSON array of records", path.display()))?;

    info!(group = %group, records = records.len(), path = %path.display(), "Loaded group");
    Ok(RecordGroup::new(group, records))
}

/// Find `faculty_data_*.json` files in `dir`, sorted by path.
pub fn discover_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_input = path.is_file()
            && path.extension().is_some_and(|ext| ext == "json")
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(INPUT_PREFIX));
        if is_input {
            paths.push(path);
        }
    }
    paths.sort();

    debug!(dir = %dir.display(), found = paths.len(), "Discovered input files");
    Ok(paths)
}

/// Fail if two groups share an id; their result files would overwrite
/// each other. Ids differing only in case count as the same.
pub fn ensure_unique_groups(groups: &[RecordGroup]) -> Result<()> {
    let mut seen = HashSet::new();
    for group in groups {
        if !seen.insert(group.group.to_lowercase()) {
            anyhow::bail!(
                "Group '{}' appears in more than one input; pass each group once",
                group.group
            );
        }
    }
    Ok(())
}

/// "yale" → "Yale", "MIT" → "Mit".
pub fn capitalize(group: &str) -> String {
    let mut chars = group.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Merge several group files into one array, tagging each object with a
/// `group` key holding the capitalized group id.
///
/// Objects are kept as raw JSON so fields the scorer never reads survive.
pub fn combine(paths: &[PathBuf]) -> Result<Vec<Value>> {
    let mut combined = Vec::new();

    for path in paths {
        let group = capitalize(&group_name_from_path(path)?);
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let items: Vec<Value> = serde_json::from_str(&json)
            .with_context(|| format!("{} is not a JSON array", path.display()))?;

        for mut item in items {
            match item.as_object_mut() {
                Some(object) => {
                    object.insert("group".to_string(), Value::String(group.clone()));
                }
                None => anyhow::bail!("{} contains a non-object entry", path.display()),
            }
            combined.push(item);
        }
    }

    info!(files = paths.len(), records = combined.len(), "Combined group files");
    Ok(combined)
}
