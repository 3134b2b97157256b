// Run configuration: taxonomies, weights, and field order as plain data.
//
// Every scoring variant (different category sets, magnitudes, signal
// weights, field orders) is a RunConfig value loaded from JSON, never a
// separate code path. The default history taxonomy ships in
// `taxonomies/history.json` and is compiled into the binary.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::text::ngram::{NgramMatcher, DEFAULT_MAX_N};

const BUILTIN_TAXONOMY: &str = include_str!("../taxonomies/history.json");

/// Output row keys that are not per-category score columns.
pub const RESERVED_COLUMNS: [&str; 7] = [
    "name",
    "group",
    "target_score",
    "avoid_score",
    "total_score",
    "flags",
    "provider_error",
];

/// Which side of the ranking a taxonomy pushes records toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Rewarded interests, positive contribution.
    Target,
    /// Penalized interests, negative contribution.
    Avoid,
}

impl Polarity {
    pub fn sign(self) -> f64 {
        match self {
            Polarity::Target => 1.0,
            Polarity::Avoid => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Target => "target",
            Polarity::Avoid => "avoid",
        }
    }
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named topic, tested for through its representative phrases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub phrases: Vec<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, phrases: &[&str]) -> Self {
        Self {
            name: name.into(),
            phrases: phrases.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// The text embedded once per run to represent this category.
    pub fn embedding_text(&self) -> String {
        self.phrases.join(" ")
    }

    /// Output column name for this category's score.
    pub fn score_column(&self) -> String {
        format!("{}_score", self.name)
    }
}

/// An ordered set of categories sharing one magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Scale applied to every category score. Only the absolute value is
    /// used; the sign comes from the taxonomy's polarity.
    pub magnitude: f64,
    pub categories: Vec<Category>,
}

/// Everything that defines one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub target: Taxonomy,
    pub avoid: Taxonomy,
    #[serde(default = "default_cosine_weight")]
    pub cosine_weight: f64,
    #[serde(default = "default_ngram_weight")]
    pub ngram_weight: f64,
    /// Longest phrase n-gram considered by the lexical matcher.
    #[serde(default = "default_max_ngram")]
    pub max_ngram: usize,
    /// Per-n-gram similarity floor (0-100) for the lexical matcher.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
    /// Record fields concatenated into the combined text, in order.
    #[serde(default = "default_text_fields")]
    pub text_fields: Vec<String>,
    /// Per-group overrides of `text_fields`, keyed by group id.
    #[serde(default)]
    pub group_fields: BTreeMap<String, Vec<String>>,
}

fn default_cosine_weight() -> f64 {
    0.35
}

fn default_ngram_weight() -> f64 {
    0.65
}

fn default_max_ngram() -> usize {
    DEFAULT_MAX_N
}

fn default_min_similarity() -> f64 {
    50.0
}

fn default_text_fields() -> Vec<String> {
    ["specialties", "publications", "intro", "courses"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl RunConfig {
    /// A config with the given taxonomies and every other setting at its default.
    pub fn new(target: Taxonomy, avoid: Taxonomy) -> Self {
        Self {
            target,
            avoid,
            cosine_weight: default_cosine_weight(),
            ngram_weight: default_ngram_weight(),
            max_ngram: default_max_ngram(),
            min_similarity: default_min_similarity(),
            text_fields: default_text_fields(),
            group_fields: BTreeMap::new(),
        }
    }

    /// The built-in history taxonomy.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_TAXONOMY).context("Built-in taxonomy is invalid")
    }

    /// Parse and validate a config from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RunConfig =
            serde_json::from_str(json).context("Failed to parse taxonomy config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read taxonomy config {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Invalid taxonomy config {}", path.display()))
    }

    /// Reject configs that would produce undefined or ambiguous output.
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("cosine_weight", self.cosine_weight),
            ("ngram_weight", self.ngram_weight),
            ("target.magnitude", self.target.magnitude),
            ("avoid.magnitude", self.avoid.magnitude),
        ] {
            if !value.is_finite() {
                anyhow::bail!("{label} must be a finite number, got {value}");
            }
        }

        if self.max_ngram == 0 {
            anyhow::bail!("max_ngram must be at least 1");
        }
        if !(0.0..=100.0).contains(&self.min_similarity) {
            anyhow::bail!(
                "min_similarity must be between 0 and 100, got {}",
                self.min_similarity
            );
        }

        let mut seen = HashSet::new();
        for (polarity, category) in self.categories() {
            if category.name.trim().is_empty() {
                anyhow::bail!("{polarity} taxonomy has a category with a blank name");
            }
            let column = category.score_column();
            if RESERVED_COLUMNS.contains(&column.as_str()) {
                anyhow::bail!(
                    "Category '{}' would write the reserved output column '{column}'",
                    category.name
                );
            }
            if !seen.insert(category.name.as_str()) {
                anyhow::bail!(
                    "Category '{}' appears more than once; output columns would collide",
                    category.name
                );
            }
            if category.phrases.iter().all(|p| p.trim().is_empty()) {
                anyhow::bail!("Category '{}' has no phrases", category.name);
            }
        }

        Ok(())
    }

    pub fn taxonomy(&self, polarity: Polarity) -> &Taxonomy {
        match polarity {
            Polarity::Target => &self.target,
            Polarity::Avoid => &self.avoid,
        }
    }

    /// Signed scale applied to every category score of a taxonomy.
    pub fn multiplier(&self, polarity: Polarity) -> f64 {
        polarity.sign() * self.taxonomy(polarity).magnitude.abs()
    }

    /// All categories, target first, each tagged with its polarity.
    pub fn categories(&self) -> impl Iterator<Item = (Polarity, &Category)> {
        self.target
            .categories
            .iter()
            .map(|c| (Polarity::Target, c))
            .chain(self.avoid.categories.iter().map(|c| (Polarity::Avoid, c)))
    }

    /// The lexical matcher configured for this run.
    pub fn matcher(&self) -> NgramMatcher {
        NgramMatcher {
            max_n: self.max_ngram,
            min_similarity: self.min_similarity,
        }
    }

    /// Field order for a group, falling back to `text_fields`.
    /// Group ids match case-insensitively.
    pub fn fields_for_group(&self, group: &str) -> &[String] {
        self.group_fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(group))
            .map(|(_, fields)| fields.as_slice())
            .unwrap_or(&self.text_fields)
    }

    /// Display the taxonomy and weights in the terminal.
    pub fn display(&self) {
        println!("\n{}", "=== Scoring Configuration ===".bold());
        println!(
            "  Weights: cosine {:.2}  ngram {:.2}  (max n-gram {}, floor {:.0})",
            self.cosine_weight, self.ngram_weight, self.max_ngram, self.min_similarity
        );
        println!("  Text fields: {}", self.text_fields.join(", "));
        for (group, fields) in &self.group_fields {
            println!("    {group}: {}", fields.join(", "));
        }

        for polarity in [Polarity::Target, Polarity::Avoid] {
            let taxonomy = self.taxonomy(polarity);
            let header = format!(
                "{} ({} categories, multiplier {:+.2})",
                polarity.as_str().to_uppercase(),
                taxonomy.categories.len(),
                self.multiplier(polarity)
            );
            let header = match polarity {
                Polarity::Target => header.green().bold(),
                Polarity::Avoid => header.red().bold(),
            };
            println!("\n  {header}");
            for category in &taxonomy.categories {
                println!(
                    "    {:<20} {}",
                    category.name,
                    category.phrases.join(", ").dimmed()
                );
            }
        }
        println!();
    }
}
