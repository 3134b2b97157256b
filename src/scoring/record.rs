// Record-level scores: every category evaluated against one record.
//
// Given the record's combined text and its embedding, each prepared
// category is scored, target and avoid scores are aggregated separately,
// and the total is their sum. Anything that went sideways along the way
// (provider failure, zero-norm vectors, empty taxonomies) is recorded as a
// flag rather than an error, so every record still produces a row.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::aggregate::{aggregate, is_zero_weight};
use super::category::{score_category_against, CategoryScore, PreparedTaxonomies};
use crate::taxonomy::{Polarity, RunConfig};
use crate::text::ngram::DocumentNgrams;

/// Conditions worth surfacing next to a record's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFlag {
    /// The embedding provider failed; cosine signals are all 0.0.
    ProviderFailure,
    /// At least one cosine was undefined (zero-norm vector).
    DegenerateVector,
    /// Every target category scored exactly 0.
    ZeroWeightTarget,
    /// Every avoid category scored exactly 0.
    ZeroWeightAvoid,
}

impl ScoreFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            ScoreFlag::ProviderFailure => "provider_failure",
            ScoreFlag::DegenerateVector => "degenerate_vector",
            ScoreFlag::ZeroWeightTarget => "zero_weight_target",
            ScoreFlag::ZeroWeightAvoid => "zero_weight_avoid",
        }
    }
}

/// The scored form of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordScore {
    pub name: String,
    pub group: String,
    pub target_score: f64,
    pub avoid_score: f64,
    pub total_score: f64,
    /// Target categories first, in config order.
    pub categories: Vec<CategoryScore>,
    pub flags: Vec<ScoreFlag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_error: Option<String>,
}

impl RecordScore {
    pub fn has_flag(&self, flag: ScoreFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Mark the record as scored without an embedding.
    pub fn mark_provider_failure(&mut self, error: String) {
        if !self.has_flag(ScoreFlag::ProviderFailure) {
            self.flags.insert(0, ScoreFlag::ProviderFailure);
        }
        self.provider_error = Some(error);
    }

    pub fn category(&self, name: &str) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Flat output row: identity, the three scores, one `<category>_score`
    /// column per category in config order, then flags.
    pub fn to_row(&self) -> Map<String, Value> {
        let mut row = Map::new();
        row.insert("name".to_string(), Value::from(self.name.clone()));
        row.insert("group".to_string(), Value::from(self.group.clone()));
        row.insert("target_score".to_string(), Value::from(self.target_score));
        row.insert("avoid_score".to_string(), Value::from(self.avoid_score));
        row.insert("total_score".to_string(), Value::from(self.total_score));
        for category in &self.categories {
            row.insert(format!("{}_score", category.name), Value::from(category.score));
        }
        row.insert(
            "flags".to_string(),
            Value::Array(self.flags.iter().map(|f| Value::from(f.as_str())).collect()),
        );
        if let Some(error) = &self.provider_error {
            row.insert("provider_error".to_string(), Value::from(error.clone()));
        }
        row
    }
}

/// Score already-embedded text against every prepared category.
///
/// Pure and deterministic: the same inputs always give the same output.
pub fn score_text(
    name: &str,
    group: &str,
    text: &str,
    embedding: &[f64],
    prepared: &PreparedTaxonomies,
    config: &RunConfig,
) -> RecordScore {
    let matcher = config.matcher();
    let doc = DocumentNgrams::new(text, matcher.max_n);

    let mut flags = Vec::new();
    let mut degenerate = false;
    let categories: Vec<CategoryScore> = prepared
        .categories
        .iter()
        .map(|category| {
            let components = score_category_against(embedding, &doc, category, &matcher);
            degenerate |= components.degenerate;
            CategoryScore::new(category, components, config)
        })
        .collect();

    if degenerate {
        flags.push(ScoreFlag::DegenerateVector);
    }

    let mut taxonomy_score = |polarity: Polarity, flag: ScoreFlag| {
        let scores: Vec<f64> = categories
            .iter()
            .filter(|c| c.polarity == polarity)
            .map(|c| c.score)
            .collect();
        if is_zero_weight(&scores) {
            flags.push(flag);
        }
        aggregate(&scores)
    };
    let target_score = taxonomy_score(Polarity::Target, ScoreFlag::ZeroWeightTarget);
    let avoid_score = taxonomy_score(Polarity::Avoid, ScoreFlag::ZeroWeightAvoid);

    RecordScore {
        name: name.to_string(),
        group: group.to_string(),
        target_score,
        avoid_score,
        total_score: target_score + avoid_score,
        categories,
        flags,
        provider_error: None,
    }
}
