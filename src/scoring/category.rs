// Per-category scoring: semantic and lexical signals for one category.
//
// Each category is tested two ways against a record:
//   - cosine: similarity between the record embedding and the embedding of
//     the category's joined phrases (computed once per run)
//   - ngram: the best fuzzy phrase match of any category phrase in the text
//
//   score = (cosine · cosine_weight + ngram · ngram_weight) · multiplier
//
// where the multiplier carries the taxonomy's sign and magnitude.

use serde::Serialize;

use crate::embeddings::vector::{cosine_similarity, is_zero_norm};
use crate::taxonomy::{Category, Polarity, RunConfig};
use crate::text::ngram::{DocumentNgrams, NgramMatcher};

/// A category with its embedding already computed.
#[derive(Debug, Clone)]
pub struct PreparedCategory {
    pub category: Category,
    pub polarity: Polarity,
    pub embedding: Vec<f64>,
}

/// Every category of a run, target first, in config order.
#[derive(Debug, Clone)]
pub struct PreparedTaxonomies {
    pub categories: Vec<PreparedCategory>,
    /// Embedding dimension of the provider that prepared them.
    pub dimension: usize,
}

/// Raw signals for one (record, category) pair, before weighting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreComponents {
    /// In [-1, 1]; 0.0 when degenerate.
    pub cosine: f64,
    /// In [0, 1].
    pub ngram: f64,
    /// Cosine was undefined because one side had zero norm.
    pub degenerate: bool,
}

impl ScoreComponents {
    /// Weighted, signed category score.
    pub fn combine(&self, cosine_weight: f64, ngram_weight: f64, multiplier: f64) -> f64 {
        (self.cosine * cosine_weight + self.ngram * ngram_weight) * multiplier
    }
}

/// Compute both signals for a category against a record's text.
pub fn score_category(
    record_embedding: &[f64],
    record_text: &str,
    category: &PreparedCategory,
    matcher: &NgramMatcher,
) -> ScoreComponents {
    let doc = DocumentNgrams::new(record_text, matcher.max_n);
    score_category_against(record_embedding, &doc, category, matcher)
}

/// Like [`score_category`], with the record text already split into n-grams.
pub fn score_category_against(
    record_embedding: &[f64],
    doc: &DocumentNgrams,
    category: &PreparedCategory,
    matcher: &NgramMatcher,
) -> ScoreComponents {
    let degenerate = is_zero_norm(record_embedding) || is_zero_norm(&category.embedding);
    let cosine = if degenerate {
        0.0
    } else {
        cosine_similarity(record_embedding, &category.embedding)
    };

    let ngram = category
        .category
        .phrases
        .iter()
        .map(|phrase| matcher.score_against(phrase, doc))
        .fold(0.0_f64, f64::max);

    ScoreComponents {
        cosine,
        ngram,
        degenerate,
    }
}

/// One category's contribution to a record's score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub name: String,
    pub polarity: Polarity,
    pub cosine: f64,
    pub ngram: f64,
    pub score: f64,
}

impl CategoryScore {
    pub fn new(category: &PreparedCategory, components: ScoreComponents, config: &RunConfig) -> Self {
        let score = components.combine(
            config.cosine_weight,
            config.ngram_weight,
            config.multiplier(category.polarity),
        );
        Self {
            name: category.category.name.clone(),
            polarity: category.polarity,
            cosine: components.cosine,
            ngram: components.ngram,
            score,
        }
    }
}
