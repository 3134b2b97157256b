// Batch scoring pipeline.
//
// 1. Embed every category once (a failure here aborts the run)
// 2. For each group, score its records with bounded concurrency
// 3. Summarize total scores per group and overall
//
// Records are independent, so the only shared state is the read-only
// prepared taxonomies, the run config, and the provider. A provider error
// on a single record never aborts the batch: that record is scored without
// its embedding and flagged.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::embeddings::traits::EmbeddingProvider;
use crate::records::group::{ensure_unique_groups, RecordGroup};
use crate::records::Record;
use crate::scoring::category::{PreparedCategory, PreparedTaxonomies};
use crate::scoring::record::{score_text, RecordScore, ScoreFlag};
use crate::summary::{describe, Describe};
use crate::taxonomy::RunConfig;

/// Knobs for a batch run that don't affect scores.
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Records embedded concurrently within a group.
    pub concurrency: usize,
    /// Draw a progress bar per group.
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            show_progress: false,
        }
    }
}

/// Scores for one group, in input order.
#[derive(Debug, Clone, Serialize)]
pub struct GroupResult {
    pub group: String,
    pub scores: Vec<RecordScore>,
    /// Statistics of total_score; `None` for an empty group.
    pub summary: Option<Describe>,
}

/// Settings a run was made with, written next to its results.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetadata {
    pub model: String,
    pub dimension: usize,
    pub cosine_weight: f64,
    pub ngram_weight: f64,
    pub max_ngram: usize,
    pub min_similarity: f64,
    pub target_categories: usize,
    pub avoid_categories: usize,
    pub records: usize,
    pub provider_failures: usize,
    pub scored_at: DateTime<Utc>,
}

/// Everything a batch run produces.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub groups: Vec<GroupResult>,
    pub overall: Option<Describe>,
    pub metadata: RunMetadata,
}

impl BatchOutcome {
    /// Every record score, concatenated in group order.
    pub fn all_scores(&self) -> Vec<RecordScore> {
        self.groups
            .iter()
            .flat_map(|g| g.scores.iter().cloned())
            .collect()
    }
}

/// Embed every category of the run once.
pub async fn prepare(config: &RunConfig, provider: &dyn EmbeddingProvider) -> Result<PreparedTaxonomies> {
    let mut categories = Vec::new();

    for (polarity, category) in config.categories() {
        let text = category.embedding_text();
        let embedding = provider
            .embed(Some(&text))
            .await
            .with_context(|| format!("Failed to embed category '{}'", category.name))?;
        debug!(category = %category.name, %polarity, "Embedded category");
        categories.push(PreparedCategory {
            category: category.clone(),
            polarity,
            embedding,
        });
    }

    info!(
        categories = categories.len(),
        model = provider.model_name(),
        "Prepared category embeddings"
    );

    Ok(PreparedTaxonomies {
        categories,
        dimension: provider.dimension(),
    })
}

/// Score one record. Never fails.
///
/// The combined text is embedded once and reused for every category. If
/// the provider fails, the record is scored with a zero vector (lexical
/// signal only) and flagged.
pub async fn score_record(
    record: &Record,
    group: &str,
    prepared: &PreparedTaxonomies,
    config: &RunConfig,
    provider: &dyn EmbeddingProvider,
) -> RecordScore {
    let text = record.combined_text(config.fields_for_group(group));

    let (embedding, provider_error) = match provider.embed(Some(&text)).await {
        Ok(embedding) => (embedding, None),
        Err(e) => {
            warn!(
                name = %record.name,
                group,
                error = %e,
                "Embedding failed, scoring without it"
            );
            (vec![0.0; prepared.dimension], Some(format!("{e:#}")))
        }
    };

    let mut score = score_text(&record.name, group, &text, &embedding, prepared, config);
    if let Some(error) = provider_error {
        score.mark_provider_failure(error);
    }
    score
}

/// Score every record of a group, keeping input order.
pub async fn score_group(
    group: &RecordGroup,
    prepared: &PreparedTaxonomies,
    config: &RunConfig,
    provider: &dyn EmbeddingProvider,
    options: BatchOptions,
) -> Result<Vec<RecordScore>> {
    let pb = if options.show_progress {
        let pb = ProgressBar::new(group.records.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  {msg:>12} [{bar:30}] {pos}/{len} ({eta})")
                .context("Invalid progress bar template")?,
        );
        pb.set_message(group.group.clone());
        pb
    } else {
        ProgressBar::hidden()
    };

    let scores: Vec<RecordScore> = stream::iter(group.records.iter().map(|record| {
        let pb = &pb;
        async move {
            let score = score_record(record, &group.group, prepared, config, provider).await;
            pb.inc(1);
            score
        }
    }))
    .buffered(options.concurrency.max(1))
    .collect()
    .await;

    pb.finish_and_clear();

    let failures = count_flag(&scores, ScoreFlag::ProviderFailure);
    info!(
        group = %group.group,
        records = scores.len(),
        provider_failures = failures,
        "Scored group"
    );
    Ok(scores)
}

/// Prepare once, score every group, and summarize.
pub async fn run(
    groups: &[RecordGroup],
    config: &RunConfig,
    provider: &dyn EmbeddingProvider,
    options: BatchOptions,
) -> Result<BatchOutcome> {
    config.validate()?;
    ensure_unique_groups(groups)?;
    let prepared = prepare(config, provider).await?;

    let mut results = Vec::with_capacity(groups.len());
    for group in groups {
        let scores = score_group(group, &prepared, config, provider, options).await?;
        let totals: Vec<f64> = scores.iter().map(|s| s.total_score).collect();
        results.push(GroupResult {
            group: group.group.clone(),
            summary: describe(&totals),
            scores,
        });
    }

    let all_totals: Vec<f64> = results
        .iter()
        .flat_map(|g| g.scores.iter().map(|s| s.total_score))
        .collect();
    let provider_failures: usize = results
        .iter()
        .map(|g| count_flag(&g.scores, ScoreFlag::ProviderFailure))
        .sum();

    let metadata = RunMetadata {
        model: provider.model_name().to_string(),
        dimension: provider.dimension(),
        cosine_weight: config.cosine_weight,
        ngram_weight: config.ngram_weight,
        max_ngram: config.max_ngram,
        min_similarity: config.min_similarity,
        target_categories: config.target.categories.len(),
        avoid_categories: config.avoid.categories.len(),
        records: all_totals.len(),
        provider_failures,
        scored_at: Utc::now(),
    };

    if provider_failures > 0 {
        warn!(provider_failures, "Some records were scored without embeddings");
    }

    Ok(BatchOutcome {
        groups: results,
        overall: describe(&all_totals),
        metadata,
    })
}

fn count_flag(scores: &[RecordScore], flag: ScoreFlag) -> usize {
    scores.iter().filter(|s| s.has_flag(flag)).count()
}
