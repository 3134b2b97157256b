// Unit tests for scoring, aggregation, ranking, and summary statistics.
//
// Tests isolated pure functions: cosine edge cases, the magnitude-weighted
// aggregate, per-category combination, record scoring from a fixed
// embedding, ranking order and tie-breaks, and describe().

use biorank::embeddings::vector::{cosine_similarity, is_zero_norm, mean_embedding};
use biorank::pipeline::{bottom, rank_ascending, rank_descending, top};
use biorank::scoring::aggregate::{aggregate, is_zero_weight, weighted_by_magnitude};
use biorank::scoring::category::{
    score_category, CategoryScore, PreparedCategory, PreparedTaxonomies, ScoreComponents,
};
use biorank::scoring::record::{score_text, RecordScore, ScoreFlag};
use biorank::summary::describe;
use biorank::taxonomy::{Category, Polarity, RunConfig, Taxonomy};
use biorank::text::ngram::NgramMatcher;

fn record(name: &str, group: &str, total: f64) -> RecordScore {
    RecordScore {
        name: name.to_string(),
        group: group.to_string(),
        target_score: total.max(0.0),
        avoid_score: total.min(0.0),
        total_score: total,
        categories: Vec::new(),
        flags: Vec::new(),
        provider_error: None,
    }
}

fn war_race_config() -> RunConfig {
    RunConfig::new(
        Taxonomy {
            magnitude: 1.0,
            categories: vec![Category::new("war", &["war", "military"])],
        },
        Taxonomy {
            magnitude: -1.25,
            categories: vec![Category::new("race", &["race", "gender"])],
        },
    )
}

fn prepared_with(config: &RunConfig, embeddings: &[Vec<f64>]) -> PreparedTaxonomies {
    PreparedTaxonomies {
        categories: config
            .categories()
            .zip(embeddings)
            .map(|((polarity, category), embedding)| PreparedCategory {
                category: category.clone(),
                polarity,
                embedding: embedding.clone(),
            })
            .collect(),
        dimension: embeddings.first().map(Vec::len).unwrap_or(0),
    }
}

// ============================================================
// Vector helpers
// ============================================================

#[test]
fn cosine_self_is_one() {
    let v = vec![0.3, -1.2, 4.0, 0.01];
    assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-12);
}

#[test]
fn cosine_zero_vector_is_zero() {
    let zero = vec![0.0; 4];
    let v = vec![1.0, 2.0, 3.0, 4.0];
    assert_eq!(cosine_similarity(&zero, &v), 0.0);
    assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    assert!(is_zero_norm(&zero));
}

#[test]
fn cosine_opposite_is_minus_one() {
    let v = vec![1.0, 2.0];
    let w = vec![-1.0, -2.0];
    assert!((cosine_similarity(&v, &w) + 1.0).abs() < 1e-12);
}

#[test]
fn cosine_mismatched_dims_is_zero() {
    assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
}

#[test]
fn cosine_small_nonzero_vector_is_one() {
    let v = vec![1e-9];
    assert!(!is_zero_norm(&v));
    assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-12);
}

#[test]
fn mean_embedding_of_nothing_is_zero() {
    assert_eq!(mean_embedding(&[], 3), vec![0.0; 3]);
}

// ============================================================
// Aggregation
// ============================================================

#[test]
fn aggregate_weights_by_magnitude() {
    // (0.8*0.8 + 0.2*0.2) / 1.0 = 0.68
    assert!((aggregate(&[0.8, 0.2]) - 0.68).abs() < 1e-12);
}

#[test]
fn aggregate_negative_scores_stay_negative() {
    let result = aggregate(&[-0.5, -1.0, 0.0]);
    // (-0.25 - 1.0) / 1.5
    assert!((result + 1.25 / 1.5).abs() < 1e-12, "got {result}");
}

#[test]
fn aggregate_zero_weight_falls_back() {
    assert_eq!(weighted_by_magnitude(&[0.0, -0.0]), None);
    assert_eq!(aggregate(&[]), 0.0);
    assert!(is_zero_weight(&[0.0, -0.0]));
}

// ============================================================
// Category scoring
// ============================================================

#[test]
fn category_score_sign_follows_polarity() {
    let config = war_race_config();
    let components = ScoreComponents {
        cosine: 0.4,
        ngram: 0.9,
        degenerate: false,
    };
    let prepared = prepared_with(&config, &[vec![1.0], vec![1.0]]);

    let target = CategoryScore::new(&prepared.categories[0], components, &config);
    let avoid = CategoryScore::new(&prepared.categories[1], components, &config);

    let base = 0.4 * 0.35 + 0.9 * 0.65;
    assert!((target.score - base).abs() < 1e-12);
    assert!((avoid.score + base * 1.25).abs() < 1e-12);
    assert_eq!(avoid.polarity, Polarity::Avoid);
}

#[test]
fn category_ngram_takes_best_phrase() {
    let cat = PreparedCategory {
        category: Category::new("cold_war", &["soviet union", "cold war", "detente"]),
        polarity: Polarity::Target,
        embedding: vec![1.0, 0.0],
    };
    let components = score_category(
        &[0.0, 1.0],
        "a historian of the cold war",
        &cat,
        &NgramMatcher::default(),
    );
    assert!((components.ngram - 1.0).abs() < 1e-9);
    assert!(components.cosine.abs() < 1e-12);
    assert!(!components.degenerate);
}

// ============================================================
// Record scoring from a fixed embedding
// ============================================================

#[test]
fn lexical_only_scenario() {
    let mut config = war_race_config();
    config.cosine_weight = 0.0;
    config.ngram_weight = 1.0;
    let prepared = prepared_with(&config, &[vec![1.0, 0.0], vec![0.0, 1.0]]);

    let score = score_text(
        "Expert",
        "yale",
        "expert in military history and war studies",
        &[0.6, 0.8],
        &prepared,
        &config,
    );

    let war = score.category("war").unwrap();
    let race = score.category("race").unwrap();
    assert!(war.ngram >= 0.8, "war ngram {}", war.ngram);
    assert!(race.ngram.abs() < 1e-9, "race ngram {}", race.ngram);
    assert!(score.target_score > 0.0);
    assert_eq!(score.avoid_score, 0.0);
    assert_eq!(score.total_score, score.target_score);
    assert!(score.has_flag(ScoreFlag::ZeroWeightAvoid));
}

#[test]
fn empty_taxonomy_is_zero_weight() {
    let mut config = war_race_config();
    config.avoid.categories.clear();
    let prepared = prepared_with(&config, &[vec![1.0, 0.0]]);
    let score = score_text("A", "g", "war", &[1.0, 0.0], &prepared, &config);
    assert_eq!(score.avoid_score, 0.0);
    assert!(score.has_flag(ScoreFlag::ZeroWeightAvoid));
    assert!(score.total_score > 0.0);
}

#[test]
fn row_has_one_column_per_category() {
    let config = RunConfig::builtin().unwrap();
    let dims = 4;
    let embeddings: Vec<Vec<f64>> = config.categories().map(|_| vec![1.0; dims]).collect();
    let prepared = prepared_with(&config, &embeddings);
    let score = score_text("A", "g", "military history", &[1.0; 4], &prepared, &config);

    let row = score.to_row();
    for (_, category) in config.categories() {
        assert!(
            row.contains_key(&category.score_column()),
            "missing {}",
            category.score_column()
        );
    }
    assert_eq!(row.len(), 5 + config.categories().count() + 1);
}

#[test]
fn category_named_like_a_total_column_is_rejected() {
    let mut config = war_race_config();
    config.target.categories[0].name = "total".to_string();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("total_score"), "{err}");
}

#[test]
fn row_totals_are_not_overwritten_by_categories() {
    let mut config = war_race_config();
    config.cosine_weight = 0.0;
    config.ngram_weight = 1.0;
    config.validate().unwrap();
    let prepared = prepared_with(&config, &[vec![1.0, 0.0], vec![0.0, 1.0]]);
    let score = score_text("A", "g", "war race", &[1.0, 0.0], &prepared, &config);

    let row = score.to_row();
    assert_eq!(row["total_score"], score.total_score);
    assert_eq!(row["target_score"], score.target_score);
    assert_eq!(row["avoid_score"], score.avoid_score);
    assert_eq!(row["war_score"], score.category("war").unwrap().score);
}

// ============================================================
// Ranking
// ============================================================

#[test]
fn rank_descending_orders_by_total() {
    let scores = vec![record("b", "x", 0.1), record("a", "x", 0.9), record("c", "y", -0.4)];
    let names: Vec<&str> = rank_descending(&scores).iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn rank_ascending_orders_by_total() {
    let scores = vec![record("b", "x", 0.1), record("a", "x", 0.9), record("c", "y", -0.4)];
    let names: Vec<&str> = rank_ascending(&scores).iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["c", "b", "a"]);
}

#[test]
fn ties_break_by_name_then_group() {
    let scores = vec![
        record("Zed", "a", 0.5),
        record("Amy", "b", 0.5),
        record("Amy", "a", 0.5),
    ];
    let ranked: Vec<(&str, &str)> = rank_descending(&scores)
        .iter()
        .map(|s| (s.name.as_str(), s.group.as_str()))
        .collect();
    assert_eq!(ranked, vec![("Amy", "a"), ("Amy", "b"), ("Zed", "a")]);
}

#[test]
fn top_and_bottom_truncate() {
    let scores: Vec<RecordScore> = (0..10)
        .map(|i| record(&format!("r{i}"), "g", i as f64 / 10.0))
        .collect();
    let best = top(&scores, 3);
    let worst = bottom(&scores, 2);
    assert_eq!(best.len(), 3);
    assert_eq!(best[0].name, "r9");
    assert_eq!(worst.len(), 2);
    assert_eq!(worst[0].name, "r0");
    assert_eq!(top(&scores, 50).len(), 10);
}

// ============================================================
// describe()
// ============================================================

#[test]
fn describe_matches_hand_computed_values() {
    let d = describe(&[-1.0, 0.0, 1.0, 2.0, 3.0]).unwrap();
    assert_eq!(d.count, 5);
    assert!((d.mean - 1.0).abs() < 1e-12);
    assert!((d.std.unwrap() - 2.5_f64.sqrt()).abs() < 1e-12);
    assert_eq!(d.min, -1.0);
    assert_eq!(d.p25, 0.0);
    assert_eq!(d.p50, 1.0);
    assert_eq!(d.p75, 2.0);
    assert_eq!(d.max, 3.0);
}
