// Ranked views over scored records.
//
// Ordering is by total_score with ties broken by name and then group, so
// rankings are stable across runs regardless of scoring order.

use std::cmp::Ordering;

use crate::scoring::record::RecordScore;

fn tie_break(a: &RecordScore, b: &RecordScore) -> Ordering {
    a.name.cmp(&b.name).then_with(|| a.group.cmp(&b.group))
}

/// Highest total first.
pub fn rank_descending(scores: &[RecordScore]) -> Vec<&RecordScore> {
    let mut ranked: Vec<&RecordScore> = scores.iter().collect();
    ranked.sort_by(|a, b| {
        b.total_score
            .total_cmp(&a.total_score)
            .then_with(|| tie_break(a, b))
    });
    ranked
}

/// Lowest total first.
pub fn rank_ascending(scores: &[RecordScore]) -> Vec<&RecordScore> {
    let mut ranked: Vec<&RecordScore> = scores.iter().collect();
    ranked.sort_by(|a, b| {
        a.total_score
            .total_cmp(&b.total_score)
            .then_with(|| tie_break(a, b))
    });
    ranked
}

/// The `n` highest-scoring records.
pub fn top(scores: &[RecordScore], n: usize) -> Vec<&RecordScore> {
    let mut ranked = rank_descending(scores);
    ranked.truncate(n);
    ranked
}

/// The `n` lowest-scoring records.
pub fn bottom(scores: &[RecordScore], n: usize) -> Vec<&RecordScore> {
    let mut ranked = rank_ascending(scores);
    ranked.truncate(n);
    ranked
}
