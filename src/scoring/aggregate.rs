// Magnitude-weighted aggregation of signed category scores.
//
// Each score is weighted by its own absolute value:
//
//   aggregate = Σ s·|s| / Σ |s|
//
// A strong match in one category dominates many weak ones, and the result
// keeps the sign of the dominant scores.

/// Whether `scores` carry no weight at all (every score is zero, or there
/// are none), leaving the weighted mean undefined.
pub fn is_zero_weight(scores: &[f64]) -> bool {
    let weight: f64 = scores.iter().map(|s| s.abs()).sum();
    weight <= 0.0 || !weight.is_finite()
}

/// Weighted mean of `scores` by magnitude, or `None` when it is undefined.
pub fn weighted_by_magnitude(scores: &[f64]) -> Option<f64> {
    if is_zero_weight(scores) {
        return None;
    }
    let weight: f64 = scores.iter().map(|s| s.abs()).sum();
    let weighted: f64 = scores.iter().map(|s| s * s.abs()).sum();
    Some(weighted / weight)
}

/// Aggregate score for one taxonomy; 0.0 when undefined.
pub fn aggregate(scores: &[f64]) -> f64 {
    weighted_by_magnitude(scores).unwrap_or(0.0)
}
