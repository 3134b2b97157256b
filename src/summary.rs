// Descriptive statistics over a column of scores.
//
// Matches the usual count/mean/std/min/quartiles/max summary: std is the
// sample standard deviation (n - 1) and quartiles interpolate linearly
// between order statistics.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    /// `None` for fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    #[serde(rename = "25%")]
    pub p25: f64,
    #[serde(rename = "50%")]
    pub p50: f64,
    #[serde(rename = "75%")]
    pub p75: f64,
    pub max: f64,
}

/// Summarize `values`. Returns `None` for an empty slice.
pub fn describe(values: &[f64]) -> Option<Describe> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let mean = sorted.iter().sum::<f64>() / n as f64;
    let std = (n > 1).then(|| {
        let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    });

    Some(Describe {
        count: n,
        mean,
        std,
        min: sorted[0],
        p25: quantile(&sorted, 0.25),
        p50: quantile(&sorted, 0.50),
        p75: quantile(&sorted, 0.75),
        max: sorted[n - 1],
    })
}

/// Linear-interpolated quantile of already sorted, non-empty data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_none() {
        assert!(describe(&[]).is_none());
    }

    #[test]
    fn test_single_value() {
        let d = describe(&[2.5]).unwrap();
        assert_eq!(d.count, 1);
        assert_eq!(d.std, None);
        assert_eq!(d.min, 2.5);
        assert_eq!(d.p50, 2.5);
        assert_eq!(d.max, 2.5);
    }

    #[test]
    fn test_quartiles_interpolate() {
        let d = describe(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(d.mean, 2.5);
        // positions 0.75, 1.5, 2.25 over [1, 2, 3, 4]
        assert!((d.p25 - 1.75).abs() < 1e-12);
        assert!((d.p50 - 2.5).abs() < 1e-12);
        assert!((d.p75 - 3.25).abs() < 1e-12);
        assert_eq!(d.min, 1.0);
        assert_eq!(d.max, 4.0);
    }

    #[test]
    fn test_sample_std() {
        let d = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        // population std is 2.0; sample std is sqrt(32/7)
        let expected = (32.0_f64 / 7.0).sqrt();
        assert!((d.std.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_serializes_percent_keys() {
        let d = describe(&[1.0, 2.0]).unwrap();
        let json = serde_json::to_value(&d).unwrap();
        assert!(json.get("25%").is_some());
        assert!(json.get("std").is_some());
    }
}
