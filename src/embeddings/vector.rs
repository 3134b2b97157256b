// Vector helpers: mean pooling and cosine similarity.

/// Norms below this are treated as zero.
const ZERO_NORM: f64 = f64::EPSILON;

/// Compute the element-wise mean of several embedding vectors.
///
/// Used to pool the per-chunk vectors of a long text into one vector.
/// Returns the zero vector of length `dim` when there is nothing to average.
/// Components past `dim` are ignored; short inputs contribute zeros.
pub fn mean_embedding(embeddings: &[Vec<f64>], dim: usize) -> Vec<f64> {
    let mut mean = vec![0.0_f64; dim];
    if embeddings.is_empty() {
        return mean;
    }

    for emb in embeddings {
        for (slot, &val) in mean.iter_mut().zip(emb.iter()) {
            *slot += val;
        }
    }

    let n = embeddings.len() as f64;
    for val in &mut mean {
        *val /= n;
    }
    mean
}

/// Euclidean norm of a vector.
pub fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Whether a vector has (numerically) zero length.
///
/// Cosine similarity against such a vector is undefined.
pub fn is_zero_norm(v: &[f64]) -> bool {
    norm(v) < ZERO_NORM
}

/// Cosine similarity between two embedding vectors, in [-1, 1].
///
/// Defined as 0.0 when either vector has zero norm, when the inputs are
/// empty, or when their dimensions differ. Never returns NaN.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    if is_zero_norm(a) || is_zero_norm(b) {
        return 0.0;
    }
    let denom = norm(a) * norm(b);
    if denom == 0.0 || !denom.is_finite() {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_embedding_multiple() {
        let embeddings = vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        let mean = mean_embedding(&embeddings, 3);
        assert_eq!(mean, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_mean_embedding_empty_is_zero() {
        let mean = mean_embedding(&[], 4);
        assert_eq!(mean, vec![0.0; 4]);
    }

    #[test]
    fn test_mean_embedding_pads_short_vectors() {
        let mean = mean_embedding(&[vec![2.0]], 3);
        assert_eq!(mean, vec![2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_cosine_identical() {
        let a = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_cosine_opposite_is_negative() {
        let a = vec![1.0, 0.0];
        let b = vec![-2.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_cosine_orthogonal() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-10);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero() {
        let zero = vec![0.0; 3];
        let v = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
        assert!(is_zero_norm(&zero));
        assert!(!is_zero_norm(&v));
    }

    #[test]
    fn test_cosine_mismatched_dimensions() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_tiny_vectors_still_defined() {
        let v = [1e-9];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-12);
        let w = [3e-9, -4e-9];
        assert!((cosine_similarity(&w, &w) - 1.0).abs() < 1e-12);
    }
}
