// Length-weighted fuzzy n-gram matching.
//
// Scores how well a short query phrase is lexically present in a longer
// document. Both sides are normalized and split into word n-grams for
// n = 1..=max_n. Every query n-gram is matched against its closest document
// n-gram of the same length using a Levenshtein ratio (0-100), and the
// matches are summed with weight n². A three-word phrase found verbatim
// therefore outweighs three scattered single-word hits.
//
//   score = Σ_n Σ_q best(q) · n²  /  Σ_n 100 · |q_n| · n²

use super::normalize::normalize;

/// Default longest n-gram considered.
pub const DEFAULT_MAX_N: usize = 3;

/// Split already-normalized text into contiguous word windows of length `n`.
///
/// Returns an empty list when `n` is zero or the text has fewer than `n` words.
pub fn ngrams(text: &str, n: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if n == 0 || words.len() < n {
        return Vec::new();
    }
    words.windows(n).map(|window| window.join(" ")).collect()
}

/// Edit-similarity ratio between two strings on a 0-100 scale.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// A document's n-grams, computed once and matched against many queries.
///
/// Category scoring checks every phrase of every category against the same
/// record text, so the document side is tokenized only once per record.
#[derive(Debug, Clone)]
pub struct DocumentNgrams {
    /// `by_n[n - 1]` holds the document's n-grams of length n.
    by_n: Vec<Vec<String>>,
}

impl DocumentNgrams {
    pub fn new(document: &str, max_n: usize) -> Self {
        let normalized = normalize(document);
        let by_n = (1..=max_n).map(|n| ngrams(&normalized, n)).collect();
        Self { by_n }
    }

    pub fn max_n(&self) -> usize {
        self.by_n.len()
    }

    fn of_len(&self, n: usize) -> &[String] {
        self.by_n.get(n - 1).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Fuzzy phrase matcher with an optional per-n-gram noise floor.
///
/// A best match below `min_similarity` (0-100) contributes nothing. With the
/// floor at 0 this is exactly [`ngram_score`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NgramMatcher {
    pub max_n: usize,
    pub min_similarity: f64,
}

impl Default for NgramMatcher {
    fn default() -> Self {
        Self {
            max_n: DEFAULT_MAX_N,
            min_similarity: 0.0,
        }
    }
}

impl NgramMatcher {
    /// Score `query` against `document`. Returns a value in [0, 1].
    pub fn score(&self, query: &str, document: &str) -> f64 {
        let doc = DocumentNgrams::new(document, self.max_n);
        self.score_against(query, &doc)
    }

    /// Score `query` against a pre-tokenized document.
    ///
    /// An empty query has no attainable score and yields 0.0.
    pub fn score_against(&self, query: &str, doc: &DocumentNgrams) -> f64 {
        let query = normalize(query);
        let max_n = self.max_n.min(doc.max_n());

        let mut score = 0.0;
        let mut max_score = 0.0;

        for n in 1..=max_n {
            let weight = (n * n) as f64;
            let query_grams = ngrams(&query, n);
            let doc_grams = doc.of_len(n);

            for q_gram in &query_grams {
                let best = doc_grams
                    .iter()
                    .map(|d_gram| similarity_ratio(q_gram, d_gram))
                    .fold(0.0_f64, f64::max);
                if best >= self.min_similarity {
                    score += best * weight;
                }
            }
            max_score += 100.0 * query_grams.len() as f64 * weight;
        }

        if max_score > 0.0 {
            score / max_score
        } else {
            0.0
        }
    }
}

/// Score how well `query` is lexically present in `document`, in [0, 1].
pub fn ngram_score(query: &str, document: &str, max_n: usize) -> f64 {
    NgramMatcher {
        max_n,
        min_similarity: 0.0,
    }
    .score(query, document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ngrams_windows() {
        assert_eq!(
            ngrams("war and society", 2),
            vec!["war and".to_string(), "and society".to_string()]
        );
    }

    #[test]
    fn test_ngrams_too_short() {
        assert!(ngrams("war", 2).is_empty());
        assert!(ngrams("war", 0).is_empty());
        assert!(ngrams("", 1).is_empty());
    }

    #[test]
    fn test_similarity_ratio_bounds() {
        assert!((similarity_ratio("war", "war") - 100.0).abs() < 1e-9);
        assert!(similarity_ratio("abc", "xyz").abs() < 1e-9);
    }

    #[test]
    fn test_exact_phrase_saturates() {
        let score = ngram_score("war and society", "studies war and society in europe", 3);
        assert!((score - 1.0).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_phrase_weighting_prefers_contiguous_match() {
        let contiguous = ngram_score("cold war", "historian of the cold war era", 3);
        let scattered = ngram_score("cold war", "war stories from a cold climate", 3);
        assert!(
            contiguous > scattered,
            "contiguous {contiguous} should beat scattered {scattered}"
        );
    }

    #[test]
    fn test_empty_query_and_document() {
        assert_eq!(ngram_score("", "anything", 3), 0.0);
        assert_eq!(ngram_score("war", "", 3), 0.0);
        assert_eq!(ngram_score("!!!", "war", 3), 0.0);
    }

    #[test]
    fn test_floor_drops_weak_matches() {
        let matcher = NgramMatcher {
            max_n: 3,
            min_similarity: 50.0,
        };
        // "race" vs "war" is a 25% ratio: below the floor.
        assert_eq!(matcher.score("race", "war"), 0.0);
        assert!(ngram_score("race", "war", 3) > 0.0);
    }

    #[test]
    fn test_document_ngrams_reused() {
        let doc = DocumentNgrams::new("Expert in military history", 3);
        let matcher = NgramMatcher::default();
        assert!((matcher.score_against("military", &doc) - 1.0).abs() < 1e-9);
        assert!((matcher.score_against("military history", &doc) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_n_zero_is_zero() {
        assert_eq!(ngram_score("war", "war", 0), 0.0);
    }
}
