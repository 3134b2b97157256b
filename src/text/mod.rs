// Lexical text handling: normalization and fuzzy n-gram phrase matching.

pub mod ngram;
pub mod normalize;
