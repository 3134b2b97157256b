// Text normalization for lexical comparison.
//
// Lower-cases and strips everything that isn't a word character or
// whitespace. Word characters are Unicode alphanumerics plus underscore, so
// accented names and non-Latin scripts survive intact.

/// Canonicalize text for lexical comparison.
///
/// The output contains only lower-case word characters and whitespace.
/// Applying it twice gives the same result as applying it once.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| is_word_char(*c) || c.is_whitespace())
        .collect()
}

/// Normalize an optional value, treating a missing one as empty text.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
