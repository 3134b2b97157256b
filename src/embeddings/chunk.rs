// Word-bounded chunking for long inputs.
//
// Embedding models cap their input length, so long records are split into
// pieces of at most `max_chars` characters (counting the joining spaces),
// never breaking inside a word. Each piece is embedded separately and the
// vectors are averaged by the provider.

/// Default chunk budget, in characters.
pub const DEFAULT_CHUNK_CHARS: usize = 4000;

/// Split text into whitespace-joined chunks of at most `max_chars` characters.
///
/// A single word longer than the budget becomes a chunk of its own rather
/// than being cut. Empty or whitespace-only input produces no chunks.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let needed = if current.is_empty() {
            word_len
        } else {
            current_len + 1 + word_len
        };

        if needed > max_chars && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
            current_len = word_len;
        } else {
            current_len = needed;
        }
        current.push(word);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = chunk_text("military history of the early republic", 4000);
        assert_eq!(chunks, vec!["military history of the early republic".to_string()]);
    }

    #[test]
    fn test_splits_on_word_boundaries() {
        let chunks = chunk_text("aaa bbb ccc ddd", 7);
        assert_eq!(chunks, vec!["aaa bbb".to_string(), "ccc ddd".to_string()]);
    }

    #[test]
    fn test_chunks_respect_budget() {
        let text = "word ".repeat(500);
        for chunk in chunk_text(&text, 50) {
            assert!(chunk.chars().count() <= 50, "chunk too long: {}", chunk.len());
        }
    }

    #[test]
    fn test_oversized_word_stands_alone() {
        let chunks = chunk_text("a supercalifragilistic b", 5);
        assert_eq!(
            chunks,
            vec![
                "a".to_string(),
                "supercalifragilistic".to_string(),
                "b".to_string()
            ]
        );
    }

    #[test]
    fn test_collapses_whitespace() {
        let chunks = chunk_text("  war \t and\n society  ", 100);
        assert_eq!(chunks, vec!["war and society".to_string()]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_text("   \n ", 100).is_empty());
    }
}
