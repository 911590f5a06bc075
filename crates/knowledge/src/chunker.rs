//! Text chunking with configurable size and overlap.

/// A window over extracted text, measured in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub position: usize,
    pub start: usize,
    pub end: usize,
    pub text: String,
}

/// Chunk text into overlapping segments.
///
/// Windows are `chunk_size` characters long and advance by
/// `chunk_size - overlap`. The last window ends exactly at the end of the
/// text. Offsets count Unicode scalar values, not bytes, and chunk text is
/// kept verbatim so that `start..end` always indexes the source text.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<TextChunk> {
    if text.is_empty() || chunk_size == 0 {
        return vec![];
    }

    // Byte offset of every character boundary, including the end of text
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = boundaries.len() - 1;

    let step = if chunk_size > overlap {
        chunk_size - overlap
    } else {
        chunk_size
    };

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(total);

        chunks.push(TextChunk {
            position: chunks.len(),
            start,
            end,
            text: text[boundaries[start]..boundaries[end]].to_string(),
        });

        if end == total {
            break;
        }
        start += step;
    }

    tracing::debug!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(chunks: &[TextChunk]) -> Vec<(usize, usize)> {
        chunks.iter().map(|c| (c.start, c.end)).collect()
    }

    #[test]
    fn test_thousand_chars_with_overlap() {
        let text = "x".repeat(1000);
        let chunks = chunk_text(&text, 500, 100);

        assert_eq!(spans(&chunks), vec![(0, 500), (400, 900), (800, 1000)]);
        assert_eq!(chunks[2].text.len(), 200);
    }

    #[test]
    fn test_chunk_text_no_overlap() {
        let text = "a".repeat(300);
        let chunks = chunk_text(&text, 100, 0);

        assert_eq!(spans(&chunks), vec![(0, 100), (100, 200), (200, 300)]);
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("short", 1000, 200);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short");
        assert_eq!((chunks[0].start, chunks[0].end), (0, 5));
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("", 100, 10).is_empty());
    }

    #[test]
    fn test_positions_are_sequential() {
        let text = "abcdefghijklmnopqrstuvwxyz".repeat(10);
        let chunks = chunk_text(&text, 50, 10);

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.position, i);
        }
    }

    #[test]
    fn test_chunks_reconstruct_source() {
        let text: String = (0..737).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunk_text(&text, 120, 30);

        let mut rebuilt = chunks[0].text.clone();
        for pair in chunks.windows(2) {
            let shared = pair[0].end - pair[1].start;
            rebuilt.extend(pair[1].text.chars().skip(shared));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_multibyte_characters_counted_as_chars() {
        let text = "é".repeat(10);
        let chunks = chunk_text(&text, 4, 1);

        assert_eq!(spans(&chunks), vec![(0, 4), (3, 7), (6, 10)]);
        assert!(chunks.iter().all(|c| c.text.chars().all(|ch| ch == 'é')));
    }

    #[test]
    fn test_whitespace_is_preserved() {
        let chunks = chunk_text("  lead and trail  ", 100, 0);
        assert_eq!(chunks[0].text, "  lead and trail  ");
    }
}
