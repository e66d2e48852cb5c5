//! Paragraph-boundary text chunker.
//!
//! Splits file text into [`Chunk`]s that respect a configurable `max_tokens`
//! limit. Splitting occurs on paragraph boundaries (`\n\n`); a paragraph
//! longer than the limit is hard-split at the last newline or space that fits.
//!
//! Each chunk carries a SHA-256 hash of its text so re-ingested content can
//! be compared with what is stored.

use sha2::{Digest, Sha256};

/// Approximate chars-per-token ratio.
const CHARS_PER_TOKEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
    pub hash: String,
}

/// Split text into chunks on paragraph boundaries, respecting max_tokens.
///
/// Returns chunks with contiguous indices starting at 0. Blank input yields
/// no chunks.
pub fn chunk_text(text: &str, max_tokens: usize) -> Vec<Chunk> {
    let max_chars = (max_tokens * CHARS_PER_TOKEN).max(1);

    let mut pieces: Vec<String> = Vec::new();
    let mut current_buf = String::new();

    for para in text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        let would_be = if current_buf.is_empty() {
            trimmed.len()
        } else {
            current_buf.len() + 2 + trimmed.len()
        };

        if would_be > max_chars && !current_buf.is_empty() {
            pieces.push(std::mem::take(&mut current_buf));
        }

        if trimmed.len() > max_chars {
            let mut remaining = trimmed;
            while !remaining.is_empty() {
                let split_at = split_point(remaining, max_chars);
                let piece = remaining[..split_at].trim();
                if !piece.is_empty() {
                    pieces.push(piece.to_string());
                }
                remaining = &remaining[split_at..];
            }
        } else {
            if !current_buf.is_empty() {
                current_buf.push_str("\n\n");
            }
            current_buf.push_str(trimmed);
        }
    }

    if !current_buf.is_empty() {
        pieces.push(current_buf);
    }

    pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            index,
            hash: sha256_hex(&text),
            text,
        })
        .collect()
}

/// Byte offset at which to cut `s` so the head is at most `max_chars` bytes,
/// preferring a newline or space and never splitting a UTF-8 sequence.
fn split_point(s: &str, max_chars: usize) -> usize {
    if s.len() <= max_chars {
        return s.len();
    }

    let mut limit = max_chars;
    while !s.is_char_boundary(limit) {
        limit -= 1;
    }
    if limit == 0 {
        // First character is wider than the limit.
        return s.chars().next().map_or(s.len(), char::len_utf8);
    }

    let head = &s[..limit];
    head.rfind('\n')
        .or_else(|| head.rfind(' '))
        .map(|pos| pos + 1)
        .unwrap_or(limit)
}

pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_text("Hello, world!", 700);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "Hello, world!");
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", 700).is_empty());
        assert!(chunk_text("\n\n  \n\n", 700).is_empty());
    }

    #[test]
    fn test_multiple_paragraphs_under_limit() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = chunk_text(text, 700);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.contains("First paragraph."));
        assert!(chunks[0].text.contains("Third paragraph."));
    }

    #[test]
    fn test_chunk_indices_contiguous() {
        let text = (0..50)
            .map(|i| format!("Paragraph number {}.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_text(&text, 10);
        assert!(chunks.len() > 1);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i, "Index mismatch at position {}", i);
            assert!(c.text.len() <= 40);
        }
    }

    #[test]
    fn test_long_paragraph_hard_split() {
        let text = "word ".repeat(100);
        let chunks = chunk_text(&text, 5);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.text.len() <= 20));
    }

    #[test]
    fn test_multibyte_split_does_not_panic() {
        let text = "é".repeat(50);
        let chunks = chunk_text(&text, 1);
        assert_eq!(chunks.iter().map(|c| c.text.as_str()).collect::<String>(), text);
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha\n\nBeta\n\nGamma\n\nDelta";
        let c1 = chunk_text(text, 5);
        let c2 = chunk_text(text, 5);
        assert_eq!(c1, c2);
        assert_eq!(c1[0].hash, sha256_hex(&c1[0].text));
    }
}
