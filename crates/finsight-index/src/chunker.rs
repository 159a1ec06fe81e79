//! Text splitting for ingestion
//!
//! Documents are cut into fixed-size overlapping windows before embedding.
//! The window advances by `chunk_size - overlap` characters so adjacent
//! chunks share context across the cut.

/// Splits document text into overlapping chunks
#[derive(Debug, Clone)]
pub struct Chunker {
    /// Maximum chunk length in characters
    chunk_size: usize,
    /// Characters shared between adjacent chunks
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

impl Chunker {
    /// Create a chunker with the given window size and overlap
    ///
    /// The overlap is clamped below the chunk size so the window always
    /// advances.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    /// Split a document into chunks
    ///
    /// Operates on char boundaries, so multi-byte text never splits mid
    /// character. Whitespace-only chunks are dropped.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }

        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let chunk: String = chars[start..end].iter().collect();
            if !chunk.trim().is_empty() {
                chunks.push(chunk);
            }
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}
