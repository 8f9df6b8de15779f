//! Byte to character offset conversion. Regex matches report byte offsets;
//! mentions store character offsets.

use nexus_core::models::Span;

pub struct CharOffsets {
    byte_starts: Vec<usize>,
    byte_len: usize,
}

impl CharOffsets {
    pub fn new(text: &str) -> Self {
        Self {
            byte_starts: text.char_indices().map(|(b, _)| b).collect(),
            byte_len: text.len(),
        }
    }

    pub fn char_at(&self, byte: usize) -> usize {
        if byte >= self.byte_len {
            return self.byte_starts.len();
        }
        match self.byte_starts.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i,
        }
    }

    pub fn span(&self, start_byte: usize, end_byte: usize) -> Span {
        Span::new(self.char_at(start_byte), self.char_at(end_byte))
    }
}
