/// Maps byte offsets of a string to character (Unicode scalar) offsets
#[derive(Debug, Clone)]
pub struct CharOffsets {
    boundaries: Vec<usize>,
}

impl CharOffsets {
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            boundaries: text.char_indices().map(|(i, _)| i).collect(),
        }
    }

    /// Character index of the char starting at or after `byte`
    #[must_use]
    pub fn char_index(&self, byte: usize) -> usize {
        self.boundaries.partition_point(|&b| b < byte)
    }

    /// Number of characters in the text
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.boundaries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_offsets_are_identity() {
        let offsets = CharOffsets::new("hello");
        assert_eq!(offsets.char_index(0), 0);
        assert_eq!(offsets.char_index(3), 3);
        assert_eq!(offsets.char_index(5), 5);
    }

    #[test]
    fn multibyte_offsets_count_chars() {
        let text = "Grüße, Zoë";
        let offsets = CharOffsets::new(text);
        let zoe = text.find("Zoë").unwrap();
        assert_eq!(offsets.char_index(zoe), 7);
        assert_eq!(offsets.char_index(text.len()), 10);
        assert_eq!(offsets.char_len(), 10);
    }
}
