//! Offset translation between character and byte addressing.
//!
//! Everything public in this crate speaks character offsets, but the `regex`
//! engine reports match positions as UTF-8 byte offsets. [`OffsetMap`]
//! bridges the two for one immutable source snapshot.

/// Character-boundary table for one source snapshot.
///
/// Holds the byte position of every character boundary, closed with an
/// end-of-text sentinel, so byte-to-char lookups resolve with one binary
/// search instead of rescanning the text per match.
#[derive(Debug)]
pub(crate) struct OffsetMap {
    boundaries: Vec<usize>,
}

impl OffsetMap {
    /// Build the table by one pass over `text`.
    pub(crate) fn build(text: &str) -> Self {
        let mut boundaries = Vec::with_capacity(text.len() + 1);
        boundaries.extend(text.char_indices().map(|(byte, _)| byte));
        boundaries.push(text.len());
        Self { boundaries }
    }

    /// Character offset of the boundary at `byte_offset`.
    ///
    /// Byte offsets produced by the regex engine always land on character
    /// boundaries; anything past the end of the text clamps to the last
    /// boundary.
    pub(crate) fn char_at(&self, byte_offset: usize) -> usize {
        let clamped = byte_offset.min(self.text_bytes());
        self.boundaries.partition_point(|&boundary| boundary < clamped)
    }

    fn text_bytes(&self) -> usize {
        self.boundaries.last().copied().unwrap_or(0)
    }
}
