use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Clamp both ends into `[0, len]`
    #[must_use]
    pub fn clamp_to(self, len: usize) -> Self {
        Self {
            start: self.start.min(len),
            end: self.end.min(len),
        }
    }
}

fn slice(text: &str, start: usize, end: usize) -> &str {
    if start >= end {
        return "";
    }
    text.get(start..end).unwrap_or_default()
}

/// Replace each range with `token`, skipping ranges that overlap an earlier one
#[must_use]
pub fn redact_ranges(text: &str, ranges: &[TextRange], token: &str) -> String {
    if ranges.is_empty() {
        return text.to_string();
    }

    let mut sorted: Vec<TextRange> = ranges.iter().map(|r| r.clamp_to(text.len())).collect();
    sorted.sort_by_key(|r| r.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for range in sorted {
        if range.start < cursor {
            continue;
        }
        out.push_str(slice(text, cursor, range.start));
        out.push_str(token);
        cursor = range.end.max(range.start);
    }
    out.push_str(slice(text, cursor, text.len()));
    out
}

/// Delete each range, keeping everything between them verbatim
#[must_use]
pub fn remove_ranges(text: &str, ranges: &[TextRange]) -> String {
    redact_ranges(text, ranges, "")
}

/// Overwrite every character inside the ranges with `mask`, keeping character counts
///
/// Whitespace inside a range is kept. Runs in one pass over the text once
/// the ranges are sorted.
#[must_use]
pub fn mask_ranges(text: &str, ranges: &[TextRange], mask: char) -> String {
    let mut sorted = ranges.to_vec();
    sorted.sort_unstable_by_key(|r| r.start);

    let mut out = String::with_capacity(text.len());
    let mut next = 0;
    let mut covered_until = 0;
    for (i, c) in text.char_indices() {
        while next < sorted.len() && sorted[next].start <= i {
            covered_until = covered_until.max(sorted[next].end);
            next += 1;
        }
        if i < covered_until && !c.is_whitespace() {
            out.push(mask);
        } else {
            out.push(c);
        }
    }
    out
}

/// Join the kept ranges with a space and collapse every whitespace run into one space
#[must_use]
pub fn join_preserving_spacing(text: &str, keep: &[TextRange]) -> String {
    keep.iter()
        .map(|r| {
            let r = r.clamp_to(text.len());
            slice(text, r.start, r.end)
        })
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
