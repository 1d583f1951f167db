//! Pure text algorithms used by the validators
//!
//! All functions here operate on byte offsets that fall on `char` boundaries.
//! [`CharOffsets`] converts them to the character offsets reported to callers.

mod offsets;
mod preface;
mod ranges;
mod sentences;
mod spans;

pub use offsets::CharOffsets;
pub use preface::{GENERIC_PREFACE_WORDS, is_generic_preface_span};
pub use ranges::{TextRange, join_preserving_spacing, mask_ranges, redact_ranges, remove_ranges};
pub use sentences::{Sentence, sentences_with_offsets};
pub use spans::{apply_redactions, merge_spans};
