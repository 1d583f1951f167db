//! Property-based tests for the domain text algorithms
//!
//! These tests use proptest to verify invariants across many random inputs.

use domain::{
    DetectedSpan, EntitySource, GuardVerdict, Placeholders,
    text::{
        CharOffsets, TextRange, apply_redactions, join_preserving_spacing, merge_spans,
        redact_ranges, sentences_with_offsets,
    },
};
use proptest::prelude::*;

fn span_strategy() -> impl Strategy<Value = DetectedSpan> {
    (0usize..200, 1usize..40, 0.0f64..=1.0, any::<bool>()).prop_map(
        |(start, len, score, is_pattern)| {
            let source = if is_pattern {
                EntitySource::Pattern
            } else {
                EntitySource::Semantic
            };
            DetectedSpan::new("X", start, start + len, score, source)
        },
    )
}

// ============================================================================
// Span Merge Property Tests
// ============================================================================

mod merge_tests {
    use super::*;

    proptest! {
        #[test]
        fn merged_spans_never_overlap(spans in prop::collection::vec(span_strategy(), 0..30)) {
            let merged = merge_spans(spans);
            for pair in merged.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }
        }

        #[test]
        fn merged_spans_come_from_input(spans in prop::collection::vec(span_strategy(), 0..30)) {
            let merged = merge_spans(spans.clone());
            prop_assert!(merged.len() <= spans.len());
            for span in &merged {
                prop_assert!(spans.contains(span));
            }
        }

        #[test]
        fn pattern_spans_survive_semantic_overlap(
            spans in prop::collection::vec(span_strategy(), 0..30)
        ) {
            let only_one_pattern: Vec<DetectedSpan> = spans
                .into_iter()
                .map(|mut s| { s.source = EntitySource::Semantic; s })
                .chain(std::iter::once(DetectedSpan::new("P", 50, 60, 0.1, EntitySource::Pattern)))
                .collect();
            let merged = merge_spans(only_one_pattern);
            prop_assert!(merged.iter().any(|s| s.source == EntitySource::Pattern));
        }

        #[test]
        fn merge_is_idempotent(spans in prop::collection::vec(span_strategy(), 0..30)) {
            let once = merge_spans(spans);
            let twice = merge_spans(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}

// ============================================================================
// Redaction Property Tests
// ============================================================================

mod redaction_tests {
    use super::*;

    proptest! {
        #[test]
        fn redaction_without_spans_is_identity(text in ".{0,120}") {
            prop_assert_eq!(apply_redactions(&text, &[], &Placeholders::default()), text);
        }

        #[test]
        fn redacted_text_hides_span_values(prefix in "[a-z ]{0,20}", suffix in "[a-z ]{0,20}") {
            let secret = "4111111111111111";
            let text = format!("{prefix}{secret}{suffix}");
            let span = DetectedSpan::new(
                "CREDIT_CARD",
                prefix.len(),
                prefix.len() + secret.len(),
                1.0,
                EntitySource::Pattern,
            );
            let out = apply_redactions(&text, &[span], &Placeholders::default());
            prop_assert!(!out.contains(secret));
            prop_assert_eq!(out, format!("{prefix}[REDACTED]{suffix}"));
        }

        #[test]
        fn redact_ranges_never_panics(
            text in ".{0,80}",
            ranges in prop::collection::vec((0usize..100, 0usize..100), 0..6)
        ) {
            let ranges: Vec<TextRange> = ranges
                .into_iter()
                .map(|(a, b)| TextRange::new(a.min(b), a.max(b)))
                .collect();
            let _ = redact_ranges(&text, &ranges, "[TOXIC]");
        }

        #[test]
        fn joined_text_has_no_double_spaces(text in "[a-z .!?]{0,120}") {
            let keep: Vec<TextRange> = sentences_with_offsets(&text)
                .iter()
                .map(|s| TextRange::new(s.start, s.end))
                .collect();
            let joined = join_preserving_spacing(&text, &keep);
            prop_assert!(!joined.contains("  "));
            prop_assert_eq!(joined.trim(), joined.as_str());
        }
    }
}

// ============================================================================
// Segmentation Property Tests
// ============================================================================

mod segmentation_tests {
    use super::*;

    proptest! {
        #[test]
        fn sentences_slice_the_source(text in "\\PC{0,160}") {
            for sentence in sentences_with_offsets(&text) {
                prop_assert_eq!(&text[sentence.start..sentence.end], sentence.text);
                prop_assert!(!sentence.text.is_empty());
                prop_assert_eq!(sentence.text.trim(), sentence.text);
            }
        }

        #[test]
        fn sentences_are_ordered_and_disjoint(text in "[A-Za-z .!?\n]{0,200}") {
            let sentences = sentences_with_offsets(&text);
            for pair in sentences.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }
        }

        #[test]
        fn non_blank_text_yields_sentences(text in "[A-Za-z][A-Za-z .!?]{0,100}") {
            prop_assert!(!sentences_with_offsets(&text).is_empty());
        }

        #[test]
        fn char_offsets_are_monotonic(text in "\\PC{0,80}") {
            let offsets = CharOffsets::new(&text);
            let mut previous = 0;
            for (byte, _) in text.char_indices() {
                let index = offsets.char_index(byte);
                prop_assert!(index >= previous);
                previous = index;
            }
            prop_assert_eq!(offsets.char_index(text.len()), text.chars().count());
        }
    }
}

// ============================================================================
// Guard Output Property Tests
// ============================================================================

mod guard_tests {
    use super::*;

    proptest! {
        #[test]
        fn parse_never_panics(raw in "\\PC{0,100}") {
            let _ = GuardVerdict::parse(&raw);
        }

        #[test]
        fn unsafe_output_always_has_categories(cats in "[A-Z ,;]{0,40}") {
            let verdict = GuardVerdict::parse(&format!("UNSAFE: {cats}"));
            prop_assert!(verdict.is_unsafe());
            prop_assert!(!verdict.categories().is_empty());
        }
    }
}
