use std::cmp::Reverse;

use crate::entities::{DetectedSpan, EntitySource, Placeholders};

/// Merge candidate spans into a non-overlapping list ordered by start.
///
/// Spans are visited by `(start asc, end desc)` and compared with the last kept
/// span. On overlap a pattern span beats a semantic one; otherwise the longer
/// span wins, and the higher score breaks length ties.
#[must_use]
pub fn merge_spans(mut spans: Vec<DetectedSpan>) -> Vec<DetectedSpan> {
    spans.sort_by_key(|s| (s.start, Reverse(s.end)));

    let mut merged: Vec<DetectedSpan> = Vec::with_capacity(spans.len());
    for span in spans {
        let Some(last) = merged.last_mut() else {
            merged.push(span);
            continue;
        };

        if !span.overlaps(last) {
            merged.push(span);
            continue;
        }

        match (last.source, span.source) {
            (EntitySource::Pattern, EntitySource::Semantic) => {},
            (EntitySource::Semantic, EntitySource::Pattern) => *last = span,
            _ => {
                let longer = span.len() > last.len();
                let stronger = span.len() == last.len() && span.score > last.score;
                if longer || stronger {
                    *last = span;
                }
            },
        }
    }

    merged
}

/// Replace every span with its placeholder. Spans must not overlap.
#[must_use]
pub fn apply_redactions(text: &str, spans: &[DetectedSpan], placeholders: &Placeholders) -> String {
    if spans.is_empty() {
        return text.to_string();
    }

    let mut ordered: Vec<&DetectedSpan> = spans.iter().collect();
    ordered.sort_by_key(|s| s.start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in ordered {
        if span.start < cursor {
            continue;
        }
        out.push_str(text.get(cursor..span.start).unwrap_or_default());
        out.push_str(placeholders.for_type(&span.entity_type));
        cursor = span.end.min(text.len());
    }
    out.push_str(text.get(cursor..).unwrap_or_default());
    out
}
