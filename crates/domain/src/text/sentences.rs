/// Lower-cased words that end with a period without ending a sentence
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "inc", "ltd", "co", "corp",
    "e.g", "i.e", "fig", "approx", "dept", "vol", "u.s", "a.m", "p.m",
];

/// A sentence and its byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

const fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\u{2026}')
}

const fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{201D}' | '\u{2019}')
}

fn ends_with_abbreviation(prefix: &str) -> bool {
    let word = prefix
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(|c: char| !c.is_alphanumeric());
    if word.is_empty() {
        return false;
    }
    // Single-letter initials such as "J. R. R. Tolkien"
    let mut chars = word.chars();
    if let (Some(first), None) = (chars.next(), chars.next()) {
        return first.is_uppercase();
    }
    ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}

/// Split text into sentences with their byte offsets.
///
/// A sentence ends at a run of terminal punctuation (plus closing quotes or
/// brackets) followed by whitespace or the end of the text. Periods after common
/// abbreviations and initials do not end a sentence. Leading and trailing
/// whitespace is excluded from each range; whitespace-only input yields nothing.
#[must_use]
pub fn sentences_with_offsets(text: &str) -> Vec<Sentence<'_>> {
    let mut out = Vec::new();
    let mut current: Option<usize> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let start = match current {
            Some(start) => start,
            None if c.is_whitespace() => continue,
            None => {
                current = Some(i);
                i
            },
        };

        if !is_terminator(c) {
            continue;
        }

        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if is_terminator(next) || is_closing(next) {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        let at_boundary = chars.peek().is_none_or(|&(_, next)| next.is_whitespace());
        if at_boundary && !(c == '.' && ends_with_abbreviation(&text[start..i])) {
            out.push(Sentence {
                start,
                end,
                text: &text[start..end],
            });
            current = None;
        }
    }

    if let Some(start) = current {
        let tail = text[start..].trim_end();
        if !tail.is_empty() {
            out.push(Sentence {
                start,
                end: start + tail.len(),
                text: tail,
            });
        }
    }

    out
}
