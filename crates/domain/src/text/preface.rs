/// Field-label words that semantic recognizers tend to tag as entities
/// ("Name: Ada" yields "Name" as a person). They are never redacted.
pub const GENERIC_PREFACE_WORDS: &[&str] = &[
    "email",
    "e-mail",
    "mail",
    "phone",
    "tel",
    "telephone",
    "mobile",
    "mob",
    "address",
    "addr",
    "name",
    "location",
    "loc",
    "city",
    "state",
    "country",
    "contact",
    "contacts",
    "contact:",
];

/// Whether a span's text is just a generic field label
#[must_use]
pub fn is_generic_preface_span(span_text: &str) -> bool {
    let normalized = span_text.trim().to_lowercase();
    GENERIC_PREFACE_WORDS.contains(&normalized.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_labels_are_generic() {
        assert!(is_generic_preface_span("Email"));
        assert!(is_generic_preface_span("  CONTACT: "));
        assert!(is_generic_preface_span("tel"));
    }

    #[test]
    fn real_values_are_not_generic() {
        assert!(!is_generic_preface_span("Ada Lovelace"));
        assert!(!is_generic_preface_span("Name Ada"));
        assert!(!is_generic_preface_span(""));
    }
}
