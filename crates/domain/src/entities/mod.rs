//! Domain entities - the vocabulary of a validation result

mod pii;
mod policy;
mod toxicity;
mod validation;

pub use pii::{
    DEFAULT_ENTITIES, DEFAULT_GLOBAL_THRESHOLD, DEFAULT_PLACEHOLDER, DetectedSpan, EntitySource,
    Placeholders, RedactedEntity, entity_type_for_label, semantic_label_for,
};
pub use policy::{FILTERED_TEXT, GuardVerdict, PolicyAction, REASK_TEXT, UNSPECIFIED_CATEGORY};
pub use toxicity::{
    FlagKind, Flagged, LabelScores, ProfanityAction, ScoringMode, ToxicAction, ToxicityLabel,
};
pub use validation::{ValidationStatus, ValidationStep};
