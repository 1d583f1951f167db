//! Port definitions for application layer
//!
//! Ports are interfaces that define how the validators reach their
//! text-analysis backends. Adapters in the infrastructure layer implement them.

mod named_entity_port;
mod pattern_recognizer_port;
mod policy_guard_port;
mod profanity_filter_port;
mod toxicity_classifier_port;

#[cfg(test)]
pub use named_entity_port::MockNamedEntityPort;
pub use named_entity_port::{EntityPrediction, NamedEntityPort};
#[cfg(test)]
pub use pattern_recognizer_port::MockPatternRecognizerPort;
pub use pattern_recognizer_port::PatternRecognizerPort;
#[cfg(test)]
pub use policy_guard_port::MockPolicyGuardPort;
pub use policy_guard_port::{GuardPrompt, PolicyGuardPort};
#[cfg(test)]
pub use profanity_filter_port::MockProfanityFilterPort;
pub use profanity_filter_port::{ProfanityFilterPort, ProfanityHit};
#[cfg(test)]
pub use toxicity_classifier_port::MockToxicityClassifierPort;
pub use toxicity_classifier_port::ToxicityClassifierPort;
