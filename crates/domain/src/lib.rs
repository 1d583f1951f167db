//! Domain layer for the guardrail services
//!
//! Contains the validation vocabulary shared by the PII, toxicity and policy
//! services together with the pure text algorithms they rely on (span merging,
//! redaction, sentence segmentation and offset mapping). This layer has no I/O.

pub mod entities;
pub mod errors;
pub mod text;

pub use entities::*;
pub use errors::DomainError;
