//! Application services - Use case implementations

mod pii_service;
mod policy_service;
mod readiness;
mod toxicity_service;

pub use pii_service::{PiiReport, PiiRequest, PiiService, PiiSettings};
pub use policy_service::{
    POLICY_SUMMARY, PolicyReport, PolicyRequest, PolicyService, PolicySettings, build_prompt,
};
pub use readiness::{ComponentStatus, Readiness};
pub use toxicity_service::{ToxicityReport, ToxicityRequest, ToxicityService, ToxicitySettings};
