//! # Liability Firebreaks
//!
//! Policy gate run by a delegation orchestrator before each hop.
//!
//! | Gate | Trips when | Override tier |
//! |---|---|---|
//! | `delegation_depth_exceeded` | depth > `executive_max_depth` | emergency |
//! | `high_value_transaction` | value > `high_value_limit`, no approval | manager |
//! | `critical_system_access` | critical systems involved, no approval | executive |
//! | `external_delegation` | hop leaves the organization, no approval | executive |
//!
//! Negative depth or value is clamped to 0 and a non-finite value trips
//! the value gate. Overrides and escalations are recorded for out-of-band
//! human review and are never approved here.

pub mod enforcer;
pub mod types;

pub use enforcer::LiabilityFirebreakEnforcer;
pub use types::{
    Approval, AuthorityLevel, EmergencyContact, EmergencyLevel, EscalationRecord,
    EscalationRequest, EscalationStatus, FirebreakConfig, FirebreakContext, FirebreakKind,
    FirebreakResult, FirebreakStats, LiabilityLevel, OverrideRequest, OverrideResult,
    OverrideStatus,
};
