//! Feature flag errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlagError {
    /// `rollout_percentage` outside [0, 100] or not a number.
    #[error("Invalid rollout percentage for flag '{flag_id}': {value} (expected 0-100)")]
    InvalidRollout { flag_id: String, value: f64 },

    /// Flag ids must be non-empty.
    #[error("Flag id must not be empty")]
    EmptyFlagId,

    /// A snapshot named no master switch.
    #[error("Flag snapshot master switch must not be empty")]
    EmptyMasterSwitch,

    /// Snapshot (de)serialization failed.
    #[error("Flag snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The process-wide manager was already installed.
    #[error("Global feature flag manager already initialized")]
    AlreadyInitialized,
}
