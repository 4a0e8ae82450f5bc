//! Capability registry errors.

use thiserror::Error;

/// Validation failures. Raised before any mutation, so a rejected call
/// leaves the registry untouched.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    /// A confidence value lies outside [0, 1] or is not finite.
    #[error("Invalid confidence for agent '{agent_id}' ({field}): {value} is outside [0, 1]")]
    InvalidConfidence {
        agent_id: String,
        field: String,
        value: f64,
    },

    /// The manifest has no usable agent id.
    #[error("Manifest rejected: agent_id must not be empty")]
    EmptyAgentId,
}
