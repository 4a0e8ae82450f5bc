//! Bootstrap pipeline errors.

use thiserror::Error;

/// Errors raised while turning one agent source into a manifest.
///
/// Every variant is scoped to a single source; batch bootstrapping logs
/// and skips the failing source.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The source kind (file extension or tag) is not one we can analyze.
    #[error("Unsupported agent source '{kind}': expected markdown, structured (yaml) or json")]
    UnsupportedSource { kind: String },

    /// JSON text could not be parsed.
    #[error("Invalid JSON agent definition: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML text for a structured descriptor could not be parsed.
    #[error("Invalid structured agent descriptor: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The definition parsed but has the wrong shape.
    #[error("Invalid agent definition: {0}")]
    InvalidDefinition(String),
}
