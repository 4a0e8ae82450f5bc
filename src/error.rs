//! Crate-level error type.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::capabilities::RegistryError;
use crate::config::ConfigError;
use crate::flags::FlagError;

/// Any error surfaced by this crate.
#[derive(Debug, Error)]
pub enum TrustError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Flag(#[from] FlagError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, TrustError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transparent_messages() {
        let err: TrustError = FlagError::EmptyFlagId.into();
        assert_eq!(err.to_string(), "Flag id must not be empty");

        let err: TrustError = RegistryError::EmptyAgentId.into();
        assert!(matches!(err, TrustError::Registry(_)));
    }
}
