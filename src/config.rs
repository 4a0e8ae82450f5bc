//! Crate-wide configuration.
//!
//! One YAML (or JSON) document configures all four subsystems; every
//! section and field is optional and falls back to the built-in defaults.
//!
//! ```yaml
//! confidence:
//!   proven_threshold: 20
//! registry:
//!   workload_penalty: 0.2
//! flags:
//!   default_environment: staging
//! firebreak:
//!   high_value_limit: 250000
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bootstrap::{BootstrapConfig, ConfidenceConfig};
use crate::capabilities::RegistryConfig;
use crate::firebreak::FirebreakConfig;
use crate::flags::FlagsConfig;

/// Environment variables read by [`TrustConfig::apply_env_overrides`].
pub const ENV_HIGH_VALUE_LIMIT: &str = "AGENT_TRUST_HIGH_VALUE_LIMIT";
pub const ENV_EXECUTIVE_DEPTH: &str = "AGENT_TRUST_EXECUTIVE_DEPTH";
pub const ENV_PROVEN_THRESHOLD: &str = "AGENT_TRUST_PROVEN_THRESHOLD";
pub const ENV_ENVIRONMENT: &str = "AGENT_TRUST_ENVIRONMENT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An override variable held an unparseable value.
    #[error("Invalid value for {var}: '{value}'")]
    InvalidEnv { var: String, value: String },

    #[error("Invalid {section} config: {message}")]
    Invalid { section: &'static str, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustConfig {
    #[serde(default)]
    pub confidence: ConfidenceConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub flags: FlagsConfig,
    #[serde(default)]
    pub firebreak: FirebreakConfig,
}

impl TrustConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a file, choosing JSON for `.json` and YAML otherwise, then
    /// apply environment overrides and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&std::fs::read_to_string(path)?)?,
            _ => Self::from_yaml_file(path)?,
        };
        config.apply_env_overrides()?;
        config.validate()?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply `AGENT_TRUST_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|var| std::env::var(var).ok())
    }

    /// Apply overrides from any variable source.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(limit) = parse_var::<f64, _>(&lookup, ENV_HIGH_VALUE_LIMIT)? {
            self.firebreak.high_value_limit = limit;
        }
        if let Some(depth) = parse_var::<u32, _>(&lookup, ENV_EXECUTIVE_DEPTH)? {
            self.firebreak.executive_max_depth = depth;
        }
        if let Some(threshold) = parse_var::<u32, _>(&lookup, ENV_PROVEN_THRESHOLD)? {
            self.confidence.proven_threshold = threshold;
        }
        if let Some(environment) = lookup(ENV_ENVIRONMENT).filter(|v| !v.trim().is_empty()) {
            self.flags.default_environment = Some(environment.trim().to_string());
        }
        Ok(())
    }

    /// Reject inconsistent settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |section: &'static str| {
            move |message: String| ConfigError::Invalid { section, message }
        };

        self.confidence.validate().map_err(invalid("confidence"))?;
        self.registry.validate().map_err(invalid("registry"))?;
        self.firebreak.validate().map_err(invalid("firebreak"))?;

        let threshold = self.bootstrap.specialization_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(invalid("bootstrap")(format!(
                "specialization_threshold must be in [0, 1], got {}",
                threshold
            )));
        }
        if self.flags.master_switch.trim().is_empty() {
            return Err(invalid("flags")("master_switch must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| ConfigError::InvalidEnv {
            var: var.to_string(),
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_valid() {
        let config = TrustConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.firebreak.executive_max_depth, 7);
        assert_eq!(config.flags.master_switch, "system_enabled");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = TrustConfig::from_yaml(
            "firebreak:\n  high_value_limit: 250000\nconfidence:\n  proven_threshold: 20\n",
        )
        .unwrap();
        assert_eq!(config.firebreak.high_value_limit, 250_000.0);
        assert_eq!(config.firebreak.supervisor_max_depth, 4);
        assert_eq!(config.confidence.proven_threshold, 20);
        assert_eq!(config.confidence.initial_baseline, 0.5);
        assert!(config.flags.seed_defaults);
    }

    #[test]
    fn test_from_json() {
        let config = TrustConfig::from_json(r#"{"registry": {"workload_penalty": 0.25}}"#).unwrap();
        assert_eq!(config.registry.workload_penalty, 0.25);
        assert!(TrustConfig::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_load_yaml_and_json_files() {
        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml, "bootstrap:\n  specialization_threshold: 0.8").unwrap();
        let config = TrustConfig::from_yaml_file(yaml.path()).unwrap();
        assert_eq!(config.bootstrap.specialization_threshold, 0.8);

        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json, r#"{{"firebreak": {{"trivial_value_limit": 10.0}}}}"#).unwrap();
        let config = TrustConfig::load(json.path()).unwrap();
        assert_eq!(config.firebreak.trivial_value_limit, 10.0);

        assert!(matches!(
            TrustConfig::from_yaml_file("/nonexistent/agent-trust.yaml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = TrustConfig::default();
        config
            .apply_overrides_from(lookup(&[
                (ENV_HIGH_VALUE_LIMIT, "5000"),
                (ENV_EXECUTIVE_DEPTH, " 9 "),
                (ENV_PROVEN_THRESHOLD, "3"),
                (ENV_ENVIRONMENT, "staging"),
            ]))
            .unwrap();
        assert_eq!(config.firebreak.high_value_limit, 5000.0);
        assert_eq!(config.firebreak.executive_max_depth, 9);
        assert_eq!(config.confidence.proven_threshold, 3);
        assert_eq!(config.flags.default_environment.as_deref(), Some("staging"));
    }

    #[test]
    fn test_bad_env_value_names_variable() {
        let mut config = TrustConfig::default();
        let err = config
            .apply_overrides_from(lookup(&[(ENV_EXECUTIVE_DEPTH, "deep")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidEnv { var, value } => {
                assert_eq!(var, ENV_EXECUTIVE_DEPTH);
                assert_eq!(value, "deep");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_validate_rejects_inconsistent_config() {
        let mut config = TrustConfig::default();
        config.firebreak.executive_max_depth = 3;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("firebreak"));

        let mut config = TrustConfig::default();
        config.bootstrap.specialization_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = TrustConfig::default();
        config.confidence.validated_floor = 0.99;
        assert!(config.validate().is_err());
    }
}
