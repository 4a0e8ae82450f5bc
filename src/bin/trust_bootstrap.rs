//! Bootstrap capability manifests from agent definition files.
//!
//! # Usage
//!
//! ```bash
//! trust-bootstrap [--config agent-trust.yaml] agents/*.md agents/*.json
//! ```
//!
//! Prints the registered manifests as pretty JSON on stdout. Files that
//! cannot be read or are of an unsupported type are logged and skipped.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: tracing filter (default: "info,agent_trust=debug")
//! - `AGENT_TRUST_CONFIG`: config file, same as `--config`
//! - `AGENT_TRUST_*`: config overrides, see `agent_trust::config`

use std::path::PathBuf;

use agent_trust::flags::{EvaluationContext, FeatureFlagManager};
use agent_trust::{AgentSource, CapabilityBootstrap, CapabilityRegistry, TrustConfig};
use anyhow::{bail, Context};
use clap::Parser;

/// Bootstrap capability manifests from agent definition files
#[derive(Parser, Debug)]
#[command(name = "trust-bootstrap")]
#[command(version, about, long_about = None)]
struct Args {
    /// YAML or JSON config file
    #[arg(short, long, env = "AGENT_TRUST_CONFIG")]
    config: Option<PathBuf>,

    /// Agent definition files (.md, .markdown, .json, .yaml, .yml)
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,agent_trust=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    let flags = FeatureFlagManager::new(config.flags.clone());
    let evaluation = flags.evaluate("confidence_bootstrap", &EvaluationContext::default());
    if !evaluation.enabled {
        bail!("confidence_bootstrap is disabled: {}", evaluation.reason);
    }

    let mut sources = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        match AgentSource::from_path(path, content) {
            Ok(source) => sources.push(source),
            Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
        }
    }

    let bootstrap = CapabilityBootstrap::new(config.bootstrap.clone(), config.confidence.clone());
    let mut registry = CapabilityRegistry::with_config(config.registry.clone());
    let registered = bootstrap.bootstrap_into(&mut registry, &sources);
    tracing::info!(
        "Registered {} of {} agent files",
        registered.len(),
        args.files.len()
    );

    let manifests = registry.list_manifests();
    println!("{}", serde_json::to_string_pretty(&manifests)?);
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<TrustConfig> {
    match path {
        Some(path) => TrustConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => {
            let mut config = TrustConfig::default();
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_and_files() {
        let args = Args::try_parse_from([
            "trust-bootstrap",
            "--config",
            "trust.yaml",
            "agents/a.md",
            "agents/b.json",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("trust.yaml")));
        assert_eq!(
            args.files,
            vec![PathBuf::from("agents/a.md"), PathBuf::from("agents/b.json")]
        );

        let short = Args::try_parse_from(["trust-bootstrap", "-c", "t.json", "a.md"]).unwrap();
        assert_eq!(short.config, Some(PathBuf::from("t.json")));
    }

    #[test]
    fn test_files_are_required() {
        assert!(Args::try_parse_from(["trust-bootstrap"]).is_err());
        assert!(Args::try_parse_from(["trust-bootstrap", "a.md", "--config"]).is_err());
    }

    #[test]
    fn test_help_is_an_error_value() {
        let err = Args::try_parse_from(["trust-bootstrap", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_missing_config_file_fails() {
        let path = PathBuf::from("/nonexistent/agent-trust.yaml");
        assert!(load_config(Some(&path)).is_err());
    }
}
