//! # agent-trust
//!
//! Trust and governance core for multi-agent systems:
//!
//! - [`bootstrap`]: turn raw agent descriptions into calibrated capability manifests
//! - [`capabilities`]: index manifests and rank agents for a task
//! - [`flags`]: feature flags with deterministic rollout, dependencies and a kill switch
//! - [`firebreak`]: block risky delegation hops pending authority approval
//!
//! All four are synchronous in-memory structures without internal locking;
//! callers serialize mutation per instance (see [`flags::global`] for the one
//! shared handle the crate provides).

pub mod bootstrap;
pub mod capabilities;
pub mod config;
pub mod error;
pub mod firebreak;
pub mod flags;
pub mod utilities;

pub use bootstrap::{AgentSource, CapabilityBootstrap, ValidationHistory};
pub use capabilities::{CapabilityManifest, CapabilityRegistry};
pub use config::TrustConfig;
pub use error::{Result, TrustError};
pub use firebreak::{FirebreakContext, LiabilityFirebreakEnforcer};
pub use flags::{EvaluationContext, FeatureFlagManager};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
