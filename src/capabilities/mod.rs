//! # Capability Registry
//!
//! Indexes capability manifests by agent id and routes work to the
//! best-fit, least-loaded agent.
//!
//! ## Routing Flow
//!
//! 1. The bootstrap pipeline (or a caller) produces a [`CapabilityManifest`]
//! 2. `CapabilityRegistry::register_manifest` validates and stores it
//! 3. The delegation orchestrator asks `rank_agents(&["testing"], &opts)`
//! 4. It assigns the task to the top agent and calls `increment_workload`
//! 5. On completion it calls `decrement_workload` and, after human review,
//!    `update_confidence`

pub mod error;
pub mod manifest;
pub mod registry;

pub use error::RegistryError;
pub use manifest::{mean_confidence, CapabilityEntry, CapabilityManifest};
pub use registry::{
    CapabilityRegistry, RankOptions, RankedAgent, RegistryConfig, RegistryStats, ScoreWeights,
};
