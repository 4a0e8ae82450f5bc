//! # Capability Bootstrap
//!
//! Turns raw agent descriptions into calibrated capability manifests.
//!
//! ## Pipeline
//!
//! ```text
//! AgentSource ──analyze──► AnalyzedAgent ──detect──► DetectionResult
//!                                                         │
//!                     ValidationHistory ──initialize──────┤
//!                                                         ▼
//!                                              CapabilityManifest
//! ```
//!
//! 1. [`analyzer`] normalizes markdown, structured and JSON sources
//! 2. [`detector`] scores keyword families, always including `pattern_enforcement`
//! 3. [`confidence`] maps detection + validation history onto the tier curve
//! 4. [`pipeline`] assembles the manifest, specializations and suggestions

pub mod analyzer;
pub mod confidence;
pub mod detector;
pub mod error;
pub mod pipeline;

pub use analyzer::{analyze, AgentSource, AnalyzedAgent, StructuredAgent, UNKNOWN_AGENT_NAME};
pub use confidence::{
    ConfidenceAssessment, ConfidenceConfig, ConfidenceInitializer, ConfidenceTier, Recommendation,
    RecommendationPriority,
};
pub use detector::{CapabilityDetector, CapabilityMatch, DetectionResult, MANDATORY_CAPABILITY};
pub use error::BootstrapError;
pub use pipeline::{BootstrapConfig, BootstrapResult, CapabilityBootstrap, ValidationHistory};
