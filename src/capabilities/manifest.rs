//! Capability manifest: an agent's declared, confidence-scored skill set.
//!
//! ```yaml
//! agent_id: security-auditor
//! agent_name: Security Auditor
//! capabilities:
//!   - capability_id: pattern_enforcement
//!     confidence_level: 0.62
//!   - capability_id: security
//!     confidence_level: 0.81
//! overall_confidence: 0.715
//! specializations: [security]
//! last_updated: 2026-01-01T00:00:00Z
//! ```

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One capability with its calibrated confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityEntry {
    pub capability_id: String,
    /// Calibrated trust in [0, 1].
    pub confidence_level: f64,
}

impl CapabilityEntry {
    pub fn new(capability_id: impl Into<String>, confidence_level: f64) -> Self {
        Self {
            capability_id: capability_id.into(),
            confidence_level,
        }
    }
}

/// The registry's unit of storage, keyed by `agent_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityManifest {
    /// Unique key in the registry.
    pub agent_id: String,

    #[serde(default)]
    pub agent_name: Option<String>,

    /// Ordered capability entries.
    #[serde(default)]
    pub capabilities: Vec<CapabilityEntry>,

    /// Mean of the capability confidence levels.
    pub overall_confidence: f64,

    #[serde(default)]
    pub specializations: BTreeSet<String>,

    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

impl CapabilityManifest {
    /// Build a manifest whose overall confidence is the mean of `capabilities`.
    pub fn new(agent_id: impl Into<String>, capabilities: Vec<CapabilityEntry>) -> Self {
        let overall_confidence = mean_confidence(&capabilities);
        Self {
            agent_id: agent_id.into(),
            agent_name: None,
            capabilities,
            overall_confidence,
            specializations: BTreeSet::new(),
            last_updated: Utc::now(),
        }
    }

    /// Builder: set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.agent_name = Some(name.into());
        self
    }

    /// Builder: add specialization tags.
    pub fn with_specializations<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.specializations.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Confidence for `capability_id`, if the agent has it.
    pub fn confidence_for(&self, capability_id: &str) -> Option<f64> {
        self.capabilities
            .iter()
            .find(|c| c.capability_id == capability_id)
            .map(|c| c.confidence_level)
    }

    pub fn has_capability(&self, capability_id: &str) -> bool {
        self.confidence_for(capability_id).is_some()
    }

    pub fn capability_ids(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.capability_id.as_str()).collect()
    }

    /// Recompute `overall_confidence` from the entries and stamp `last_updated`.
    pub fn refresh_overall_confidence(&mut self) {
        self.overall_confidence = mean_confidence(&self.capabilities);
        self.last_updated = Utc::now();
    }
}

/// Mean of the entries' confidence levels; 0.0 for an empty list.
pub fn mean_confidence(capabilities: &[CapabilityEntry]) -> f64 {
    if capabilities.is_empty() {
        return 0.0;
    }
    capabilities.iter().map(|c| c.confidence_level).sum::<f64>() / capabilities.len() as f64
}
