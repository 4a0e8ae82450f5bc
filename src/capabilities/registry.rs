//! Capability Registry: stores manifests, answers capability queries and
//! ranks agents for a set of required capabilities.
//!
//! Manifests are indexed by `agent_id`. Workload counters live beside them
//! and are independent of registration: an agent can carry open tasks
//! before (or after) its manifest is replaced.
//!
//! The registry does no locking. Embed it behind a single owner or an
//! external mutex when several tasks mutate it.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::RegistryError;
use super::manifest::CapabilityManifest;

/// Relative weights of the match-score components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Fraction of required capabilities the agent covers.
    #[serde(default = "default_coverage_weight")]
    pub coverage: f64,
    /// Mean confidence over the covered required capabilities.
    #[serde(default = "default_confidence_weight")]
    pub confidence: f64,
    /// Fraction of required capabilities listed as specializations.
    #[serde(default = "default_specialization_weight")]
    pub specialization: f64,
}

fn default_coverage_weight() -> f64 { 0.4 }
fn default_confidence_weight() -> f64 { 0.4 }
fn default_specialization_weight() -> f64 { 0.2 }
fn default_workload_penalty() -> f64 { 0.1 }

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            coverage: default_coverage_weight(),
            confidence: default_confidence_weight(),
            specialization: default_specialization_weight(),
        }
    }
}

/// Registry tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub weights: ScoreWeights,
    /// Score divisor per open task: `score / (1 + penalty * workload)`.
    #[serde(default = "default_workload_penalty")]
    pub workload_penalty: f64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            workload_penalty: default_workload_penalty(),
        }
    }
}

impl RegistryConfig {
    pub fn validate(&self) -> Result<(), String> {
        let w = &self.weights;
        for (name, value) in [
            ("coverage", w.coverage),
            ("confidence", w.confidence),
            ("specialization", w.specialization),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!(
                    "registry.weights.{} must be a non-negative number, got {}",
                    name, value
                ));
            }
        }
        // Score must stay strictly increasing in confidence.
        if w.confidence <= 0.0 {
            return Err(format!(
                "registry.weights.confidence must be positive, got {}",
                w.confidence
            ));
        }
        if !self.workload_penalty.is_finite() || self.workload_penalty <= 0.0 {
            return Err(format!(
                "registry.workload_penalty must be a positive number, got {}",
                self.workload_penalty
            ));
        }
        Ok(())
    }
}

/// Options for [`CapabilityRegistry::rank_agents`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankOptions {
    /// Overrides the confidence weight for this ranking only. Values that
    /// are not positive and finite are ignored.
    pub confidence_weight: Option<f64>,
    /// Penalize agents with more open tasks.
    pub consider_workload: bool,
}

/// One entry of a ranking, best first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedAgent {
    pub agent_id: String,
    pub score: f64,
    pub workload: u32,
}

/// Aggregate view of the registry contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_agents: usize,
    pub distinct_capabilities: usize,
    /// Mean of the manifests' overall confidence.
    pub average_confidence: f64,
    /// Sum of all workload counters.
    pub open_tasks: u64,
}

/// Manifest store plus per-agent workload counters.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    manifests: HashMap<String, CapabilityManifest>,
    workloads: HashMap<String, u32>,
    config: RegistryConfig,
}

impl CapabilityRegistry {
    /// Create a new empty registry with default scoring.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Insert a manifest, wholesale-replacing any manifest with the same id.
    ///
    /// Rejected without mutation if any confidence is outside [0, 1].
    pub fn register_manifest(&mut self, manifest: CapabilityManifest) -> Result<(), RegistryError> {
        validate_manifest(&manifest)?;
        let agent_id = manifest.agent_id.clone();
        let capability_count = manifest.capabilities.len();
        let replaced = self.manifests.insert(agent_id.clone(), manifest).is_some();
        log::debug!(
            "{} capability manifest for '{}' ({} capabilities)",
            if replaced { "Replaced" } else { "Registered" },
            agent_id,
            capability_count
        );
        Ok(())
    }

    /// Register several manifests. All are validated first; one bad
    /// manifest rejects the whole batch.
    pub fn register_manifests(
        &mut self,
        manifests: Vec<CapabilityManifest>,
    ) -> Result<usize, RegistryError> {
        for manifest in &manifests {
            validate_manifest(manifest)?;
        }
        let count = manifests.len();
        for manifest in manifests {
            self.manifests.insert(manifest.agent_id.clone(), manifest);
        }
        log::debug!("Registered {} capability manifests", count);
        Ok(count)
    }

    /// Remove every manifest and workload counter.
    pub fn clear(&mut self) {
        self.manifests.clear();
        self.workloads.clear();
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn get_manifest(&self, agent_id: &str) -> Option<&CapabilityManifest> {
        self.manifests.get(agent_id)
    }

    /// All manifests, ordered by agent id.
    pub fn list_manifests(&self) -> Vec<&CapabilityManifest> {
        let mut all: Vec<&CapabilityManifest> = self.manifests.values().collect();
        all.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        all
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    /// Agents holding `capability_id` at or above `min_confidence`.
    pub fn find_by_capability(
        &self,
        capability_id: &str,
        min_confidence: Option<f64>,
    ) -> Vec<&CapabilityManifest> {
        let floor = min_confidence.unwrap_or(f64::NEG_INFINITY);
        self.list_manifests()
            .into_iter()
            .filter(|m| m.confidence_for(capability_id).map_or(false, |c| c >= floor))
            .collect()
    }

    /// Agents holding every capability in `capability_ids`.
    pub fn find_by_capabilities<S: AsRef<str>>(
        &self,
        capability_ids: &[S],
    ) -> Vec<&CapabilityManifest> {
        self.list_manifests()
            .into_iter()
            .filter(|m| capability_ids.iter().all(|id| m.has_capability(id.as_ref())))
            .collect()
    }

    /// Agents whose specialization set contains `tag`.
    pub fn find_by_specialization(&self, tag: &str) -> Vec<&CapabilityManifest> {
        self.list_manifests()
            .into_iter()
            .filter(|m| m.specializations.contains(tag))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Scoring
    // -----------------------------------------------------------------------

    /// Match score in [0, 1] of one agent against the required capabilities.
    ///
    /// Unknown agents and empty requirement lists score 0.
    pub fn calculate_match_score<S: AsRef<str>>(&self, agent_id: &str, required: &[S]) -> f64 {
        self.manifests
            .get(agent_id)
            .map(|m| score_manifest(m, required, &self.config.weights))
            .unwrap_or(0.0)
    }

    /// Agents covering at least one required capability, best first.
    ///
    /// Ties are broken by agent id so the order is deterministic.
    pub fn rank_agents<S: AsRef<str>>(
        &self,
        required: &[S],
        options: &RankOptions,
    ) -> Vec<RankedAgent> {
        let mut weights = self.config.weights.clone();
        if let Some(w) = options
            .confidence_weight
            .filter(|w| w.is_finite() && *w > 0.0)
        {
            weights.confidence = w;
        }

        let mut ranked: Vec<RankedAgent> = self
            .manifests
            .values()
            .filter(|m| required.iter().any(|id| m.has_capability(id.as_ref())))
            .map(|m| {
                let workload = self.get_workload(&m.agent_id);
                let mut score = score_manifest(m, required, &weights);
                if options.consider_workload {
                    score /= 1.0 + self.config.workload_penalty * f64::from(workload);
                }
                RankedAgent {
                    agent_id: m.agent_id.clone(),
                    score,
                    workload,
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.agent_id.cmp(&b.agent_id))
        });
        ranked
    }

    // -----------------------------------------------------------------------
    // Workload
    // -----------------------------------------------------------------------

    /// Record an assignment; returns the new open-task count.
    pub fn increment_workload(&mut self, agent_id: &str) -> u32 {
        let counter = self.workloads.entry(agent_id.to_string()).or_insert(0);
        *counter = counter.saturating_add(1);
        *counter
    }

    /// Record a completion; never drops below zero.
    pub fn decrement_workload(&mut self, agent_id: &str) -> u32 {
        match self.workloads.get_mut(agent_id) {
            Some(counter) => {
                *counter = counter.saturating_sub(1);
                *counter
            }
            None => 0,
        }
    }

    pub fn get_workload(&self, agent_id: &str) -> u32 {
        self.workloads.get(agent_id).copied().unwrap_or(0)
    }

    // -----------------------------------------------------------------------
    // Confidence updates
    // -----------------------------------------------------------------------

    /// Set one capability's confidence in place and recompute the overall mean.
    ///
    /// Returns `Ok(false)` when the agent or capability is absent.
    pub fn update_confidence(
        &mut self,
        agent_id: &str,
        capability_id: &str,
        value: f64,
    ) -> Result<bool, RegistryError> {
        check_confidence(agent_id, capability_id, value)?;

        let Some(manifest) = self.manifests.get_mut(agent_id) else {
            return Ok(false);
        };
        let Some(entry) = manifest
            .capabilities
            .iter_mut()
            .find(|c| c.capability_id == capability_id)
        else {
            return Ok(false);
        };

        entry.confidence_level = value;
        manifest.refresh_overall_confidence();
        log::debug!(
            "Updated confidence of '{}' for agent '{}' to {:.3}",
            capability_id,
            agent_id,
            value
        );
        Ok(true)
    }

    /// Override an agent's aggregate confidence directly.
    ///
    /// Returns `Ok(false)` when the agent is absent.
    pub fn update_overall_confidence(
        &mut self,
        agent_id: &str,
        value: f64,
    ) -> Result<bool, RegistryError> {
        check_confidence(agent_id, "overall_confidence", value)?;
        match self.manifests.get_mut(agent_id) {
            Some(manifest) => {
                manifest.overall_confidence = value;
                manifest.last_updated = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> RegistryStats {
        let total_agents = self.manifests.len();
        let distinct_capabilities = self
            .manifests
            .values()
            .flat_map(|m| m.capabilities.iter().map(|c| c.capability_id.as_str()))
            .collect::<HashSet<_>>()
            .len();
        let average_confidence = if total_agents > 0 {
            self.manifests.values().map(|m| m.overall_confidence).sum::<f64>() / total_agents as f64
        } else {
            0.0
        };

        RegistryStats {
            total_agents,
            distinct_capabilities,
            average_confidence,
            open_tasks: self.workloads.values().map(|w| u64::from(*w)).sum(),
        }
    }
}

fn check_confidence(agent_id: &str, field: &str, value: f64) -> Result<(), RegistryError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(RegistryError::InvalidConfidence {
            agent_id: agent_id.to_string(),
            field: field.to_string(),
            value,
        })
    }
}

fn validate_manifest(manifest: &CapabilityManifest) -> Result<(), RegistryError> {
    if manifest.agent_id.trim().is_empty() {
        return Err(RegistryError::EmptyAgentId);
    }
    check_confidence(&manifest.agent_id, "overall_confidence", manifest.overall_confidence)?;
    for entry in &manifest.capabilities {
        check_confidence(&manifest.agent_id, &entry.capability_id, entry.confidence_level)?;
    }
    Ok(())
}

/// Weighted blend of coverage, confidence and specialization overlap,
/// normalized by the weight total.
fn score_manifest<S: AsRef<str>>(
    manifest: &CapabilityManifest,
    required: &[S],
    weights: &ScoreWeights,
) -> f64 {
    if required.is_empty() {
        return 0.0;
    }

    let covered: Vec<f64> = required
        .iter()
        .filter_map(|id| manifest.confidence_for(id.as_ref()))
        .collect();
    if covered.is_empty() {
        return 0.0;
    }

    let total = required.len() as f64;
    let coverage = covered.len() as f64 / total;
    let avg_confidence = covered.iter().sum::<f64>() / covered.len() as f64;
    let specialized = required
        .iter()
        .filter(|id| manifest.specializations.contains(id.as_ref()))
        .count() as f64
        / total;

    let weight_total = weights.coverage + weights.confidence + weights.specialization;
    if weight_total <= 0.0 {
        return 0.0;
    }

    (weights.coverage * coverage
        + weights.confidence * avg_confidence
        + weights.specialization * specialized)
        / weight_total
}
