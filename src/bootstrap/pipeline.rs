//! Capability bootstrap: composes analyzer, detector and confidence
//! initializer into a finished manifest per agent source.

use serde::{Deserialize, Serialize};

use crate::capabilities::{CapabilityEntry, CapabilityManifest, CapabilityRegistry};
use crate::utilities::string_utils::slugify;

use super::analyzer::{analyze, AgentSource, AnalyzedAgent, UNKNOWN_AGENT_NAME};
use super::confidence::{ConfidenceConfig, ConfidenceInitializer, Recommendation};
use super::detector::{CapabilityDetector, DetectionResult, MANDATORY_CAPABILITY};
use super::error::BootstrapError;

/// Bootstrap tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Detection confidence at or above which a capability becomes a
    /// specialization tag.
    #[serde(default = "default_specialization_threshold")]
    pub specialization_threshold: f64,
    /// Instruction bodies shorter than this get an "expand" suggestion.
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,
}

fn default_specialization_threshold() -> f64 { 0.7 }
fn default_min_content_length() -> usize { 200 }

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            specialization_threshold: default_specialization_threshold(),
            min_content_length: default_min_content_length(),
        }
    }
}

/// Human-approval history fed in by the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationHistory {
    pub validated: bool,
    pub completions: u32,
}

/// Everything produced for one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapResult {
    pub manifest: CapabilityManifest,
    pub detection: DetectionResult,
    /// Manifest-quality suggestions (missing description, thin content...).
    pub suggestions: Vec<String>,
    /// Confidence recommendations for the agent as a whole.
    pub recommendations: Vec<Recommendation>,
}

/// The bootstrap pipeline.
#[derive(Debug, Clone, Default)]
pub struct CapabilityBootstrap {
    pub config: BootstrapConfig,
    detector: CapabilityDetector,
    initializer: ConfidenceInitializer,
}

impl CapabilityBootstrap {
    pub fn new(config: BootstrapConfig, confidence: ConfidenceConfig) -> Self {
        Self {
            config,
            detector: CapabilityDetector::new(),
            initializer: ConfidenceInitializer::new(confidence),
        }
    }

    pub fn initializer(&self) -> &ConfidenceInitializer {
        &self.initializer
    }

    pub fn detector(&self) -> &CapabilityDetector {
        &self.detector
    }

    /// Bootstrap an agent with no validation history.
    pub fn bootstrap(&self, source: &AgentSource) -> Result<BootstrapResult, BootstrapError> {
        self.bootstrap_with_history(source, ValidationHistory::default())
    }

    /// Bootstrap an agent, calibrating confidence with its approval history.
    pub fn bootstrap_with_history(
        &self,
        source: &AgentSource,
        history: ValidationHistory,
    ) -> Result<BootstrapResult, BootstrapError> {
        let agent = analyze(source)?;
        let detection = self.detector.detect(&agent.searchable_text());

        let capabilities: Vec<CapabilityEntry> = detection
            .capabilities
            .iter()
            .map(|m| {
                CapabilityEntry::new(
                    m.capability_id.clone(),
                    self.initializer.initialize_confidence(
                        m.detection_confidence,
                        history.validated,
                        history.completions,
                    ),
                )
            })
            .collect();

        let specializations: Vec<String> = detection
            .domain_capabilities()
            .filter(|m| m.detection_confidence >= self.config.specialization_threshold)
            .map(|m| m.capability_id.clone())
            .collect();

        let agent_id = match slugify(&agent.name) {
            id if id.is_empty() => UNKNOWN_AGENT_NAME.to_string(),
            id => id,
        };

        let manifest = CapabilityManifest::new(agent_id, capabilities)
            .with_name(agent.name.clone())
            .with_specializations(specializations);

        let recommendations = self.initializer.recommendations(
            manifest.overall_confidence,
            history.validated,
            history.completions,
        );
        let suggestions = self.suggestions(&agent, &detection);

        log::debug!(
            "Bootstrapped {} source '{}' → {} capabilities, overall confidence {:.2}",
            source.kind(),
            manifest.agent_id,
            manifest.capabilities.len(),
            manifest.overall_confidence
        );

        Ok(BootstrapResult {
            manifest,
            detection,
            suggestions,
            recommendations,
        })
    }

    /// Bootstrap every source independently. A source that fails analysis
    /// is logged and left out; the rest are still processed.
    pub fn bootstrap_batch(&self, sources: &[AgentSource]) -> Vec<BootstrapResult> {
        let mut results = Vec::with_capacity(sources.len());
        for (index, source) in sources.iter().enumerate() {
            match self.bootstrap(source) {
                Ok(result) => results.push(result),
                Err(e) => log::warn!(
                    "Skipping {} agent source #{} in batch: {}",
                    source.kind(),
                    index,
                    e
                ),
            }
        }
        log::info!(
            "Bootstrapped {}/{} agent sources",
            results.len(),
            sources.len()
        );
        results
    }

    /// Bootstrap a batch and register every manifest; returns the ids registered.
    pub fn bootstrap_into(
        &self,
        registry: &mut CapabilityRegistry,
        sources: &[AgentSource],
    ) -> Vec<String> {
        let mut registered = Vec::new();
        for result in self.bootstrap_batch(sources) {
            let agent_id = result.manifest.agent_id.clone();
            match registry.register_manifest(result.manifest) {
                Ok(()) => registered.push(agent_id),
                Err(e) => log::warn!("Bootstrapped manifest for '{}' rejected: {}", agent_id, e),
            }
        }
        registered
    }

    fn suggestions(&self, agent: &AnalyzedAgent, detection: &DetectionResult) -> Vec<String> {
        let mut suggestions = Vec::new();

        if agent.has_default_name() {
            suggestions.push(
                "Add a name (frontmatter `name`, a heading or an `id`) \
                 so the agent has a stable identity"
                    .to_string(),
            );
        }
        if agent.description.is_none() {
            suggestions.push("Add a description summarizing what the agent does".to_string());
        }
        if agent.content.chars().count() < self.config.min_content_length {
            suggestions.push(format!(
                "Expand the agent instructions (currently {} characters, recommended at least {})",
                agent.content.chars().count(),
                self.config.min_content_length
            ));
        }
        if detection.domain_capabilities().next().is_none() {
            suggestions.push(format!(
                "Only the mandatory '{}' capability was detected; \
                 describe the agent's expertise with concrete keywords",
                MANDATORY_CAPABILITY
            ));
        }

        suggestions
    }
}
