//! Confidence initializer: turns a raw detection score plus validation
//! history into a calibrated, tiered confidence value.
//!
//! The curve is piecewise over `(detection, validated, completions)`:
//!
//! ```text
//! tier        condition                         value
//! initial     not validated                     baseline*(1-w) + detection*w
//! validated   validated, completions < N        floor + (ceiling-floor) * completions/N
//! proven      validated, completions >= N       ceiling
//! ```
//!
//! where `floor = max(validated_floor, initial)` and `N` is the proven
//! threshold. Between the validated and proven tiers the value rises
//! linearly with each completion and meets the ceiling exactly at `N`,
//! so there is no jump at the tier boundary. Everything clamps to [0, 1].

use serde::{Deserialize, Serialize};

/// Tunables for the confidence curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    /// Baseline blended with detection confidence for unvalidated agents.
    #[serde(default = "default_initial_baseline")]
    pub initial_baseline: f64,
    /// Weight of detection confidence in the initial blend (0.0-1.0).
    #[serde(default = "default_detection_weight")]
    pub detection_weight: f64,
    /// Floor once a validation event has occurred.
    #[serde(default = "default_validated_floor")]
    pub validated_floor: f64,
    /// Value reached at the proven threshold.
    #[serde(default = "default_proven_ceiling")]
    pub proven_ceiling: f64,
    /// Completions needed for proven status.
    #[serde(default = "default_proven_threshold")]
    pub proven_threshold: u32,
    /// Unvalidated confidence below this gets a critical recommendation.
    #[serde(default = "default_low_confidence")]
    pub low_confidence_threshold: f64,
}

fn default_initial_baseline() -> f64 { 0.50 }
fn default_detection_weight() -> f64 { 0.50 }
fn default_validated_floor() -> f64 { 0.75 }
fn default_proven_ceiling() -> f64 { 0.95 }
fn default_proven_threshold() -> u32 { 10 }
fn default_low_confidence() -> f64 { 0.60 }

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            initial_baseline: default_initial_baseline(),
            detection_weight: default_detection_weight(),
            validated_floor: default_validated_floor(),
            proven_ceiling: default_proven_ceiling(),
            proven_threshold: default_proven_threshold(),
            low_confidence_threshold: default_low_confidence(),
        }
    }
}

impl ConfidenceConfig {
    /// Check that every bound is a probability and the tiers are ordered.
    pub fn validate(&self) -> Result<(), String> {
        let probabilities = [
            ("initial_baseline", self.initial_baseline),
            ("detection_weight", self.detection_weight),
            ("validated_floor", self.validated_floor),
            ("proven_ceiling", self.proven_ceiling),
            ("low_confidence_threshold", self.low_confidence_threshold),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("confidence.{} must be within [0, 1], got {}", name, value));
            }
        }
        if self.validated_floor > self.proven_ceiling {
            return Err(format!(
                "confidence.validated_floor ({}) exceeds proven_ceiling ({})",
                self.validated_floor, self.proven_ceiling
            ));
        }
        Ok(())
    }
}

/// Trust tier of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    Initial,
    Validated,
    Proven,
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceTier::Initial => write!(f, "initial"),
            ConfidenceTier::Validated => write!(f, "validated"),
            ConfidenceTier::Proven => write!(f, "proven"),
        }
    }
}

/// Recommendation urgency; sorts most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    Critical,
    High,
    Medium,
    Low,
}

/// A textual next step for raising an agent's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    pub message: String,
}

/// Value, tier and recommendations for one capability in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceAssessment {
    pub confidence_level: f64,
    pub tier: ConfidenceTier,
    pub recommendations: Vec<Recommendation>,
}

/// Computes calibrated confidence values.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceInitializer {
    pub config: ConfidenceConfig,
}

impl ConfidenceInitializer {
    pub fn new(config: ConfidenceConfig) -> Self {
        Self { config }
    }

    /// Tier implied by the validation history.
    pub fn tier(&self, validated: bool, completions: u32) -> ConfidenceTier {
        if !validated {
            ConfidenceTier::Initial
        } else if completions >= self.config.proven_threshold {
            ConfidenceTier::Proven
        } else {
            ConfidenceTier::Validated
        }
    }

    /// Calibrated confidence for one capability.
    ///
    /// Non-finite detection scores count as zero.
    pub fn initialize_confidence(
        &self,
        detection_confidence: f64,
        validated: bool,
        completions: u32,
    ) -> f64 {
        let detection = if detection_confidence.is_finite() {
            detection_confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let cfg = &self.config;
        let weight = cfg.detection_weight.clamp(0.0, 1.0);
        let initial = cfg.initial_baseline * (1.0 - weight) + detection * weight;

        let value = if !validated {
            initial
        } else {
            let floor = cfg.validated_floor.max(initial);
            let ceiling = cfg.proven_ceiling.max(floor);
            let progress = if cfg.proven_threshold == 0 {
                1.0
            } else {
                f64::from(completions.min(cfg.proven_threshold)) / f64::from(cfg.proven_threshold)
            };
            floor + (ceiling - floor) * progress
        };

        value.clamp(0.0, 1.0)
    }

    /// Prioritized next steps, most urgent first.
    pub fn recommendations(
        &self,
        confidence: f64,
        validated: bool,
        completions: u32,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();
        let cfg = &self.config;

        match self.tier(validated, completions) {
            ConfidenceTier::Initial => {
                if confidence < cfg.low_confidence_threshold {
                    recommendations.push(Recommendation {
                        priority: RecommendationPriority::Critical,
                        message: format!(
                            "Seek validation: confidence {:.2} is below {:.2}",
                            confidence, cfg.low_confidence_threshold
                        ),
                    });
                } else {
                    recommendations.push(Recommendation {
                        priority: RecommendationPriority::High,
                        message: "Seek validation from a human reviewer to reach the validated tier"
                            .to_string(),
                    });
                }
                recommendations.push(Recommendation {
                    priority: RecommendationPriority::Low,
                    message: format!(
                        "After validation, complete {} tasks for proven status",
                        cfg.proven_threshold
                    ),
                });
            }
            ConfidenceTier::Validated => {
                let remaining = cfg.proven_threshold.saturating_sub(completions);
                recommendations.push(Recommendation {
                    priority: RecommendationPriority::Medium,
                    message: format!(
                        "Complete {} more task{} for proven status",
                        remaining,
                        if remaining == 1 { "" } else { "s" }
                    ),
                });
            }
            ConfidenceTier::Proven => {
                recommendations.push(Recommendation {
                    priority: RecommendationPriority::Low,
                    message: "Proven status reached; keep recording completions to stay calibrated"
                        .to_string(),
                });
            }
        }

        recommendations.sort_by_key(|r| r.priority);
        recommendations
    }

    /// Confidence value, tier and recommendations together.
    pub fn assess(
        &self,
        detection_confidence: f64,
        validated: bool,
        completions: u32,
    ) -> ConfidenceAssessment {
        let confidence_level =
            self.initialize_confidence(detection_confidence, validated, completions);
        ConfidenceAssessment {
            confidence_level,
            tier: self.tier(validated, completions),
            recommendations: self.recommendations(confidence_level, validated, completions),
        }
    }
}
