//! Firebreak domain types: authority tiers, gates, contexts, results and
//! the override/escalation records.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// Ordered approval tier. `Agent < Supervisor < Manager < Executive < Emergency`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorityLevel {
    Agent,
    Supervisor,
    Manager,
    Executive,
    Emergency,
}

impl fmt::Display for AuthorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthorityLevel::Agent => "agent",
            AuthorityLevel::Supervisor => "supervisor",
            AuthorityLevel::Manager => "manager",
            AuthorityLevel::Executive => "executive",
            AuthorityLevel::Emergency => "emergency",
        };
        f.write_str(s)
    }
}

/// Who carries liability for a hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiabilityLevel {
    None,
    Limited,
    Shared,
    Full,
}

/// Severity of an emergency escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// The four gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirebreakKind {
    DelegationDepthExceeded,
    HighValueTransaction,
    CriticalSystemAccess,
    ExternalDelegation,
}

impl FirebreakKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FirebreakKind::DelegationDepthExceeded => "delegation_depth_exceeded",
            FirebreakKind::HighValueTransaction => "high_value_transaction",
            FirebreakKind::CriticalSystemAccess => "critical_system_access",
            FirebreakKind::ExternalDelegation => "external_delegation",
        }
    }

    /// Tier needed to override this gate.
    pub fn required_authority(&self) -> AuthorityLevel {
        match self {
            FirebreakKind::DelegationDepthExceeded => AuthorityLevel::Emergency,
            FirebreakKind::ExternalDelegation | FirebreakKind::CriticalSystemAccess => {
                AuthorityLevel::Executive
            }
            FirebreakKind::HighValueTransaction => AuthorityLevel::Manager,
        }
    }
}

impl fmt::Display for FirebreakKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Someone paged for an emergency escalation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub level: EmergencyLevel,
    pub name: String,
    pub channel: String,
}

/// Enforcer thresholds.
///
/// Depth thresholds are the deepest hop each tier may approve on its own;
/// anything past `executive_max_depth` trips the depth gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirebreakConfig {
    #[serde(default = "default_agent_max_depth")]
    pub agent_max_depth: u32,
    #[serde(default = "default_supervisor_max_depth")]
    pub supervisor_max_depth: u32,
    #[serde(default = "default_manager_max_depth")]
    pub manager_max_depth: u32,
    #[serde(default = "default_executive_max_depth")]
    pub executive_max_depth: u32,
    /// Deepest bypass an emergency escalation may ask for.
    #[serde(default = "default_emergency_max_depth")]
    pub emergency_max_depth: u32,
    #[serde(default = "default_high_value_limit")]
    pub high_value_limit: f64,
    /// Values at or below this carry no liability on their own.
    #[serde(default = "default_trivial_value_limit")]
    pub trivial_value_limit: f64,
    #[serde(default = "default_emergency_contacts")]
    pub emergency_contacts: Vec<EmergencyContact>,
}

fn default_agent_max_depth() -> u32 { 2 }
fn default_supervisor_max_depth() -> u32 { 4 }
fn default_manager_max_depth() -> u32 { 6 }
fn default_executive_max_depth() -> u32 { 7 }
fn default_emergency_max_depth() -> u32 { 10 }
fn default_high_value_limit() -> f64 { 100_000.0 }
fn default_trivial_value_limit() -> f64 { 1_000.0 }
fn default_emergency_contacts() -> Vec<EmergencyContact> {
    vec![
        EmergencyContact {
            level: EmergencyLevel::Medium,
            name: "duty-manager".to_string(),
            channel: "pager".to_string(),
        },
        EmergencyContact {
            level: EmergencyLevel::High,
            name: "incident-commander".to_string(),
            channel: "pager".to_string(),
        },
        EmergencyContact {
            level: EmergencyLevel::Critical,
            name: "executive-on-call".to_string(),
            channel: "phone".to_string(),
        },
    ]
}

impl Default for FirebreakConfig {
    fn default() -> Self {
        Self {
            agent_max_depth: default_agent_max_depth(),
            supervisor_max_depth: default_supervisor_max_depth(),
            manager_max_depth: default_manager_max_depth(),
            executive_max_depth: default_executive_max_depth(),
            emergency_max_depth: default_emergency_max_depth(),
            high_value_limit: default_high_value_limit(),
            trivial_value_limit: default_trivial_value_limit(),
            emergency_contacts: default_emergency_contacts(),
        }
    }
}

impl FirebreakConfig {
    /// Lowest tier allowed to approve a hop at `depth`.
    pub fn authority_for_depth(&self, depth: u32) -> AuthorityLevel {
        if depth <= self.agent_max_depth {
            AuthorityLevel::Agent
        } else if depth <= self.supervisor_max_depth {
            AuthorityLevel::Supervisor
        } else if depth <= self.manager_max_depth {
            AuthorityLevel::Manager
        } else if depth <= self.executive_max_depth {
            AuthorityLevel::Executive
        } else {
            AuthorityLevel::Emergency
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let depths = [
            ("agent_max_depth", self.agent_max_depth),
            ("supervisor_max_depth", self.supervisor_max_depth),
            ("manager_max_depth", self.manager_max_depth),
            ("executive_max_depth", self.executive_max_depth),
            ("emergency_max_depth", self.emergency_max_depth),
        ];
        for pair in depths.windows(2) {
            if pair[0].1 >= pair[1].1 {
                return Err(format!(
                    "{} ({}) must be below {} ({})",
                    pair[0].0, pair[0].1, pair[1].0, pair[1].1
                ));
            }
        }
        if !self.high_value_limit.is_finite() || self.high_value_limit <= 0.0 {
            return Err(format!("high_value_limit must be positive, got {}", self.high_value_limit));
        }
        if !self.trivial_value_limit.is_finite()
            || self.trivial_value_limit < 0.0
            || self.trivial_value_limit >= self.high_value_limit
        {
            return Err(format!(
                "trivial_value_limit must be in [0, high_value_limit), got {}",
                self.trivial_value_limit
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Enforcement
// ---------------------------------------------------------------------------

/// A prior sign-off for one gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approval {
    pub firebreak: FirebreakKind,
    pub authority: AuthorityLevel,
    pub approver: String,
}

/// Risk facts for one delegation attempt.
///
/// The four risk fields have no serde defaults: a payload missing any of
/// them fails to decode instead of evaluating as low risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirebreakContext {
    pub delegation_depth: i64,
    pub estimated_value: f64,
    pub involves_critical_systems: bool,
    pub is_external_delegation: bool,
    #[serde(default)]
    pub chain_agents: Vec<String>,
    #[serde(default)]
    pub approvals: Vec<Approval>,
}

impl FirebreakContext {
    pub fn new(delegation_depth: i64, estimated_value: f64) -> Self {
        Self {
            delegation_depth,
            estimated_value,
            involves_critical_systems: false,
            is_external_delegation: false,
            chain_agents: Vec::new(),
            approvals: Vec::new(),
        }
    }

    pub fn critical(mut self) -> Self {
        self.involves_critical_systems = true;
        self
    }

    pub fn external(mut self) -> Self {
        self.is_external_delegation = true;
        self
    }

    pub fn with_chain<I, S>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chain_agents = agents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_approval(
        mut self,
        firebreak: FirebreakKind,
        authority: AuthorityLevel,
        approver: impl Into<String>,
    ) -> Self {
        self.approvals.push(Approval {
            firebreak,
            authority,
            approver: approver.into(),
        });
        self
    }

    /// Depth with negatives clamped to 0.
    pub fn depth(&self) -> u32 {
        u32::try_from(self.delegation_depth.max(0)).unwrap_or(u32::MAX)
    }

    /// Value with negatives clamped to 0. NaN and infinities read as +inf.
    pub fn value(&self) -> f64 {
        if self.estimated_value.is_finite() {
            self.estimated_value.max(0.0)
        } else {
            f64::INFINITY
        }
    }

    /// Agents in the chain, never less than 1.
    pub fn chain_length(&self) -> usize {
        self.chain_agents.len().max(1)
    }

    /// Whether `firebreak` was signed off by at least `required`.
    pub fn is_approved(&self, firebreak: FirebreakKind, required: AuthorityLevel) -> bool {
        self.approvals
            .iter()
            .any(|a| a.firebreak == firebreak && a.authority >= required)
    }
}

/// Outcome of one `enforce_firebreaks` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirebreakResult {
    pub firebreaks_passed: bool,
    pub blocking_firebreaks: Vec<FirebreakKind>,
    pub required_authority: AuthorityLevel,
    pub manual_override_available: bool,
    pub liability_level: LiabilityLevel,
    pub chain_length: usize,
    pub from_agent: String,
    pub to_agent: String,
    pub evaluated_at: DateTime<Utc>,
    /// One line per blocking gate.
    pub messages: Vec<String>,
}

impl FirebreakResult {
    pub fn is_blocked_by(&self, kind: FirebreakKind) -> bool {
        self.blocking_firebreaks.contains(&kind)
    }
}

/// Running counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirebreakStats {
    pub total_validations: u64,
    pub passed: u64,
    pub blocked: u64,
    pub liability_distribution: BTreeMap<LiabilityLevel, u64>,
    pub block_reasons: BTreeMap<FirebreakKind, u64>,
    pub overrides_requested: u64,
    pub overrides_rejected: u64,
    pub escalations: u64,
}

// ---------------------------------------------------------------------------
// Overrides and escalations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideStatus {
    Pending,
    Approved,
    Rejected,
}

/// Ask to let a blocked hop through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideRequest {
    pub from_agent: String,
    pub to_agent: String,
    pub requested_by: String,
    pub authority_level: AuthorityLevel,
    pub justification: String,
    pub context: FirebreakContext,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideResult {
    pub override_id: String,
    pub status: OverrideStatus,
    /// Tiers that still have to sign off.
    pub required_approvals: Vec<AuthorityLevel>,
    /// Always `false`: a request never approves itself.
    pub auto_approved: bool,
    pub reason: String,
    pub from_agent: String,
    pub to_agent: String,
    pub requested_by: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl OverrideResult {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRequest {
    pub agent_id: String,
    pub emergency_level: EmergencyLevel,
    pub reason: String,
    pub requested_bypass_depth: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    PendingReview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRecord {
    pub escalation_id: String,
    pub agent_id: String,
    pub emergency_level: EmergencyLevel,
    pub reason: String,
    pub requested_bypass_depth: u32,
    pub status: EscalationStatus,
    pub exceeds_emergency_ceiling: bool,
    /// Name of the contact paged, if any matched.
    pub contact_notified: Option<String>,
    pub bypass_granted: bool,
    pub approval_required: bool,
    pub created_at: DateTime<Utc>,
}
