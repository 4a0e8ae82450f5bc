//! Feature flag configuration, evaluation context and evaluation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who changed a flag, why and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagMetadata {
    pub reason: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}

impl FlagMetadata {
    pub fn new(reason: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            actor: actor.into(),
            timestamp: Utc::now(),
        }
    }
}

impl Default for FlagMetadata {
    fn default() -> Self {
        Self::new("created", "system")
    }
}

/// Full configuration of one flag.
///
/// ```yaml
/// id: predictive_routing
/// enabled: false
/// rollout_percentage: 25
/// environments: [staging]
/// dependencies: [capability_learning]
/// expires_at: 2027-01-01T00:00:00Z
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagConfig {
    pub id: String,

    /// Manual state; the fallback when no other rule decides.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub description: Option<String>,

    /// Percentage of subjects (0-100) enabled by deterministic hashing.
    #[serde(default)]
    pub rollout_percentage: Option<f64>,

    /// Environments the flag may be on in. `None` means any.
    #[serde(default)]
    pub environments: Option<Vec<String>>,

    /// Tenants the flag may be on for. `None` means any.
    #[serde(default)]
    pub tenants: Option<Vec<String>>,

    /// Users always enabled, regardless of rollout.
    #[serde(default)]
    pub allowed_users: Vec<String>,

    /// Users always disabled, regardless of rollout. Wins over `allowed_users`.
    #[serde(default)]
    pub denied_users: Vec<String>,

    /// Flags that must evaluate enabled (same context) for this one to.
    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub metadata: FlagMetadata,
}

impl FlagConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            enabled: false,
            description: None,
            rollout_percentage: None,
            environments: None,
            tenants: None,
            allowed_users: Vec::new(),
            denied_users: Vec::new(),
            dependencies: Vec::new(),
            expires_at: None,
            metadata: FlagMetadata::default(),
        }
    }

    /// Builder: manual state.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder: description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder: staged rollout percentage.
    pub fn rollout(mut self, percentage: f64) -> Self {
        self.rollout_percentage = Some(percentage);
        self
    }

    /// Builder: environment allow-list.
    pub fn environments<I, S>(mut self, environments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.environments = Some(environments.into_iter().map(Into::into).collect());
        self
    }

    /// Builder: tenant allow-list.
    pub fn tenants<I, S>(mut self, tenants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tenants = Some(tenants.into_iter().map(Into::into).collect());
        self
    }

    /// Builder: users always enabled.
    pub fn allow_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_users.extend(users.into_iter().map(Into::into));
        self
    }

    /// Builder: users always disabled.
    pub fn deny_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denied_users.extend(users.into_iter().map(Into::into));
        self
    }

    /// Builder: dependency flags.
    pub fn depends_on<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies.extend(flags.into_iter().map(Into::into));
        self
    }

    /// Builder: expiry instant.
    pub fn expires_at(mut self, at: DateTime<Utc>) -> Self {
        self.expires_at = Some(at);
        self
    }

    /// Builder: change metadata.
    pub fn with_metadata(mut self, reason: impl Into<String>, actor: impl Into<String>) -> Self {
        self.metadata = FlagMetadata::new(reason, actor);
        self
    }
}

/// Subject of an evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationContext {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    /// Builder: environment.
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Builder: tenant.
    pub fn tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

/// Which rule decided an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationRule {
    UnknownFlag,
    MasterSwitch,
    SecurityFloor,
    Expired,
    Dependency,
    UserTargeting,
    Targeting,
    Rollout,
    Manual,
}

/// Verdict plus the reason behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagEvaluation {
    pub flag_id: String,
    pub enabled: bool,
    pub rule: EvaluationRule,
    pub reason: String,
}

impl FlagEvaluation {
    pub(crate) fn new(
        flag_id: &str,
        enabled: bool,
        rule: EvaluationRule,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            flag_id: flag_id.to_string(),
            enabled,
            rule,
            reason: reason.into(),
        }
    }
}

/// Serialized state of a flag manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagSnapshot {
    pub master_switch: String,
    pub exported_at: DateTime<Utc>,
    pub flags: Vec<FlagConfig>,
}
