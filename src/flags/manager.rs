//! Feature flag manager: evaluation engine and mutation API.
//!
//! Evaluation is first-match-wins:
//!
//! 1. master switch off        → disabled (the master switch itself is exempt)
//! 2. security flag            → enabled (non-bypassable while the master is on)
//! 3. past `expires_at`        → disabled
//! 4. any dependency disabled  → disabled
//! 5. user deny/allow list     → that list's verdict
//! 6. environment/tenant miss  → disabled
//! 7. `rollout_percentage`     → deterministic bucket < percentage
//! 8. otherwise                → manual `enabled`

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::FlagError;
use super::flag::{
    EvaluationContext, EvaluationRule, FlagConfig, FlagEvaluation, FlagMetadata, FlagSnapshot,
};
use super::rollout::rollout_bucket;

/// Marker stamped into every flag's metadata by [`FeatureFlagManager::emergency_disable`].
pub const EMERGENCY_MARKER: &str = "EMERGENCY KILLSWITCH";

/// Platform flags seeded by [`FeatureFlagManager::with_defaults`]: (id, enabled, description).
const PLATFORM_FLAGS: &[(&str, bool, &str)] = &[
    ("confidence_bootstrap", true, "Bootstrap capability manifests from agent sources"),
    ("workload_balancing", true, "Penalize busy agents when ranking"),
    ("capability_learning", false, "Adjust confidence from task outcomes"),
    ("predictive_routing", false, "Route work by predicted agent fit"),
];

/// Manager tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagsConfig {
    /// Flag that gates every other flag.
    #[serde(default = "default_master_switch")]
    pub master_switch: String,
    /// Flags that are always on while the master switch is on.
    #[serde(default = "default_security_flags")]
    pub security_flags: Vec<String>,
    /// Seed the platform flags on construction.
    #[serde(default = "default_true")]
    pub seed_defaults: bool,
    /// Environment used when a caller's context names none.
    #[serde(default)]
    pub default_environment: Option<String>,
}

fn default_master_switch() -> String { "system_enabled".to_string() }
fn default_security_flags() -> Vec<String> {
    vec![
        "liability_firebreaks".to_string(),
        "pattern_enforcement".to_string(),
        "audit_logging".to_string(),
    ]
}
fn default_true() -> bool { true }

impl Default for FlagsConfig {
    fn default() -> Self {
        Self {
            master_switch: default_master_switch(),
            security_flags: default_security_flags(),
            seed_defaults: true,
            default_environment: None,
        }
    }
}

/// In-memory flag store and evaluator. No internal locking; see
/// [`super::global`] for a shared process-wide handle.
#[derive(Debug, Clone)]
pub struct FeatureFlagManager {
    flags: BTreeMap<String, FlagConfig>,
    config: FlagsConfig,
}

impl Default for FeatureFlagManager {
    fn default() -> Self {
        Self::new(FlagsConfig::default())
    }
}

impl FeatureFlagManager {
    /// Create a manager holding the master switch and security flags (all
    /// on), plus the platform flags when `config.seed_defaults` is set.
    pub fn new(config: FlagsConfig) -> Self {
        let mut manager = Self {
            flags: BTreeMap::new(),
            config,
        };
        manager.ensure_builtin_flags();

        if manager.config.seed_defaults {
            for (id, enabled, description) in PLATFORM_FLAGS {
                manager.flags.insert(
                    id.to_string(),
                    FlagConfig::new(*id).enabled(*enabled).description(*description),
                );
            }
        }
        manager
    }

    /// Manager with the built-in and platform flags.
    pub fn with_defaults() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &FlagsConfig {
        &self.config
    }

    pub fn master_switch_id(&self) -> &str {
        &self.config.master_switch
    }

    pub fn is_security_flag(&self, flag_id: &str) -> bool {
        self.config.security_flags.iter().any(|f| f == flag_id)
    }

    /// Manual state of the master switch. A missing master switch counts as off.
    pub fn master_enabled(&self) -> bool {
        self.flags
            .get(&self.config.master_switch)
            .map_or(false, |f| f.enabled)
    }

    pub fn get_flag(&self, flag_id: &str) -> Option<&FlagConfig> {
        self.flags.get(flag_id)
    }

    /// All flags, ordered by id.
    pub fn list_flags(&self) -> Vec<&FlagConfig> {
        self.flags.values().collect()
    }

    // -----------------------------------------------------------------------
    // Evaluation
    // -----------------------------------------------------------------------

    pub fn is_enabled(&self, flag_id: &str, context: &EvaluationContext) -> bool {
        self.evaluate(flag_id, context).enabled
    }

    pub fn evaluate(&self, flag_id: &str, context: &EvaluationContext) -> FlagEvaluation {
        self.evaluate_at(flag_id, context, Utc::now())
    }

    /// Evaluate as of `now` (expiry is checked lazily against it).
    pub fn evaluate_at(
        &self,
        flag_id: &str,
        context: &EvaluationContext,
        now: DateTime<Utc>,
    ) -> FlagEvaluation {
        let mut context = context.clone();
        if context.environment.is_none() {
            context.environment = self.config.default_environment.clone();
        }
        let mut chain = Vec::new();
        let evaluation = self.evaluate_inner(flag_id, &context, now, &mut chain);
        log::trace!(
            "Flag '{}' → {} ({})",
            flag_id,
            evaluation.enabled,
            evaluation.reason
        );
        evaluation
    }

    /// Evaluate every flag for one context.
    pub fn get_all_flags(&self, context: &EvaluationContext) -> BTreeMap<String, FlagEvaluation> {
        let now = Utc::now();
        self.flags
            .keys()
            .map(|id| (id.clone(), self.evaluate_at(id, context, now)))
            .collect()
    }

    fn evaluate_inner(
        &self,
        flag_id: &str,
        context: &EvaluationContext,
        now: DateTime<Utc>,
        chain: &mut Vec<String>,
    ) -> FlagEvaluation {
        let Some(flag) = self.flags.get(flag_id) else {
            return FlagEvaluation::new(flag_id, false, EvaluationRule::UnknownFlag, "unknown flag");
        };

        let master = &self.config.master_switch;
        if flag_id == master.as_str() {
            return FlagEvaluation::new(
                flag_id,
                flag.enabled,
                EvaluationRule::Manual,
                if flag.enabled { "master switch is on" } else { "master switch is off" },
            );
        }
        if !self.master_enabled() {
            return FlagEvaluation::new(
                flag_id,
                false,
                EvaluationRule::MasterSwitch,
                format!("master switch '{}' is off", master),
            );
        }

        if self.is_security_flag(flag_id) {
            return FlagEvaluation::new(
                flag_id,
                true,
                EvaluationRule::SecurityFloor,
                "security flag is always on while the master switch is on",
            );
        }

        if let Some(expires_at) = flag.expires_at {
            if expires_at <= now {
                return FlagEvaluation::new(
                    flag_id,
                    false,
                    EvaluationRule::Expired,
                    format!("flag expired at {}", expires_at.to_rfc3339()),
                );
            }
        }

        chain.push(flag_id.to_string());
        for dependency in &flag.dependencies {
            if chain.iter().any(|seen| seen == dependency) {
                chain.pop();
                return FlagEvaluation::new(
                    flag_id,
                    false,
                    EvaluationRule::Dependency,
                    format!("dependency cycle through '{}'", dependency),
                );
            }
            let verdict = self.evaluate_inner(dependency, context, now, chain);
            if !verdict.enabled {
                chain.pop();
                return FlagEvaluation::new(
                    flag_id,
                    false,
                    EvaluationRule::Dependency,
                    format!("dependency '{}' is disabled ({})", dependency, verdict.reason),
                );
            }
        }
        chain.pop();

        if let Some(user_id) = context.user_id.as_deref() {
            if flag.denied_users.iter().any(|u| u == user_id) {
                return FlagEvaluation::new(
                    flag_id,
                    false,
                    EvaluationRule::UserTargeting,
                    format!("user '{}' is on the deny list", user_id),
                );
            }
            if flag.allowed_users.iter().any(|u| u == user_id) {
                return FlagEvaluation::new(
                    flag_id,
                    true,
                    EvaluationRule::UserTargeting,
                    format!("user '{}' is on the allow list", user_id),
                );
            }
        }

        if let Some(reason) = targeting_miss(
            "environment",
            flag.environments.as_deref(),
            context.environment.as_deref(),
        ) {
            return FlagEvaluation::new(flag_id, false, EvaluationRule::Targeting, reason);
        }
        if let Some(reason) =
            targeting_miss("tenant", flag.tenants.as_deref(), context.tenant_id.as_deref())
        {
            return FlagEvaluation::new(flag_id, false, EvaluationRule::Targeting, reason);
        }

        if let Some(percentage) = flag.rollout_percentage {
            let subject = context.user_id.as_deref().unwrap_or_default();
            let bucket = rollout_bucket(flag_id, subject);
            let enabled = bucket < percentage;
            return FlagEvaluation::new(
                flag_id,
                enabled,
                EvaluationRule::Rollout,
                format!(
                    "rollout bucket {:.2} {} {}%",
                    bucket,
                    if enabled { "<" } else { ">=" },
                    percentage
                ),
            );
        }

        FlagEvaluation::new(
            flag_id,
            flag.enabled,
            EvaluationRule::Manual,
            if flag.enabled { "manually enabled" } else { "manually disabled" },
        )
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Turn a flag fully on, creating it if needed. Clears any staged rollout.
    pub fn enable(&mut self, flag_id: &str, reason: &str, actor: &str) -> Result<(), FlagError> {
        self.set_manual(flag_id, true, reason, actor)
    }

    /// Turn a flag fully off, creating it if needed. Clears any staged rollout.
    pub fn disable(&mut self, flag_id: &str, reason: &str, actor: &str) -> Result<(), FlagError> {
        self.set_manual(flag_id, false, reason, actor)
    }

    fn set_manual(
        &mut self,
        flag_id: &str,
        enabled: bool,
        reason: &str,
        actor: &str,
    ) -> Result<(), FlagError> {
        if flag_id.trim().is_empty() {
            return Err(FlagError::EmptyFlagId);
        }
        let flag = self
            .flags
            .entry(flag_id.to_string())
            .or_insert_with(|| FlagConfig::new(flag_id));
        flag.enabled = enabled;
        flag.rollout_percentage = None;
        flag.metadata = FlagMetadata::new(reason, actor);

        log::info!(
            "Flag '{}' {} by {}: {}",
            flag_id,
            if enabled { "enabled" } else { "disabled" },
            actor,
            reason
        );
        Ok(())
    }

    /// Insert or replace a flag's whole configuration.
    pub fn configure(&mut self, mut config: FlagConfig) -> Result<(), FlagError> {
        validate_flag(&config)?;
        config.metadata.timestamp = Utc::now();
        log::info!(
            "Flag '{}' configured by {}: {}",
            config.id,
            config.metadata.actor,
            config.metadata.reason
        );
        self.flags.insert(config.id.clone(), config);
        Ok(())
    }

    /// Kill switch: turn off the master switch and every flag in one step.
    pub fn emergency_disable(&mut self, reason: &str) {
        let marker = format!("{}: {}", EMERGENCY_MARKER, reason);
        let now = Utc::now();
        for flag in self.flags.values_mut() {
            flag.enabled = false;
            flag.rollout_percentage = None;
            flag.metadata = FlagMetadata {
                reason: marker.clone(),
                actor: "emergency".to_string(),
                timestamp: now,
            };
        }
        let master = self.config.master_switch.clone();
        self.flags
            .entry(master.clone())
            .or_insert_with(|| FlagConfig::new(master).with_metadata(marker.clone(), "emergency"));

        log::error!(
            "{} engaged, {} flags disabled: {}",
            EMERGENCY_MARKER,
            self.flags.len(),
            reason
        );
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    pub fn export(&self) -> FlagSnapshot {
        FlagSnapshot {
            master_switch: self.config.master_switch.clone(),
            exported_at: Utc::now(),
            flags: self.flags.values().cloned().collect(),
        }
    }

    /// Replace the whole flag state with `snapshot`.
    ///
    /// Every flag is validated before anything is replaced. Built-in flags
    /// missing from the snapshot are recreated switched on.
    pub fn import(&mut self, snapshot: FlagSnapshot) -> Result<(), FlagError> {
        if snapshot.master_switch.trim().is_empty() {
            return Err(FlagError::EmptyMasterSwitch);
        }
        for flag in &snapshot.flags {
            validate_flag(flag)?;
        }
        if snapshot.master_switch != self.config.master_switch {
            log::warn!(
                "Importing snapshot with master switch '{}' into manager using '{}'",
                snapshot.master_switch,
                self.config.master_switch
            );
            self.config.master_switch = snapshot.master_switch;
        }
        self.flags = snapshot
            .flags
            .into_iter()
            .map(|flag| (flag.id.clone(), flag))
            .collect();
        self.ensure_builtin_flags();
        log::info!("Imported {} feature flags", self.flags.len());
        Ok(())
    }

    pub fn export_json(&self) -> Result<String, FlagError> {
        Ok(serde_json::to_string_pretty(&self.export())?)
    }

    pub fn import_json(&mut self, json: &str) -> Result<(), FlagError> {
        let snapshot: FlagSnapshot = serde_json::from_str(json)?;
        self.import(snapshot)
    }

    fn ensure_builtin_flags(&mut self) {
        let builtin = std::iter::once(self.config.master_switch.clone())
            .chain(self.config.security_flags.iter().cloned());
        for id in builtin {
            self.flags
                .entry(id.clone())
                .or_insert_with(|| FlagConfig::new(id).enabled(true));
        }
    }
}

fn validate_flag(flag: &FlagConfig) -> Result<(), FlagError> {
    if flag.id.trim().is_empty() {
        return Err(FlagError::EmptyFlagId);
    }
    if let Some(value) = flag.rollout_percentage {
        if !(0.0..=100.0).contains(&value) {
            return Err(FlagError::InvalidRollout {
                flag_id: flag.id.clone(),
                value,
            });
        }
    }
    Ok(())
}

/// `Some(reason)` when targeting is configured and the context misses it.
fn targeting_miss(kind: &str, allowed: Option<&[String]>, actual: Option<&str>) -> Option<String> {
    let allowed = allowed.filter(|list| !list.is_empty())?;
    match actual {
        Some(value) if allowed.iter().any(|a| a == value) => None,
        Some(value) => Some(format!("{} '{}' is not targeted", kind, value)),
        None => Some(format!("no {} in context; flag targets {}", kind, allowed.join(", "))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn bare() -> FeatureFlagManager {
        FeatureFlagManager::new(FlagsConfig {
            seed_defaults: false,
            ..Default::default()
        })
    }

    fn ctx() -> EvaluationContext {
        EvaluationContext::default()
    }

    #[test]
    fn test_builtin_and_default_flags() {
        let manager = FeatureFlagManager::with_defaults();
        assert!(manager.is_enabled("system_enabled", &ctx()));
        assert!(manager.is_enabled("liability_firebreaks", &ctx()));
        assert!(manager.is_enabled("workload_balancing", &ctx()));
        assert!(!manager.is_enabled("capability_learning", &ctx()));
        assert!(bare().get_flag("predictive_routing").is_none());
    }

    #[test]
    fn test_unknown_flag_is_disabled() {
        let evaluation = bare().evaluate("nope", &ctx());
        assert!(!evaluation.enabled);
        assert_eq!(evaluation.rule, EvaluationRule::UnknownFlag);
    }

    #[test]
    fn test_rollout_distribution_and_stability() {
        let mut manager = FeatureFlagManager::with_defaults();
        manager
            .configure(FlagConfig::new("predictive_routing").rollout(50.0))
            .unwrap();

        let enabled = (0..100)
            .filter(|i| {
                let ctx = EvaluationContext::for_user(format!("user-{}", i));
                manager.is_enabled("predictive_routing", &ctx)
            })
            .count();
        assert!((40..=60).contains(&enabled), "enabled = {}", enabled);

        let user = EvaluationContext::for_user("user-42");
        let first = manager.is_enabled("predictive_routing", &user);
        for _ in 0..3 {
            assert_eq!(manager.is_enabled("predictive_routing", &user), first);
        }
    }

    #[test]
    fn test_dependency_gates_flag() {
        let mut manager = FeatureFlagManager::with_defaults();
        manager
            .configure(
                FlagConfig::new("smart_routing")
                    .enabled(true)
                    .depends_on(["capability_learning"]),
            )
            .unwrap();

        let evaluation = manager.evaluate("smart_routing", &ctx());
        assert!(!evaluation.enabled);
        assert_eq!(evaluation.rule, EvaluationRule::Dependency);
        assert!(evaluation.reason.contains("capability_learning"));

        manager.enable("capability_learning", "ready", "ops").unwrap();
        assert!(manager.is_enabled("smart_routing", &ctx()));
    }

    #[test]
    fn test_dependency_cycle_is_disabled() {
        let mut manager = bare();
        manager.configure(FlagConfig::new("a").enabled(true).depends_on(["b"])).unwrap();
        manager.configure(FlagConfig::new("b").enabled(true).depends_on(["a"])).unwrap();

        let evaluation = manager.evaluate("a", &ctx());
        assert!(!evaluation.enabled);
        assert!(evaluation.reason.contains("cycle"));
    }

    #[test]
    fn test_expired_flag() {
        let mut manager = bare();
        manager
            .configure(
                FlagConfig::new("temporary")
                    .enabled(true)
                    .expires_at(Utc::now() - Duration::seconds(1)),
            )
            .unwrap();

        let evaluation = manager.evaluate("temporary", &ctx());
        assert!(!evaluation.enabled);
        assert!(evaluation.reason.contains("expired"));

        let future = Utc::now() + Duration::hours(1);
        manager
            .configure(FlagConfig::new("later").enabled(true).expires_at(future))
            .unwrap();
        assert!(manager.is_enabled("later", &ctx()));
        assert!(!manager.evaluate_at("later", &ctx(), future).enabled);
    }

    #[test]
    fn test_user_lists_override_rollout() {
        let mut manager = bare();
        manager
            .configure(
                FlagConfig::new("beta")
                    .rollout(0.0)
                    .allow_users(["vip"])
                    .deny_users(["banned"]),
            )
            .unwrap();

        let vip = manager.evaluate("beta", &EvaluationContext::for_user("vip"));
        assert!(vip.enabled);
        assert_eq!(vip.rule, EvaluationRule::UserTargeting);
        assert!(!manager.is_enabled("beta", &EvaluationContext::for_user("someone")));

        manager
            .configure(FlagConfig::new("ga").rollout(100.0).deny_users(["banned"]))
            .unwrap();
        assert!(!manager.is_enabled("ga", &EvaluationContext::for_user("banned")));
        assert!(manager.is_enabled("ga", &EvaluationContext::for_user("someone")));
    }

    #[test]
    fn test_environment_and_tenant_targeting() {
        let mut manager = bare();
        manager
            .configure(
                FlagConfig::new("staging_only")
                    .enabled(true)
                    .environments(["staging"])
                    .tenants(["acme"]),
            )
            .unwrap();

        let hit = EvaluationContext::new().environment("staging").tenant("acme");
        assert!(manager.is_enabled("staging_only", &hit));

        let wrong_env = EvaluationContext::new().environment("production").tenant("acme");
        let evaluation = manager.evaluate("staging_only", &wrong_env);
        assert!(!evaluation.enabled);
        assert_eq!(evaluation.rule, EvaluationRule::Targeting);

        assert!(!manager.is_enabled("staging_only", &EvaluationContext::new().tenant("acme")));
        let staging = EvaluationContext::new().environment("staging");
        assert!(!manager.is_enabled("staging_only", &staging));
    }

    #[test]
    fn test_default_environment_applies() {
        let mut manager = FeatureFlagManager::new(FlagsConfig {
            seed_defaults: false,
            default_environment: Some("staging".to_string()),
            ..Default::default()
        });
        manager
            .configure(FlagConfig::new("staging_only").enabled(true).environments(["staging"]))
            .unwrap();
        assert!(manager.is_enabled("staging_only", &ctx()));
        let production = EvaluationContext::new().environment("production");
        assert!(!manager.is_enabled("staging_only", &production));
    }

    #[test]
    fn test_master_switch_and_security_floor() {
        let mut manager = FeatureFlagManager::with_defaults();
        manager.disable("liability_firebreaks", "trying to bypass", "agent-x").unwrap();
        let evaluation = manager.evaluate("liability_firebreaks", &ctx());
        assert!(evaluation.enabled);
        assert_eq!(evaluation.rule, EvaluationRule::SecurityFloor);

        manager.disable("system_enabled", "maintenance", "ops").unwrap();
        let evaluation = manager.evaluate("workload_balancing", &ctx());
        assert!(!evaluation.enabled);
        assert!(evaluation.reason.contains("system_enabled"));
        assert!(!manager.is_enabled("liability_firebreaks", &ctx()));
        assert!(!manager.is_enabled("system_enabled", &ctx()));
    }

    #[test]
    fn test_enable_disable_stamp_metadata_and_clear_rollout() {
        let mut manager = bare();
        manager.configure(FlagConfig::new("staged").rollout(10.0)).unwrap();
        manager.enable("staged", "ship it", "alice").unwrap();

        let flag = manager.get_flag("staged").unwrap();
        assert!(flag.enabled);
        assert!(flag.rollout_percentage.is_none());
        assert_eq!(flag.metadata.reason, "ship it");
        assert_eq!(flag.metadata.actor, "alice");

        manager.disable("staged", "rollback", "bob").unwrap();
        assert!(!manager.is_enabled("staged", &EvaluationContext::for_user("anyone")));
        assert_eq!(manager.get_flag("staged").unwrap().metadata.actor, "bob");

        assert!(matches!(manager.enable("", "x", "y"), Err(FlagError::EmptyFlagId)));
    }

    #[test]
    fn test_configure_rejects_bad_rollout() {
        let mut manager = bare();
        let err = manager.configure(FlagConfig::new("bad").rollout(150.0)).unwrap_err();
        assert!(matches!(err, FlagError::InvalidRollout { .. }));
        assert!(manager.configure(FlagConfig::new("nan").rollout(f64::NAN)).is_err());
        assert!(manager.get_flag("bad").is_none());
    }

    #[test]
    fn test_emergency_disable() {
        let mut manager = FeatureFlagManager::with_defaults();
        let previously_enabled: Vec<String> = manager
            .get_all_flags(&ctx())
            .into_iter()
            .filter(|(_, e)| e.enabled)
            .map(|(id, _)| id)
            .collect();
        assert!(!previously_enabled.is_empty());

        manager.emergency_disable("reason X");

        for id in &previously_enabled {
            assert!(!manager.is_enabled(id, &ctx()), "{} still enabled", id);
            let metadata = &manager.get_flag(id).unwrap().metadata;
            assert!(metadata.reason.contains(EMERGENCY_MARKER));
            assert!(metadata.reason.contains("reason X"));
        }
        assert!(!manager.master_enabled());
    }

    #[test]
    fn test_get_all_flags() {
        let manager = FeatureFlagManager::with_defaults();
        let all = manager.get_all_flags(&ctx());
        assert_eq!(all.len(), manager.list_flags().len());
        assert!(all["pattern_enforcement"].enabled);
        assert!(!all["predictive_routing"].enabled);
    }

    #[test]
    fn test_export_import() {
        let mut source = FeatureFlagManager::with_defaults();
        source.configure(FlagConfig::new("beta").rollout(30.0)).unwrap();
        source.disable("workload_balancing", "noisy", "ops").unwrap();
        let json = source.export_json().unwrap();

        let mut target = bare();
        target.configure(FlagConfig::new("stale").enabled(true)).unwrap();
        target.import_json(&json).unwrap();

        assert!(target.get_flag("stale").is_none());
        assert_eq!(target.get_flag("beta").unwrap().rollout_percentage, Some(30.0));
        assert!(!target.is_enabled("workload_balancing", &ctx()));
        assert_eq!(target.list_flags().len(), source.list_flags().len());
    }

    #[test]
    fn test_import_validates_before_replacing() {
        let mut manager = FeatureFlagManager::with_defaults();
        let mut snapshot = manager.export();
        snapshot.flags.push(FlagConfig::new("broken").rollout(-5.0));

        assert!(manager.import(snapshot).is_err());
        assert!(manager.get_flag("workload_balancing").is_some());
        assert!(manager.import_json("not json").is_err());
    }

    #[test]
    fn test_import_rejects_blank_master_switch() {
        let mut manager = FeatureFlagManager::with_defaults();
        let mut snapshot = manager.export();
        snapshot.master_switch = "  ".to_string();

        assert!(matches!(manager.import(snapshot), Err(FlagError::EmptyMasterSwitch)));
        assert_eq!(manager.master_switch_id(), "system_enabled");
        assert!(manager.get_flag("").is_none());

        manager.disable("system_enabled", "maintenance", "ops").unwrap();
        assert!(!manager.is_enabled("workload_balancing", &EvaluationContext::default()));
    }
}
