//! Liability firebreak enforcer.
//!
//! Every delegation hop is checked against four independent gates. A
//! triggered gate blocks the hop until an override is approved out of band;
//! nothing in here ever approves one.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::{
    AuthorityLevel, EscalationRecord, EscalationRequest, EscalationStatus, FirebreakConfig,
    FirebreakContext, FirebreakKind, FirebreakResult, FirebreakStats, LiabilityLevel,
    OverrideRequest, OverrideResult, OverrideStatus,
};

/// Gate evaluator with override queue, escalation log and counters.
#[derive(Debug, Default)]
pub struct LiabilityFirebreakEnforcer {
    config: FirebreakConfig,
    stats: FirebreakStats,
    overrides: BTreeMap<String, OverrideResult>,
    escalations: Vec<EscalationRecord>,
}

impl LiabilityFirebreakEnforcer {
    pub fn new(config: FirebreakConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &FirebreakConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Enforcement
    // -----------------------------------------------------------------------

    /// Check one hop from `from_agent` to `to_agent`.
    pub fn enforce_firebreaks(
        &mut self,
        from_agent: &str,
        to_agent: &str,
        context: &FirebreakContext,
    ) -> FirebreakResult {
        let triggered = self.triggered_gates(context);
        let liability_level = self.liability_level(context);
        let required_authority = triggered
            .iter()
            .map(|(kind, _)| kind.required_authority())
            .max()
            .unwrap_or(AuthorityLevel::Agent);

        let result = FirebreakResult {
            firebreaks_passed: triggered.is_empty(),
            blocking_firebreaks: triggered.iter().map(|(kind, _)| *kind).collect(),
            required_authority,
            manual_override_available: !triggered.is_empty(),
            liability_level,
            chain_length: context.chain_length(),
            from_agent: from_agent.to_string(),
            to_agent: to_agent.to_string(),
            evaluated_at: Utc::now(),
            messages: triggered.into_iter().map(|(_, message)| message).collect(),
        };

        self.stats.total_validations += 1;
        *self.stats.liability_distribution.entry(liability_level).or_insert(0) += 1;
        if result.firebreaks_passed {
            self.stats.passed += 1;
            log::debug!(
                "Firebreaks passed {} → {} (liability {:?})",
                from_agent,
                to_agent,
                liability_level
            );
        } else {
            self.stats.blocked += 1;
            for kind in &result.blocking_firebreaks {
                *self.stats.block_reasons.entry(*kind).or_insert(0) += 1;
            }
            log::warn!(
                "Delegation {} → {} blocked by [{}], requires {} authority",
                from_agent,
                to_agent,
                result
                    .blocking_firebreaks
                    .iter()
                    .map(FirebreakKind::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
                required_authority
            );
        }
        result
    }

    /// Triggered gates with a message each, in fixed gate order.
    fn triggered_gates(&self, context: &FirebreakContext) -> Vec<(FirebreakKind, String)> {
        let depth = context.depth();
        let value = context.value();
        let mut gates = Vec::new();

        if depth > self.config.executive_max_depth {
            gates.push((
                FirebreakKind::DelegationDepthExceeded,
                format!(
                    "delegation depth {} exceeds executive threshold {}",
                    depth, self.config.executive_max_depth
                ),
            ));
        }

        let kind = FirebreakKind::HighValueTransaction;
        if value > self.config.high_value_limit
            && !context.is_approved(kind, kind.required_authority())
        {
            gates.push((
                kind,
                format!(
                    "estimated value {} exceeds limit {} without {} approval",
                    value,
                    self.config.high_value_limit,
                    kind.required_authority()
                ),
            ));
        }

        let kind = FirebreakKind::CriticalSystemAccess;
        if context.involves_critical_systems
            && !context.is_approved(kind, kind.required_authority())
        {
            gates.push((
                kind,
                format!("critical system access without {} approval", kind.required_authority()),
            ));
        }

        let kind = FirebreakKind::ExternalDelegation;
        if context.is_external_delegation && !context.is_approved(kind, kind.required_authority()) {
            gates.push((
                kind,
                format!("external delegation without {} approval", kind.required_authority()),
            ));
        }

        gates
    }

    /// Liability band for a context, highest band first.
    pub fn liability_level(&self, context: &FirebreakContext) -> LiabilityLevel {
        let depth = context.depth();
        let value = context.value();
        let limit = self.config.high_value_limit;

        if context.involves_critical_systems
            || context.is_external_delegation
            || value > limit
            || depth > self.config.executive_max_depth
            || (depth > self.config.supervisor_max_depth && value > limit / 2.0)
        {
            LiabilityLevel::Full
        } else if depth > self.config.supervisor_max_depth || value > limit / 2.0 {
            LiabilityLevel::Shared
        } else if depth > 1 || value > self.config.trivial_value_limit {
            LiabilityLevel::Limited
        } else {
            LiabilityLevel::None
        }
    }

    /// Tier an override for `context` needs: the depth tier, raised to the
    /// highest triggered gate.
    pub fn required_override_authority(&self, context: &FirebreakContext) -> AuthorityLevel {
        self.triggered_gates(context)
            .iter()
            .map(|(kind, _)| kind.required_authority())
            .fold(self.config.authority_for_depth(context.depth()), AuthorityLevel::max)
    }

    // -----------------------------------------------------------------------
    // Overrides
    // -----------------------------------------------------------------------

    /// File an override. Returns `Rejected` or `Pending`, never `Approved`.
    pub fn request_override(&mut self, request: OverrideRequest) -> OverrideResult {
        self.stats.overrides_requested += 1;
        let now = Utc::now();
        self.prune_expired(now);
        let required = self.required_override_authority(&request.context);

        let rejection = if request.justification.trim().is_empty() {
            Some("Override justification is required".to_string())
        } else if request.expires_at.map_or(false, |at| at <= now) {
            Some("Override request is already expired".to_string())
        } else if request.authority_level < required {
            Some(format!(
                "Insufficient authority: {} < {} required",
                request.authority_level, required
            ))
        } else {
            None
        };

        let mut result = OverrideResult {
            override_id: Uuid::new_v4().to_string(),
            status: OverrideStatus::Pending,
            required_approvals: Vec::new(),
            auto_approved: false,
            reason: String::new(),
            from_agent: request.from_agent,
            to_agent: request.to_agent,
            requested_by: request.requested_by,
            created_at: now,
            expires_at: request.expires_at,
        };

        match rejection {
            Some(reason) => {
                self.stats.overrides_rejected += 1;
                log::warn!(
                    "Override {} → {} by {} rejected: {}",
                    result.from_agent,
                    result.to_agent,
                    result.requested_by,
                    reason
                );
                result.status = OverrideStatus::Rejected;
                result.reason = reason;
            }
            None => {
                result.required_approvals = vec![required];
                if required == AuthorityLevel::Emergency {
                    result.required_approvals.push(AuthorityLevel::Executive);
                }
                result.reason = format!("Awaiting {} approval", required);
                log::info!(
                    "Override {} queued for {} → {} (requires {})",
                    result.override_id,
                    result.from_agent,
                    result.to_agent,
                    required
                );
                self.overrides.insert(result.override_id.clone(), result.clone());
            }
        }
        result
    }

    /// Unresolved, unexpired overrides, oldest first.
    pub fn get_pending_overrides(&self) -> Vec<&OverrideResult> {
        self.pending_overrides_at(Utc::now())
    }

    pub fn pending_overrides_at(&self, now: DateTime<Utc>) -> Vec<&OverrideResult> {
        let mut pending: Vec<&OverrideResult> = self
            .overrides
            .values()
            .filter(|o| o.status == OverrideStatus::Pending && !o.is_expired_at(now))
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        pending
    }

    /// Drop queued overrides that expired at or before `now`; returns how many.
    pub fn prune_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.overrides.len();
        self.overrides.retain(|_, o| !o.is_expired_at(now));
        let pruned = before - self.overrides.len();
        if pruned > 0 {
            log::debug!("Pruned {} expired override requests", pruned);
        }
        pruned
    }

    /// Number of overrides still held, expired or not.
    pub fn queued_override_count(&self) -> usize {
        self.overrides.len()
    }

    // -----------------------------------------------------------------------
    // Escalations
    // -----------------------------------------------------------------------

    /// Record an emergency escalation and page the matching contact.
    /// Never grants the bypass.
    pub fn process_emergency_escalation(&mut self, request: EscalationRequest) -> EscalationRecord {
        let exceeds_emergency_ceiling =
            request.requested_bypass_depth > self.config.emergency_max_depth;

        // Exact level first, else the nearest level above it.
        let contact = self
            .config
            .emergency_contacts
            .iter()
            .filter(|c| c.level >= request.emergency_level)
            .min_by_key(|c| c.level);

        let record = EscalationRecord {
            escalation_id: Uuid::new_v4().to_string(),
            agent_id: request.agent_id,
            emergency_level: request.emergency_level,
            reason: request.reason,
            requested_bypass_depth: request.requested_bypass_depth,
            status: EscalationStatus::PendingReview,
            exceeds_emergency_ceiling,
            contact_notified: contact.map(|c| c.name.clone()),
            bypass_granted: false,
            approval_required: true,
            created_at: Utc::now(),
        };

        log::error!(
            "Emergency escalation {} from agent '{}' ({:?}): {}; bypass depth {}{}; notified {}",
            record.escalation_id,
            record.agent_id,
            record.emergency_level,
            record.reason,
            record.requested_bypass_depth,
            if exceeds_emergency_ceiling { " exceeds ceiling" } else { "" },
            contact.map_or("nobody", |c| c.name.as_str())
        );

        self.stats.escalations += 1;
        self.escalations.push(record.clone());
        record
    }

    pub fn get_escalations(&self) -> &[EscalationRecord] {
        &self.escalations
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    pub fn get_stats(&self) -> &FirebreakStats {
        &self.stats
    }

    /// Zero the counters. Queued overrides and escalations are kept.
    pub fn reset_stats(&mut self) {
        self.stats = FirebreakStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firebreak::types::{EmergencyLevel, FirebreakConfig};
    use chrono::Duration;

    fn enforcer() -> LiabilityFirebreakEnforcer {
        LiabilityFirebreakEnforcer::new(FirebreakConfig::default())
    }

    fn override_request(authority: AuthorityLevel, context: FirebreakContext) -> OverrideRequest {
        OverrideRequest {
            from_agent: "planner".to_string(),
            to_agent: "executor".to_string(),
            requested_by: "alice".to_string(),
            authority_level: authority,
            justification: "customer escalation".to_string(),
            context,
            expires_at: None,
        }
    }

    #[test]
    fn test_shallow_low_value_hop_passes() {
        let mut enforcer = enforcer();
        let result = enforcer.enforce_firebreaks("a", "b", &FirebreakContext::new(1, 10.0));
        assert!(result.firebreaks_passed);
        assert!(result.blocking_firebreaks.is_empty());
        assert!(!result.manual_override_available);
        assert_eq!(result.liability_level, LiabilityLevel::None);
        assert_eq!(result.required_authority, AuthorityLevel::Agent);
        assert_eq!(result.chain_length, 1);
    }

    #[test]
    fn test_depth_beyond_executive_threshold() {
        let mut enforcer = enforcer();
        let result = enforcer.enforce_firebreaks("a", "b", &FirebreakContext::new(8, 10.0));
        assert!(!result.firebreaks_passed);
        assert!(result.is_blocked_by(FirebreakKind::DelegationDepthExceeded));
        assert_eq!(result.required_authority, AuthorityLevel::Emergency);
        assert!(result.manual_override_available);

        let at_threshold = enforcer.enforce_firebreaks("a", "b", &FirebreakContext::new(7, 10.0));
        assert!(at_threshold.firebreaks_passed);
    }

    #[test]
    fn test_high_value_is_full_liability() {
        let mut enforcer = enforcer();
        let result = enforcer.enforce_firebreaks("a", "b", &FirebreakContext::new(1, 200_000.0));
        assert!(!result.firebreaks_passed);
        assert_eq!(result.blocking_firebreaks, vec![FirebreakKind::HighValueTransaction]);
        assert_eq!(result.liability_level, LiabilityLevel::Full);
        assert_eq!(result.required_authority, AuthorityLevel::Manager);
    }

    #[test]
    fn test_external_requires_executive() {
        let mut enforcer = enforcer();
        let ctx = FirebreakContext::new(1, 10.0).external().critical();
        let result = enforcer.enforce_firebreaks("a", "b", &ctx);
        assert!(result.is_blocked_by(FirebreakKind::ExternalDelegation));
        assert!(result.is_blocked_by(FirebreakKind::CriticalSystemAccess));
        assert_eq!(result.required_authority, AuthorityLevel::Executive);
        assert_eq!(result.messages.len(), 2);
    }

    #[test]
    fn test_approval_on_record_clears_gate() {
        let mut enforcer = enforcer();
        let ctx = FirebreakContext::new(1, 200_000.0)
            .with_approval(FirebreakKind::HighValueTransaction, AuthorityLevel::Executive, "cfo");
        let result = enforcer.enforce_firebreaks("a", "b", &ctx);
        assert!(result.firebreaks_passed);
        assert_eq!(result.liability_level, LiabilityLevel::Full);

        let weak = FirebreakContext::new(1, 200_000.0)
            .with_approval(FirebreakKind::HighValueTransaction, AuthorityLevel::Supervisor, "lead");
        assert!(!enforcer.enforce_firebreaks("a", "b", &weak).firebreaks_passed);
    }

    #[test]
    fn test_negative_inputs_never_reduce_risk() {
        let mut enforcer = enforcer();
        let negative = FirebreakContext::new(-5, -1.0).external();
        let result = enforcer.enforce_firebreaks("a", "b", &negative);
        assert!(!result.firebreaks_passed);
        assert_eq!(result.liability_level, LiabilityLevel::Full);

        let nan = enforcer.enforce_firebreaks("a", "b", &FirebreakContext::new(1, f64::NAN));
        assert!(nan.is_blocked_by(FirebreakKind::HighValueTransaction));
    }

    #[test]
    fn test_liability_bands() {
        let enforcer = enforcer();
        let level = |depth, value| enforcer.liability_level(&FirebreakContext::new(depth, value));
        assert_eq!(level(1, 500.0), LiabilityLevel::None);
        assert_eq!(level(2, 500.0), LiabilityLevel::Limited);
        assert_eq!(level(1, 5_000.0), LiabilityLevel::Limited);
        assert_eq!(level(5, 500.0), LiabilityLevel::Shared);
        assert_eq!(level(1, 60_000.0), LiabilityLevel::Shared);
        assert_eq!(level(5, 60_000.0), LiabilityLevel::Full);

        let critical = FirebreakContext::new(1, 1.0).critical();
        assert_eq!(enforcer.liability_level(&critical), LiabilityLevel::Full);
    }

    #[test]
    fn test_chain_length() {
        let mut enforcer = enforcer();
        let ctx = FirebreakContext::new(2, 1.0).with_chain(["a", "b", "c"]);
        assert_eq!(enforcer.enforce_firebreaks("b", "c", &ctx).chain_length, 3);
    }

    #[test]
    fn test_override_insufficient_authority_rejected() {
        let mut enforcer = enforcer();
        let result = enforcer.request_override(override_request(
            AuthorityLevel::Agent,
            FirebreakContext::new(4, 10.0),
        ));
        assert_eq!(result.status, OverrideStatus::Rejected);
        assert!(result.reason.contains("Insufficient authority"));
        assert!(!result.auto_approved);
        assert!(enforcer.get_pending_overrides().is_empty());
        assert_eq!(enforcer.get_stats().overrides_rejected, 1);
    }

    #[test]
    fn test_override_sufficient_authority_is_pending() {
        let mut enforcer = enforcer();
        let result = enforcer.request_override(override_request(
            AuthorityLevel::Supervisor,
            FirebreakContext::new(4, 10.0),
        ));
        assert_eq!(result.status, OverrideStatus::Pending);
        assert_eq!(result.required_approvals, vec![AuthorityLevel::Supervisor]);
        assert!(!result.auto_approved);

        let pending = enforcer.get_pending_overrides();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].override_id, result.override_id);
    }

    #[test]
    fn test_override_gate_raises_required_authority() {
        let mut enforcer = enforcer();
        let ctx = FirebreakContext::new(1, 10.0).external();
        let rejected =
            enforcer.request_override(override_request(AuthorityLevel::Manager, ctx.clone()));
        assert_eq!(rejected.status, OverrideStatus::Rejected);

        let deep = enforcer.request_override(override_request(
            AuthorityLevel::Emergency,
            FirebreakContext::new(9, 1.0),
        ));
        assert_eq!(deep.status, OverrideStatus::Pending);
        assert_eq!(
            deep.required_approvals,
            vec![AuthorityLevel::Emergency, AuthorityLevel::Executive]
        );
    }

    #[test]
    fn test_override_blank_justification_or_expired() {
        let mut enforcer = enforcer();
        let mut blank = override_request(AuthorityLevel::Emergency, FirebreakContext::new(1, 1.0));
        blank.justification = "   ".to_string();
        assert_eq!(enforcer.request_override(blank).status, OverrideStatus::Rejected);

        let mut stale = override_request(AuthorityLevel::Emergency, FirebreakContext::new(1, 1.0));
        stale.expires_at = Some(Utc::now() - Duration::minutes(1));
        assert_eq!(enforcer.request_override(stale).status, OverrideStatus::Rejected);
    }

    #[test]
    fn test_pending_override_expires_lazily() {
        let mut enforcer = enforcer();
        let mut request =
            override_request(AuthorityLevel::Executive, FirebreakContext::new(1, 1.0));
        let expires = Utc::now() + Duration::minutes(30);
        request.expires_at = Some(expires);
        enforcer.request_override(request);

        assert_eq!(enforcer.get_pending_overrides().len(), 1);
        assert!(enforcer.pending_overrides_at(expires).is_empty());
    }

    #[test]
    fn test_expired_overrides_are_pruned() {
        let mut enforcer = enforcer();
        let expires = Utc::now() + Duration::minutes(5);
        let mut short = override_request(AuthorityLevel::Executive, FirebreakContext::new(1, 1.0));
        short.expires_at = Some(expires);
        enforcer.request_override(short);
        enforcer.request_override(override_request(
            AuthorityLevel::Executive,
            FirebreakContext::new(1, 1.0),
        ));
        assert_eq!(enforcer.queued_override_count(), 2);

        assert_eq!(enforcer.prune_expired(expires), 1);
        assert_eq!(enforcer.queued_override_count(), 1);
        assert_eq!(enforcer.prune_expired(expires), 0);
        assert_eq!(enforcer.get_pending_overrides().len(), 1);
    }

    #[test]
    fn test_request_override_prunes_expired_entries() {
        let mut enforcer = enforcer();
        let mut stale = override_request(AuthorityLevel::Executive, FirebreakContext::new(1, 1.0));
        stale.expires_at = Some(Utc::now() + Duration::milliseconds(150));
        enforcer.request_override(stale);
        assert_eq!(enforcer.queued_override_count(), 1);

        std::thread::sleep(std::time::Duration::from_millis(300));
        enforcer.request_override(override_request(
            AuthorityLevel::Executive,
            FirebreakContext::new(1, 1.0),
        ));
        assert_eq!(enforcer.queued_override_count(), 1);
    }

    #[test]
    fn test_emergency_escalation_never_grants_bypass() {
        let mut enforcer = enforcer();
        let record = enforcer.process_emergency_escalation(EscalationRequest {
            agent_id: "executor".to_string(),
            emergency_level: EmergencyLevel::Critical,
            reason: "production outage".to_string(),
            requested_bypass_depth: 12,
        });
        assert!(!record.bypass_granted);
        assert!(record.approval_required);
        assert!(record.exceeds_emergency_ceiling);
        assert_eq!(record.status, EscalationStatus::PendingReview);
        assert_eq!(record.contact_notified.as_deref(), Some("executive-on-call"));

        let low = enforcer.process_emergency_escalation(EscalationRequest {
            agent_id: "executor".to_string(),
            emergency_level: EmergencyLevel::Low,
            reason: "slow queue".to_string(),
            requested_bypass_depth: 8,
        });
        assert!(!low.exceeds_emergency_ceiling);
        assert_eq!(low.contact_notified.as_deref(), Some("duty-manager"));

        assert_eq!(enforcer.get_escalations().len(), 2);
        assert_eq!(enforcer.get_stats().escalations, 2);
    }

    #[test]
    fn test_stats_and_reset() {
        let mut enforcer = enforcer();
        enforcer.enforce_firebreaks("a", "b", &FirebreakContext::new(1, 1.0));
        enforcer.enforce_firebreaks("a", "b", &FirebreakContext::new(9, 1.0).external());
        enforcer.enforce_firebreaks("a", "b", &FirebreakContext::new(1, 1.0).external());

        let stats = enforcer.get_stats();
        assert_eq!(stats.total_validations, 3);
        assert_eq!(stats.passed, 1);
        assert_eq!(stats.blocked, 2);
        assert_eq!(stats.block_reasons[&FirebreakKind::ExternalDelegation], 2);
        assert_eq!(stats.block_reasons[&FirebreakKind::DelegationDepthExceeded], 1);
        assert_eq!(stats.liability_distribution[&LiabilityLevel::Full], 2);
        assert_eq!(stats.liability_distribution[&LiabilityLevel::None], 1);

        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["block_reasons"]["external_delegation"], 2);

        enforcer.reset_stats();
        assert_eq!(enforcer.get_stats(), &FirebreakStats::default());
    }
}
