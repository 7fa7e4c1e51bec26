//! Domain service for the ZPA policy module.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};
use zpa_policy_sdk::conditions::{compile_conditions, decompile_conditions, remove_value};
use zpa_policy_sdk::{
    ConditionCompiler, DetachOutcome, DetachRequest, DetachedRule, ObservedRuleOrder,
    PolicyRuleBackend, PolicyScope, PolicyType, RemoteRule, RuleOrderRequest,
};

use super::error::DomainError;
use super::locks::PolicyListLocks;
use super::order::{self, DesiredOrder};
use crate::config::ZpaPolicyConfig;

/// Rule-order reconciler and detach flow over one [`PolicyRuleBackend`].
pub struct Service {
    backend: Arc<dyn PolicyRuleBackend>,
    locks: Arc<PolicyListLocks>,
    compiler: ConditionCompiler,
    config: ZpaPolicyConfig,
}

impl Service {
    #[must_use]
    pub fn new(backend: Arc<dyn PolicyRuleBackend>, config: ZpaPolicyConfig) -> Self {
        Self {
            backend,
            locks: Arc::new(PolicyListLocks::new()),
            compiler: ConditionCompiler::default(),
            config,
        }
    }

    /// Share a lock registry with other code paths touching the same rule lists.
    #[must_use]
    pub fn with_locks(mut self, locks: Arc<PolicyListLocks>) -> Self {
        self.locks = locks;
        self
    }

    #[must_use]
    pub fn with_compiler(mut self, compiler: ConditionCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    #[must_use]
    pub fn locks(&self) -> &Arc<PolicyListLocks> {
        &self.locks
    }

    #[must_use]
    pub fn config(&self) -> &ZpaPolicyConfig {
        &self.config
    }

    /// Resolve, fetch, adjust and apply the declared order, then read back
    /// the resulting remote positions.
    ///
    /// The scope's lock is held from fetch through apply.
    ///
    /// # Errors
    ///
    /// - Declaration errors before any remote call
    /// - `PinnedRuleMoved` after fetch, before apply, in reject mode
    /// - Backend errors from list or bulk reorder, unchanged
    #[tracing::instrument(
        skip_all,
        fields(policy_type = %request.policy_type, microtenant_id = ?request.microtenant_id)
    )]
    pub async fn reorder(&self, request: RuleOrderRequest) -> Result<ObservedRuleOrder, DomainError> {
        let desired = DesiredOrder::resolve(&request)?;
        let scope = request.scope();

        {
            let _guard = self.locks.acquire(&scope).await;
            let snapshot = self.backend.list_rules(&scope).await?;
            let adjusted = order::adjust(
                &desired,
                &snapshot,
                self.config.pinned_rule.as_ref(),
                self.config.pinned_rule_moves,
            )?;

            if adjusted.orders.is_empty() {
                debug!("nothing to reorder");
            } else {
                self.backend.bulk_reorder(&scope, &adjusted.orders).await?;
                info!(
                    rules = adjusted.orders.len(),
                    pinned = ?adjusted.pinned,
                    "applied rule order"
                );
            }
        }

        let managed: BTreeSet<String> = desired.rule_ids().map(str::to_owned).collect();
        let current = self.backend.list_rules(&scope).await?;
        Ok(observe(request.policy_type, &managed, &current))
    }

    /// Report the current remote positions of the declared rules.
    ///
    /// Declared orders are not validated; only the rule IDs matter.
    ///
    /// # Errors
    ///
    /// Backend errors from listing the rules, unchanged.
    #[tracing::instrument(
        skip_all,
        fields(policy_type = %request.policy_type, microtenant_id = ?request.microtenant_id)
    )]
    pub async fn read_order(
        &self,
        request: RuleOrderRequest,
    ) -> Result<ObservedRuleOrder, DomainError> {
        let managed: BTreeSet<String> = request
            .rules
            .iter()
            .filter(|r| !r.id.trim().is_empty())
            .map(|r| r.id.clone())
            .collect();
        let current = self.backend.list_rules(&request.scope()).await?;
        Ok(observe(request.policy_type, &managed, &current))
    }

    /// Remove an object from every rule of the configured policy types.
    ///
    /// Best effort: a policy type that cannot be listed, or a rule that
    /// cannot be updated, is logged and skipped.
    ///
    /// # Errors
    ///
    /// `EmptyDetachTarget` when the object type or ID is blank.
    #[tracing::instrument(
        skip_all,
        fields(object_type = %request.object_type, object_id = %request.object_id)
    )]
    pub async fn detach_object(&self, request: DetachRequest) -> Result<DetachOutcome, DomainError> {
        if request.object_type.trim().is_empty() || request.object_id.trim().is_empty() {
            return Err(DomainError::EmptyDetachTarget);
        }

        let mut outcome = DetachOutcome::default();
        for policy_type in &self.config.detach_policy_types {
            let scope =
                PolicyScope::new(*policy_type).with_microtenant(request.microtenant_id.clone());
            let _guard = self.locks.acquire(&scope).await;

            let rules = match self.backend.list_rules(&scope).await {
                Ok(rules) => rules,
                Err(e) => {
                    warn!(policy_type = %policy_type, error = %e, "failed to list policy rules for detach");
                    continue;
                }
            };

            for rule in &rules {
                match self.detach_from_rule(&scope, rule, &request).await {
                    Ok(true) => {
                        info!(policy_type = %policy_type, rule_id = %rule.id, "detached object from policy rule");
                        outcome.updated_rules.push(DetachedRule {
                            policy_type: *policy_type,
                            rule_id: rule.id.clone(),
                        });
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!(
                            policy_type = %policy_type,
                            rule_id = %rule.id,
                            error = %e,
                            "failed to detach object from policy rule"
                        );
                    }
                }
            }
        }
        Ok(outcome)
    }

    async fn detach_from_rule(
        &self,
        scope: &PolicyScope,
        rule: &RemoteRule,
        request: &DetachRequest,
    ) -> Result<bool, DomainError> {
        let mut conditions = decompile_conditions(&rule.conditions);
        if !remove_value(&mut conditions, &request.object_type, &request.object_id) {
            return Ok(false);
        }
        self.compiler.check(&conditions)?;
        self.backend
            .update_rule_conditions(scope, &rule.id, compile_conditions(&conditions))
            .await?;
        Ok(true)
    }
}

fn observe(
    policy_type: PolicyType,
    managed: &BTreeSet<String>,
    current: &[RemoteRule],
) -> ObservedRuleOrder {
    let missing = order::missing_rules(managed.iter().map(String::as_str), current);
    let positions = current
        .iter()
        .filter(|r| managed.contains(&r.id))
        .filter_map(|r| r.position().map(|p| (r.id.clone(), p)))
        .collect();
    ObservedRuleOrder {
        policy_type: Some(policy_type),
        resource_id: policy_type.reorder_resource_id(),
        positions,
        missing,
    }
}
