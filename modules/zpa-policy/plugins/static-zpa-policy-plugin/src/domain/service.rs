//! Service implementation for the static ZPA policy plugin.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use zpa_policy_sdk::conditions::compile_conditions;
use zpa_policy_sdk::{PolicyBackendError, PolicyScope, RemoteCondition, RemoteRule};

use crate::config::{SeedRule, StaticPolicyPluginConfig};

/// In-memory policy sets keyed by scope.
///
/// Each list is kept in position order, and `rule_order` always equals the
/// 1-based index in the list.
#[derive(Default)]
pub struct Service {
    policies: RwLock<HashMap<PolicyScope, Vec<RemoteRule>>>,
    reorder_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl Service {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_config(config: &StaticPolicyPluginConfig) -> Self {
        let svc = Self::new();
        for set in &config.policies {
            let scope = PolicyScope::new(set.policy_type).with_microtenant(set.microtenant_id.clone());
            svc.seed(&scope, set.rules.clone());
        }
        svc
    }

    /// Replace the rule list of `scope`; rules are numbered in the given order.
    pub fn seed(&self, scope: &PolicyScope, rules: Vec<SeedRule>) {
        let mut list: Vec<RemoteRule> = rules
            .into_iter()
            .map(|r| RemoteRule {
                id: r.id,
                name: r.name,
                rule_order: String::new(),
                conditions: compile_conditions(&r.conditions),
            })
            .collect();
        renumber(&mut list);
        self.policies.write().insert(scope.clone(), list);
    }

    /// Current rules of `scope` in position order. Unknown scopes are empty.
    #[must_use]
    pub fn rules(&self, scope: &PolicyScope) -> Vec<RemoteRule> {
        self.policies.read().get(scope).cloned().unwrap_or_default()
    }

    /// Rule IDs of `scope` in position order.
    #[must_use]
    pub fn rule_ids(&self, scope: &PolicyScope) -> Vec<String> {
        self.policies
            .read()
            .get(scope)
            .map(|list| list.iter().map(|r| r.id.clone()).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn reorder_calls(&self) -> usize {
        self.reorder_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    /// Move the requested rules to their positions in one step.
    ///
    /// The whole map is checked first; on any error nothing moves. Rules not
    /// in the map fill the remaining slots in their previous relative order.
    ///
    /// # Errors
    ///
    /// - `NotFound` for a rule ID missing from the scope
    /// - `Api` (400) for a position outside `1..=len` or a position used twice
    pub fn reorder(
        &self,
        scope: &PolicyScope,
        orders: &BTreeMap<String, u32>,
    ) -> Result<(), PolicyBackendError> {
        self.reorder_calls.fetch_add(1, Ordering::SeqCst);
        let mut policies = self.policies.write();
        let Some(list) = policies.get_mut(scope) else {
            return match orders.keys().next() {
                Some(id) => Err(PolicyBackendError::not_found(format!("rule '{id}' in {scope}"))),
                None => Ok(()),
            };
        };

        let mut slots: Vec<Option<usize>> = vec![None; list.len()];
        for (id, position) in orders {
            let Some(idx) = list.iter().position(|r| &r.id == id) else {
                return Err(PolicyBackendError::not_found(format!("rule '{id}' in {scope}")));
            };
            let slot = usize::try_from(*position)
                .ok()
                .and_then(|p| p.checked_sub(1))
                .filter(|s| *s < list.len())
                .ok_or_else(|| {
                    PolicyBackendError::api(
                        400,
                        format!("position {position} for rule '{id}' is outside 1..={}", list.len()),
                    )
                })?;
            if slots[slot].replace(idx).is_some() {
                return Err(PolicyBackendError::api(
                    400,
                    format!("position {position} is requested for more than one rule"),
                ));
            }
        }

        let mut untouched = (0..list.len()).filter(|idx| !slots.contains(&Some(*idx)));
        let order: Vec<usize> = slots
            .iter()
            .map(|slot| slot.or_else(|| untouched.next()))
            .collect::<Option<Vec<usize>>>()
            .ok_or_else(|| PolicyBackendError::Internal("slot assignment ran out of rules".to_owned()))?;

        let mut previous: Vec<Option<RemoteRule>> = std::mem::take(list).into_iter().map(Some).collect();
        *list = order.into_iter().filter_map(|idx| previous[idx].take()).collect();
        renumber(list);
        tracing::debug!(scope = %scope, moved = orders.len(), "reordered static policy set");
        Ok(())
    }

    /// Replace the conditions of one rule.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown rule.
    pub fn replace_conditions(
        &self,
        scope: &PolicyScope,
        rule_id: &str,
        conditions: Vec<RemoteCondition>,
    ) -> Result<(), PolicyBackendError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut policies = self.policies.write();
        let rule = policies
            .get_mut(scope)
            .and_then(|list| list.iter_mut().find(|r| r.id == rule_id))
            .ok_or_else(|| PolicyBackendError::not_found(format!("rule '{rule_id}' in {scope}")))?;
        rule.conditions = conditions;
        Ok(())
    }
}

fn renumber(list: &mut [RemoteRule]) {
    for (idx, rule) in list.iter_mut().enumerate() {
        rule.rule_order = (idx + 1).to_string();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use zpa_policy_sdk::PolicyType;

    fn scope() -> PolicyScope {
        PolicyScope::new(PolicyType::AccessPolicy)
    }

    fn seeded(ids: &[&str]) -> Service {
        let svc = Service::new();
        svc.seed(
            &scope(),
            ids.iter().map(|id| SeedRule::new(*id, format!("rule {id}"))).collect(),
        );
        svc
    }

    fn orders(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
        pairs.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
    }

    #[test]
    fn seed_numbers_rules_in_order() {
        let svc = seeded(&["a", "b", "c"]);
        let rules = svc.rules(&scope());
        let numbered: Vec<(&str, &str)> = rules
            .iter()
            .map(|r| (r.id.as_str(), r.rule_order.as_str()))
            .collect();
        assert_eq!(numbered, vec![("a", "1"), ("b", "2"), ("c", "3")]);
    }

    #[test]
    fn untouched_rules_fill_gaps_in_relative_order() {
        let svc = seeded(&["a", "b", "c", "d", "e"]);
        svc.reorder(&scope(), &orders(&[("e", 1), ("a", 3)])).unwrap();
        assert_eq!(svc.rule_ids(&scope()), vec!["e", "b", "a", "c", "d"]);
        assert_eq!(svc.rules(&scope())[2].rule_order, "3");
    }

    #[test]
    fn invalid_map_leaves_list_unchanged() {
        let svc = seeded(&["a", "b", "c"]);
        let before = svc.rules(&scope());

        let err = svc.reorder(&scope(), &orders(&[("a", 3), ("b", 4)])).unwrap_err();
        assert!(matches!(err, PolicyBackendError::Api { status: 400, .. }));

        let err = svc.reorder(&scope(), &orders(&[("a", 2), ("b", 2)])).unwrap_err();
        assert!(matches!(err, PolicyBackendError::Api { status: 400, .. }));

        let err = svc.reorder(&scope(), &orders(&[("a", 2), ("zzz", 1)])).unwrap_err();
        assert!(err.is_not_found());

        let err = svc.reorder(&scope(), &orders(&[("a", 0)])).unwrap_err();
        assert!(matches!(err, PolicyBackendError::Api { status: 400, .. }));

        assert_eq!(svc.rules(&scope()), before);
        assert_eq!(svc.reorder_calls(), 4);
    }

    #[test]
    fn unknown_scope_lists_empty() {
        let svc = Service::new();
        assert!(svc.rules(&scope()).is_empty());
        assert!(svc.reorder(&scope(), &BTreeMap::new()).is_ok());
        assert!(svc.reorder(&scope(), &orders(&[("a", 1)])).unwrap_err().is_not_found());
    }

    #[test]
    fn replace_conditions_requires_known_rule() {
        let svc = seeded(&["a"]);
        assert!(svc.replace_conditions(&scope(), "a", Vec::new()).is_ok());
        assert!(
            svc.replace_conditions(&scope(), "missing", Vec::new())
                .unwrap_err()
                .is_not_found()
        );
        assert_eq!(svc.update_calls(), 2);
    }

    #[test]
    fn scopes_are_isolated_by_microtenant() {
        let svc = seeded(&["a"]);
        let mt = scope().with_microtenant(Some("mt-1"));
        svc.seed(&mt, vec![SeedRule::new("x", "other")]);
        assert_eq!(svc.rule_ids(&scope()), vec!["a"]);
        assert_eq!(svc.rule_ids(&mt), vec!["x"]);
    }
}
