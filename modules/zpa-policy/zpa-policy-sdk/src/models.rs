//! Rule ordering and policy scope models.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::conditions::RemoteCondition;
use crate::error::UnknownPolicyType;

/// Suffix of the reorder resource identifier (`"{POLICY_TYPE}-reorder"`).
pub const REORDER_ID_SUFFIX: &str = "-reorder";

/// Remote policy categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyType {
    AccessPolicy,
    GlobalPolicy,
    CapabilitiesPolicy,
    BypassPolicy,
    ClientForwardingPolicy,
    CredentialPolicy,
    IsolationPolicy,
    InspectionPolicy,
    RedirectionPolicy,
    ReauthPolicy,
    TimeoutPolicy,
    ClientlessSessionProtectionPolicy,
    SiemPolicy,
}

impl PolicyType {
    pub const ALL: [Self; 13] = [
        Self::AccessPolicy,
        Self::GlobalPolicy,
        Self::CapabilitiesPolicy,
        Self::BypassPolicy,
        Self::ClientForwardingPolicy,
        Self::CredentialPolicy,
        Self::IsolationPolicy,
        Self::InspectionPolicy,
        Self::RedirectionPolicy,
        Self::ReauthPolicy,
        Self::TimeoutPolicy,
        Self::ClientlessSessionProtectionPolicy,
        Self::SiemPolicy,
    ];

    /// The upper-case wire token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AccessPolicy => "ACCESS_POLICY",
            Self::GlobalPolicy => "GLOBAL_POLICY",
            Self::CapabilitiesPolicy => "CAPABILITIES_POLICY",
            Self::BypassPolicy => "BYPASS_POLICY",
            Self::ClientForwardingPolicy => "CLIENT_FORWARDING_POLICY",
            Self::CredentialPolicy => "CREDENTIAL_POLICY",
            Self::IsolationPolicy => "ISOLATION_POLICY",
            Self::InspectionPolicy => "INSPECTION_POLICY",
            Self::RedirectionPolicy => "REDIRECTION_POLICY",
            Self::ReauthPolicy => "REAUTH_POLICY",
            Self::TimeoutPolicy => "TIMEOUT_POLICY",
            Self::ClientlessSessionProtectionPolicy => "CLIENTLESS_SESSION_PROTECTION_POLICY",
            Self::SiemPolicy => "SIEM_POLICY",
        }
    }

    /// Whether the remote accepts a bulk reorder for this policy type.
    #[must_use]
    pub const fn is_reorderable(self) -> bool {
        !matches!(self, Self::SiemPolicy)
    }

    /// Identifier of the order resource owning this policy type.
    #[must_use]
    pub fn reorder_resource_id(self) -> String {
        format!("{}{REORDER_ID_SUFFIX}", self.as_str())
    }

    /// Parse an imported identifier: either the bare policy type or the
    /// `-reorder` suffixed resource ID.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownPolicyType`] when the token is not a known policy type.
    pub fn from_reorder_resource_id(id: &str) -> Result<Self, UnknownPolicyType> {
        id.strip_suffix(REORDER_ID_SUFFIX).unwrap_or(id).parse()
    }
}

impl FromStr for PolicyType {
    type Err = UnknownPolicyType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownPolicyType(s.to_owned()))
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote rule list: a policy type, optionally inside a micro-tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PolicyScope {
    pub policy_type: PolicyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub microtenant_id: Option<String>,
}

impl PolicyScope {
    #[must_use]
    pub fn new(policy_type: PolicyType) -> Self {
        Self {
            policy_type,
            microtenant_id: None,
        }
    }

    /// Scope the rule list to a micro-tenant. Blank IDs mean "no micro-tenant".
    #[must_use]
    pub fn with_microtenant(mut self, microtenant_id: Option<impl Into<String>>) -> Self {
        self.microtenant_id = normalize_microtenant(microtenant_id.map(Into::into));
        self
    }
}

impl fmt::Display for PolicyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.microtenant_id {
            Some(mt) => write!(f, "{}@{mt}", self.policy_type),
            None => write!(f, "{}", self.policy_type),
        }
    }
}

fn normalize_microtenant(id: Option<String>) -> Option<String> {
    id.filter(|s| !s.trim().is_empty())
}

/// A caller-declared `(rule ID, order string)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredRuleOrder {
    pub id: String,
    pub order: String,
}

/// Input to the rule-order reconciler.
///
/// Constructed fresh on every create/update/read of the order resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOrderRequest {
    pub policy_type: PolicyType,
    #[serde(default)]
    pub microtenant_id: Option<String>,
    #[serde(default)]
    pub rules: Vec<DeclaredRuleOrder>,
}

impl RuleOrderRequest {
    #[must_use]
    pub fn new(policy_type: PolicyType) -> Self {
        Self {
            policy_type,
            microtenant_id: None,
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_microtenant(mut self, microtenant_id: impl Into<String>) -> Self {
        self.microtenant_id = Some(microtenant_id.into());
        self
    }

    /// Declare the order of one rule.
    #[must_use]
    pub fn rule(mut self, id: impl Into<String>, order: impl Into<String>) -> Self {
        self.rules.push(DeclaredRuleOrder {
            id: id.into(),
            order: order.into(),
        });
        self
    }

    #[must_use]
    pub fn scope(&self) -> PolicyScope {
        PolicyScope::new(self.policy_type).with_microtenant(self.microtenant_id.clone())
    }
}

/// A rule as listed by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRule {
    pub id: String,
    pub name: String,
    /// Decimal position string as reported by the remote.
    pub rule_order: String,
    #[serde(default)]
    pub conditions: Vec<RemoteCondition>,
}

impl RemoteRule {
    /// The parsed 1-based position, if the remote reported a valid one.
    #[must_use]
    pub fn position(&self) -> Option<u32> {
        self.rule_order.trim().parse().ok()
    }
}

/// Remote positions of the managed rules, as observed after a reconcile or read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedRuleOrder {
    pub policy_type: Option<PolicyType>,
    pub resource_id: String,
    /// Actual remote position per managed rule ID found remotely.
    pub positions: BTreeMap<String, u32>,
    /// Managed rule IDs no longer present remotely.
    pub missing: Vec<String>,
}

impl ObservedRuleOrder {
    /// Render the observation back into declared form, sorted by rule ID.
    #[must_use]
    pub fn to_declared(&self) -> Vec<DeclaredRuleOrder> {
        self.positions
            .iter()
            .map(|(id, position)| DeclaredRuleOrder {
                id: id.clone(),
                order: position.to_string(),
            })
            .collect()
    }
}

/// Remove every reference to one object from the policy rules mentioning it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachRequest {
    pub object_type: String,
    pub object_id: String,
    #[serde(default)]
    pub microtenant_id: Option<String>,
}

impl DetachRequest {
    #[must_use]
    pub fn new(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
            microtenant_id: None,
        }
    }

    #[must_use]
    pub fn with_microtenant(mut self, microtenant_id: impl Into<String>) -> Self {
        self.microtenant_id = Some(microtenant_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachedRule {
    pub policy_type: PolicyType,
    pub rule_id: String,
}

/// Rules whose conditions were rewritten by a detach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetachOutcome {
    pub updated_rules: Vec<DetachedRule>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn policy_type_round_trips_wire_token() {
        for t in PolicyType::ALL {
            assert_eq!(t.as_str().parse::<PolicyType>(), Ok(t));
            assert_eq!(
                serde_json::to_value(t).unwrap(),
                serde_json::Value::String(t.as_str().to_owned())
            );
        }
    }

    #[test]
    fn unknown_policy_type_is_rejected() {
        let err = "access_policy".parse::<PolicyType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown policy type 'access_policy'");
    }

    #[test]
    fn only_siem_is_not_reorderable() {
        let fixed: Vec<_> = PolicyType::ALL
            .into_iter()
            .filter(|t| !t.is_reorderable())
            .collect();
        assert_eq!(fixed, vec![PolicyType::SiemPolicy]);
    }

    #[test]
    fn reorder_resource_id_accepts_both_forms() {
        assert_eq!(
            PolicyType::TimeoutPolicy.reorder_resource_id(),
            "TIMEOUT_POLICY-reorder"
        );
        assert_eq!(
            PolicyType::from_reorder_resource_id("TIMEOUT_POLICY-reorder"),
            Ok(PolicyType::TimeoutPolicy)
        );
        assert_eq!(
            PolicyType::from_reorder_resource_id("ACCESS_POLICY"),
            Ok(PolicyType::AccessPolicy)
        );
        assert!(PolicyType::from_reorder_resource_id("-reorder").is_err());
    }

    #[test]
    fn blank_microtenant_means_none() {
        let scope = PolicyScope::new(PolicyType::AccessPolicy).with_microtenant(Some("  "));
        assert_eq!(scope.microtenant_id, None);
        assert_eq!(scope.to_string(), "ACCESS_POLICY");

        let scope = RuleOrderRequest::new(PolicyType::AccessPolicy)
            .with_microtenant("mt-1")
            .scope();
        assert_eq!(scope.microtenant_id.as_deref(), Some("mt-1"));
        assert_eq!(scope.to_string(), "ACCESS_POLICY@mt-1");
    }

    #[test]
    fn remote_rule_position_tolerates_garbage() {
        let mut rule = RemoteRule {
            id: "r1".to_owned(),
            name: "rule".to_owned(),
            rule_order: " 3 ".to_owned(),
            conditions: Vec::new(),
        };
        assert_eq!(rule.position(), Some(3));
        rule.rule_order = "first".to_owned();
        assert_eq!(rule.position(), None);
    }

    #[test]
    fn remote_rule_deserializes_camel_case() {
        let rule: RemoteRule = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "name": "Allow",
            "ruleOrder": "2"
        }))
        .unwrap();
        assert_eq!(rule.position(), Some(2));
        assert!(rule.conditions.is_empty());
    }

    #[test]
    fn observed_order_renders_sorted_by_id() {
        let observed = ObservedRuleOrder {
            policy_type: Some(PolicyType::AccessPolicy),
            resource_id: PolicyType::AccessPolicy.reorder_resource_id(),
            positions: BTreeMap::from([("b".to_owned(), 1), ("a".to_owned(), 2)]),
            missing: Vec::new(),
        };
        let declared = observed.to_declared();
        assert_eq!(declared[0].id, "a");
        assert_eq!(declared[0].order, "2");
        assert_eq!(declared[1].id, "b");
    }
}
