//! Configuration for the ZPA policy module.

use std::path::Path;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::{Deserialize, Serialize};
use zpa_policy_sdk::{PolicyType, RemoteRule};

/// Environment variable prefix; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "ZPA_POLICY__";

/// Name of the system rule kept first in every reorderable policy set.
pub const DECEPTION_RULE_NAME: &str = "Zscaler Deception";

/// Configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZpaPolicyConfig {
    /// System rule to keep at a fixed position. `None` disables pinning.
    pub pinned_rule: Option<PinnedRuleConfig>,

    /// What to do when a caller declares the pinned rule somewhere else.
    pub pinned_rule_moves: PinnedRuleMoves,

    /// Policy types swept when detaching an object from policy rules.
    pub detach_policy_types: Vec<PolicyType>,
}

impl Default for ZpaPolicyConfig {
    fn default() -> Self {
        Self {
            pinned_rule: Some(PinnedRuleConfig::default()),
            pinned_rule_moves: PinnedRuleMoves::default(),
            detach_policy_types: vec![
                PolicyType::AccessPolicy,
                PolicyType::TimeoutPolicy,
                PolicyType::SiemPolicy,
                PolicyType::ClientForwardingPolicy,
                PolicyType::InspectionPolicy,
            ],
        }
    }
}

impl ZpaPolicyConfig {
    /// Layer an optional YAML file and `ZPA_POLICY__*` env vars over the defaults.
    ///
    /// Defaults come from `#[serde(default)]`, so a partial `pinned_rule`
    /// keeps the default matcher or position for whatever it leaves out.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or a value has the wrong shape.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| match path {
                Some(p) => format!("failed to load zpa_policy config from {}", p.display()),
                None => "failed to load zpa_policy config from environment".to_owned(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if the pinned position is zero or the matcher is blank.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(pinned) = &self.pinned_rule {
            anyhow::ensure!(pinned.position >= 1, "pinned_rule.position must be >= 1");
            anyhow::ensure!(
                !pinned.matcher.value().trim().is_empty(),
                "pinned_rule.matcher must not be blank"
            );
        }
        Ok(())
    }
}

/// A rule the reconciler keeps at `position` unless the caller manages it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PinnedRuleConfig {
    pub matcher: PinnedRuleMatcher,
    pub position: u32,
}

impl Default for PinnedRuleConfig {
    fn default() -> Self {
        Self {
            matcher: PinnedRuleMatcher::Name(DECEPTION_RULE_NAME.to_owned()),
            position: 1,
        }
    }
}

/// How the pinned rule is recognised in the remote list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinnedRuleMatcher {
    /// Exact rule name.
    Name(String),
    /// Exact rule ID.
    Id(String),
}

impl PinnedRuleMatcher {
    #[must_use]
    pub fn matches(&self, rule: &RemoteRule) -> bool {
        match self {
            Self::Name(name) => rule.name == *name,
            Self::Id(id) => rule.id == *id,
        }
    }

    fn value(&self) -> &str {
        match self {
            Self::Name(v) | Self::Id(v) => v,
        }
    }
}

/// Policy for a caller-declared position of the pinned rule that differs
/// from the pinned position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinnedRuleMoves {
    /// Apply the declared position and log a warning.
    #[default]
    Honor,
    /// Fail the reconcile before anything is applied.
    Reject,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn rule(id: &str, name: &str) -> RemoteRule {
        RemoteRule {
            id: id.to_owned(),
            name: name.to_owned(),
            rule_order: "1".to_owned(),
            conditions: Vec::new(),
        }
    }

    #[test]
    fn defaults_pin_deception_rule_first() {
        let config = ZpaPolicyConfig::default();
        let pinned = config.pinned_rule.unwrap();
        assert_eq!(pinned.position, 1);
        assert!(pinned.matcher.matches(&rule("sys1", "Zscaler Deception")));
        assert!(!pinned.matcher.matches(&rule("sys1", "zscaler deception")));
        assert_eq!(config.pinned_rule_moves, PinnedRuleMoves::Honor);
        assert_eq!(config.detach_policy_types.len(), 5);
    }

    #[test]
    fn null_pinned_rule_disables_pinning() {
        let config: ZpaPolicyConfig =
            serde_json::from_value(serde_json::json!({ "pinned_rule": null })).unwrap();
        assert_eq!(config.pinned_rule, None);
        assert_eq!(config.pinned_rule_moves, PinnedRuleMoves::Honor);
    }

    #[test]
    fn id_matcher_and_reject_mode_deserialize() {
        let config: ZpaPolicyConfig = serde_json::from_value(serde_json::json!({
            "pinned_rule": { "matcher": { "id": "sys-42" }, "position": 2 },
            "pinned_rule_moves": "reject",
            "detach_policy_types": ["ACCESS_POLICY"]
        }))
        .unwrap();
        let pinned = config.pinned_rule.unwrap();
        assert!(pinned.matcher.matches(&rule("sys-42", "anything")));
        assert_eq!(pinned.position, 2);
        assert_eq!(config.pinned_rule_moves, PinnedRuleMoves::Reject);
        assert_eq!(config.detach_policy_types, vec![PolicyType::AccessPolicy]);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<ZpaPolicyConfig, _> =
            serde_json::from_value(serde_json::json!({ "pinned_rules": null }));
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_zero_position() {
        let config = ZpaPolicyConfig {
            pinned_rule: Some(PinnedRuleConfig {
                position: 0,
                ..PinnedRuleConfig::default()
            }),
            ..ZpaPolicyConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
