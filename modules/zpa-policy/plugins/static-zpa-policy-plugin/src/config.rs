//! Configuration for the static ZPA policy plugin.

use serde::Deserialize;
use zpa_policy_sdk::{Condition, PolicyType};

/// Plugin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticPolicyPluginConfig {
    /// Rule lists to start with, one per policy type and micro-tenant.
    pub policies: Vec<SeedPolicySet>,
}

/// Rules of one policy set, listed in remote order.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedPolicySet {
    pub policy_type: PolicyType,
    #[serde(default)]
    pub microtenant_id: Option<String>,
    #[serde(default)]
    pub rules: Vec<SeedRule>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl SeedRule {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            conditions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.conditions = conditions;
        self
    }
}
