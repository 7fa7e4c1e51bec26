//! Backend implementation for the static ZPA policy plugin.

use std::collections::BTreeMap;

use async_trait::async_trait;
use zpa_policy_sdk::{
    PolicyBackendError, PolicyRuleBackend, PolicyScope, RemoteCondition, RemoteRule,
};

use super::service::Service;

#[async_trait]
impl PolicyRuleBackend for Service {
    async fn list_rules(&self, scope: &PolicyScope) -> Result<Vec<RemoteRule>, PolicyBackendError> {
        Ok(self.rules(scope))
    }

    async fn bulk_reorder(
        &self,
        scope: &PolicyScope,
        orders: &BTreeMap<String, u32>,
    ) -> Result<(), PolicyBackendError> {
        self.reorder(scope, orders)
    }

    async fn update_rule_conditions(
        &self,
        scope: &PolicyScope,
        rule_id: &str,
        conditions: Vec<RemoteCondition>,
    ) -> Result<(), PolicyBackendError> {
        self.replace_conditions(scope, rule_id, conditions)
    }
}
