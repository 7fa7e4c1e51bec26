//! Backend API trait for remote policy rule lists.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::conditions::RemoteCondition;
use crate::error::PolicyBackendError;
use crate::models::{PolicyScope, RemoteRule};

/// Remote rule-list operations used by the reconciler and the detach flow.
///
/// Implementations talk to the remote service (or, for tests, keep rules in
/// memory). They perform no validation beyond what the remote itself does.
#[async_trait]
pub trait PolicyRuleBackend: Send + Sync {
    /// List every rule of the scope in remote order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the policy set does not exist, or a transport error.
    async fn list_rules(&self, scope: &PolicyScope) -> Result<Vec<RemoteRule>, PolicyBackendError>;

    /// Submit a rule-ID to position map in one request.
    ///
    /// The remote renumbers rules outside the map itself. A failed call
    /// leaves the remote order unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote rejects the reorder.
    async fn bulk_reorder(
        &self,
        scope: &PolicyScope,
        orders: &BTreeMap<String, u32>,
    ) -> Result<(), PolicyBackendError>;

    /// Replace the conditions of one rule.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown rule, or a transport error.
    async fn update_rule_conditions(
        &self,
        scope: &PolicyScope,
        rule_id: &str,
        conditions: Vec<RemoteCondition>,
    ) -> Result<(), PolicyBackendError>;
}
