//! Public API trait for the ZPA policy module.

use async_trait::async_trait;

use crate::error::PolicyRulesError;
use crate::models::{DetachOutcome, DetachRequest, ObservedRuleOrder, RuleOrderRequest};

/// Public API trait for policy rule ordering and cleanup.
///
/// Resource handlers owning "the order of rules within one policy type"
/// consume this trait:
///
/// ```ignore
/// let request = RuleOrderRequest::new(PolicyType::AccessPolicy)
///     .rule("216196257331291921", "1")
///     .rule("216196257331291922", "2");
///
/// let observed = client.reorder(request).await?;
/// ```
#[async_trait]
pub trait PolicyRulesClient: Send + Sync {
    /// Apply the declared order for one policy type and report the
    /// resulting remote positions of the managed rules.
    ///
    /// # Errors
    ///
    /// - `InvalidDeclaration` for bad, duplicate or non-positive orders (no remote call is made)
    /// - `Remote` when listing or reordering the remote rules fails
    async fn reorder(&self, request: RuleOrderRequest)
    -> Result<ObservedRuleOrder, PolicyRulesError>;

    /// Report the current remote positions of the managed rules without
    /// changing anything.
    ///
    /// # Errors
    ///
    /// - `Remote` when listing the remote rules fails
    async fn read_order(
        &self,
        request: RuleOrderRequest,
    ) -> Result<ObservedRuleOrder, PolicyRulesError>;

    /// Remove every reference to one object from the policy rules that
    /// mention it.
    ///
    /// # Errors
    ///
    /// - `InvalidDeclaration` if the object type or ID is empty
    async fn detach_object(&self, request: DetachRequest)
    -> Result<DetachOutcome, PolicyRulesError>;
}
