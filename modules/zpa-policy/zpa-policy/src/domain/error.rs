//! Domain errors for the ZPA policy module.

use zpa_policy_sdk::{ConditionErrors, PolicyBackendError, PolicyRulesError, PolicyType};

/// Internal domain errors.
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error("policy type '{0}' does not support rule reordering")]
    NotReorderable(PolicyType),

    #[error("rule ID must not be empty")]
    EmptyRuleId,

    #[error("rule '{0}' is declared more than once")]
    DuplicateRuleId(String),

    #[error("invalid order '{value}' for rule '{rule_id}': {reason}")]
    InvalidOrder {
        rule_id: String,
        value: String,
        reason: String,
    },

    #[error("order {order} for rule '{rule_id}' must be a positive integer")]
    NonPositiveOrder { rule_id: String, order: i64 },

    #[error("duplicate order '{order}' used by rules with IDs: {}", rule_ids.join(", "))]
    DuplicateOrder { order: u32, rule_ids: Vec<String> },

    #[error(
        "pinned rule '{rule_id}' must stay at position {pinned_position}, but is declared at {declared}"
    )]
    PinnedRuleMoved {
        rule_id: String,
        pinned_position: u32,
        declared: u32,
    },

    #[error("detach target must name an object type and an object ID")]
    EmptyDetachTarget,

    #[error(transparent)]
    Conditions(#[from] ConditionErrors),

    #[error(transparent)]
    Backend(#[from] PolicyBackendError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// `true` for caller-fixable declaration errors.
    #[must_use]
    pub fn is_declaration_error(&self) -> bool {
        !matches!(self, Self::Backend(_) | Self::Internal(_))
    }
}

impl From<DomainError> for PolicyRulesError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Backend(PolicyBackendError::NotFound { resource }) => {
                Self::NotFound(resource)
            }
            DomainError::Backend(inner) => Self::Remote(inner),
            DomainError::Internal(msg) => Self::Internal(msg),
            other => Self::InvalidDeclaration(other.to_string()),
        }
    }
}
