#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! ZPA Policy SDK
//!
//! This crate provides the public API for the `zpa_policy` module:
//!
//! - [`PolicyRulesClient`] - Public API trait for consumers (rule ordering, detach)
//! - [`PolicyRuleBackend`] - Backend API trait for remote rule-list implementations
//! - [`RuleOrderRequest`], [`ObservedRuleOrder`] - Rule ordering models
//! - [`PolicyType`], [`PolicyScope`] - Policy categories and micro-tenant scoping
//! - [`conditions`] - Condition compiler ([`ConditionCompiler`], [`ObjectTypeRegistry`])
//! - [`PolicyRulesError`], [`PolicyBackendError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use zpa_policy_sdk::conditions::{
//!     compile_conditions, Condition, ConditionCompiler, Operand, object_types,
//! };
//!
//! let conditions = vec![Condition::and(vec![
//!     Operand::values(object_types::APP, ["216196257331291921"]),
//!     Operand::entries(object_types::COUNTRY_CODE, [("US", "true")]),
//! ])];
//!
//! // Reject declaration errors before any network call
//! ConditionCompiler::default().check(&conditions)?;
//!
//! let payload = compile_conditions(&conditions);
//! ```

pub mod api;
pub mod conditions;
pub mod error;
pub mod models;
pub mod plugin_api;

// Re-export main types at crate root
pub use api::PolicyRulesClient;
pub use conditions::{
    Condition, ConditionCompiler, ConditionErrors, ConditionOperator, ConditionViolation,
    EntryValue, ObjectTypeRegistry, Operand, RemoteCondition, ValueShape, ViolationKind,
};
pub use error::{PolicyBackendError, PolicyRulesError, UnknownPolicyType};
pub use models::{
    DeclaredRuleOrder, DetachOutcome, DetachRequest, DetachedRule, ObservedRuleOrder,
    PolicyScope, PolicyType, RemoteRule, RuleOrderRequest,
};
pub use plugin_api::PolicyRuleBackend;
