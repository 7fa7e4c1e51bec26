//! ZPA Policy Module
//!
//! Rule-order reconciler and policy cleanup on top of a
//! [`PolicyRuleBackend`](zpa_policy_sdk::PolicyRuleBackend).
//!
//! A reconcile resolves the declared orders, then under the policy list's
//! advisory lock fetches the current rules, keeps the pinned system rule in
//! place and applies everything in one bulk reorder. Consumers use the
//! [`ZpaPolicyLocalClient`](domain::ZpaPolicyLocalClient) through
//! [`PolicyRulesClient`](zpa_policy_sdk::PolicyRulesClient).
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::ZpaPolicyConfig;
pub use domain::{Service, ZpaPolicyLocalClient};
