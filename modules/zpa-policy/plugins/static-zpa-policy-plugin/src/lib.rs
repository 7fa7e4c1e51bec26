//! Static ZPA Policy Plugin
//!
//! In-memory [`PolicyRuleBackend`](zpa_policy_sdk::PolicyRuleBackend) for
//! development and tests. Bulk reorders are validated as a whole before any
//! rule moves, and untouched rules keep their relative order, the way the
//! remote service renumbers a policy set.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::{SeedPolicySet, SeedRule, StaticPolicyPluginConfig};
pub use domain::Service;
