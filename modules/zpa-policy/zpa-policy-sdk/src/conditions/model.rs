//! Declared and remote condition shapes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Well-known operand object types.
pub mod object_types {
    pub const APP: &str = "APP";
    pub const APP_GROUP: &str = "APP_GROUP";
    pub const MACHINE_GRP: &str = "MACHINE_GRP";
    pub const LOCATION: &str = "LOCATION";
    pub const EDGE_CONNECTOR_GROUP: &str = "EDGE_CONNECTOR_GROUP";
    pub const BRANCH_CONNECTOR_GROUP: &str = "BRANCH_CONNECTOR_GROUP";
    pub const USER_PORTAL: &str = "USER_PORTAL";
    pub const CHROME_POSTURE_PROFILE: &str = "CHROME_POSTURE_PROFILE";
    pub const CONSOLE: &str = "CONSOLE";
    pub const PRIVILEGE_PORTAL: &str = "PRIVILEGE_PORTAL";
    pub const CLIENT_TYPE: &str = "CLIENT_TYPE";
    pub const PLATFORM: &str = "PLATFORM";
    pub const RISK_FACTOR_TYPE: &str = "RISK_FACTOR_TYPE";
    pub const POSTURE: &str = "POSTURE";
    pub const TRUSTED_NETWORK: &str = "TRUSTED_NETWORK";
    pub const COUNTRY_CODE: &str = "COUNTRY_CODE";
    pub const SAML: &str = "SAML";
    pub const SCIM: &str = "SCIM";
    pub const SCIM_GROUP: &str = "SCIM_GROUP";
    pub const CHROME_ENTERPRISE: &str = "CHROME_ENTERPRISE";
}

/// Combinator applied across a condition's operands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConditionOperator {
    #[default]
    And,
    Or,
}

/// A keyed comparison clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryValue {
    pub lhs: String,
    pub rhs: String,
}

impl EntryValue {
    #[must_use]
    pub fn new(lhs: impl Into<String>, rhs: impl Into<String>) -> Self {
        Self {
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }
}

/// One clause of a declared condition.
///
/// Only one of `values` / `entry_values` is meaningful for a given object
/// type; the registry decides which.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operand {
    pub object_type: String,
    #[serde(default)]
    pub values: BTreeSet<String>,
    #[serde(default)]
    pub entry_values: BTreeSet<EntryValue>,
}

impl Operand {
    /// A set-membership operand.
    #[must_use]
    pub fn values<I, S>(object_type: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            object_type: object_type.into(),
            values: values.into_iter().map(Into::into).collect(),
            entry_values: BTreeSet::new(),
        }
    }

    /// A keyed-comparison operand.
    #[must_use]
    pub fn entries<I, L, R>(object_type: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        Self {
            object_type: object_type.into(),
            values: BTreeSet::new(),
            entry_values: entries
                .into_iter()
                .map(|(lhs, rhs)| EntryValue::new(lhs, rhs))
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.entry_values.is_empty()
    }
}

/// A declared condition: an operator applied across operands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Remote-assigned ID, if the condition has been created already.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub operator: ConditionOperator,
    #[serde(default)]
    pub operands: Vec<Operand>,
}

impl Condition {
    #[must_use]
    pub fn and(operands: Vec<Operand>) -> Self {
        Self {
            id: None,
            operator: ConditionOperator::And,
            operands,
        }
    }

    #[must_use]
    pub fn or(operands: Vec<Operand>) -> Self {
        Self {
            id: None,
            operator: ConditionOperator::Or,
            operands,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Remote `(lhs, rhs)` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntryValue {
    pub lhs: String,
    pub rhs: String,
}

/// Remote operand payload.
///
/// Absent lists are omitted on the wire rather than sent as empty arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOperand {
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_values: Option<Vec<RemoteEntryValue>>,
}

/// Remote condition payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub operator: ConditionOperator,
    #[serde(default)]
    pub operands: Vec<RemoteOperand>,
}

/// One flat operand of the legacy read path: a single `(lhs, rhs)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyOperand {
    pub object_type: String,
    #[serde(default)]
    pub lhs: String,
    #[serde(default)]
    pub rhs: String,
}

impl LegacyOperand {
    #[must_use]
    pub fn new(
        object_type: impl Into<String>,
        lhs: impl Into<String>,
        rhs: impl Into<String>,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }
}

/// A legacy remote condition, one operand per value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub operator: ConditionOperator,
    #[serde(default)]
    pub operands: Vec<LegacyOperand>,
}
