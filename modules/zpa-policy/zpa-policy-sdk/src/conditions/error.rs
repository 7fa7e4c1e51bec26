//! Condition validation violations.

use std::fmt;

use thiserror::Error;

/// Which half of an entry value a violation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandField {
    Value,
    Lhs,
    Rhs,
}

impl fmt::Display for OperandField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Value => "value",
            Self::Lhs => "lhs",
            Self::Rhs => "rhs",
        })
    }
}

/// What is wrong with one operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ViolationKind {
    #[error("must provide {expected}")]
    MissingValues { expected: String },

    #[error("must provide at least one entry value ({expected})")]
    MissingEntryValues { expected: String },

    #[error("invalid {field} '{value}': expected {expected}")]
    InvalidValue {
        field: OperandField,
        value: String,
        expected: String,
    },

    #[error("{} not a valid ISO-3166 Alpha-2 country code", format_codes(.codes))]
    InvalidCountryCodes { codes: Vec<String> },

    #[error("object type appears in more than one operand; merge the values into a single operand")]
    DuplicateObjectType,

    #[error("'{field}' is not used by this object type and must be empty")]
    WrongShape { field: &'static str },
}

fn format_codes(codes: &[String]) -> String {
    let quoted: Vec<String> = codes.iter().map(|c| format!("'{c}'")).collect();
    if quoted.len() == 1 {
        format!("{} is", quoted.join(", "))
    } else {
        format!("{} are", quoted.join(", "))
    }
}

impl ViolationKind {
    #[must_use]
    pub fn missing_values(expected: impl Into<String>) -> Self {
        Self::MissingValues {
            expected: expected.into(),
        }
    }

    #[must_use]
    pub fn missing_entry_values(expected: impl Into<String>) -> Self {
        Self::MissingEntryValues {
            expected: expected.into(),
        }
    }

    #[must_use]
    pub fn invalid(field: OperandField, value: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
            expected: expected.into(),
        }
    }
}

/// A single violation, located by condition index and object type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[error("condition {condition}, object_type {object_type}: {kind}")]
pub struct ConditionViolation {
    /// Zero-based index of the condition in the declared list.
    pub condition: usize,
    pub object_type: String,
    pub kind: ViolationKind,
}

/// Every violation found in one condition tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", format_violations(.0))]
pub struct ConditionErrors(pub Vec<ConditionViolation>);

fn format_violations(violations: &[ConditionViolation]) -> String {
    let mut out = format!("{} condition violation(s)", violations.len());
    for v in violations {
        out.push_str("; ");
        out.push_str(&v.to_string());
    }
    out
}

impl ConditionErrors {
    #[must_use]
    pub fn violations(&self) -> &[ConditionViolation] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
