//! Policy rule condition compiler.
//!
//! Converts declared condition trees (conditions, operands, entry values) to
//! the remote payload shape and back, and validates them per object type
//! before any network call is made.
//!
//! Object type handling is table driven: [`ObjectTypeRegistry`] maps each
//! object type to its [`ValueShape`] and an optional validator. Object types
//! missing from the registry are accepted and passed through unchanged.

pub mod compiler;
pub mod country;
pub mod error;
pub mod model;
pub mod registry;
pub mod rules;

pub use compiler::{
    ConditionCompiler, check_object_type_uniqueness, compile_conditions, decompile_conditions,
    remove_value,
};
pub use error::{ConditionErrors, ConditionViolation, OperandField, ViolationKind};
pub use model::{
    Condition, ConditionOperator, EntryValue, LegacyCondition, LegacyOperand, Operand,
    RemoteCondition, RemoteEntryValue, RemoteOperand, object_types,
};
pub use registry::{ObjectTypeRegistry, ObjectTypeRule, OperandValidator, ValueShape};
