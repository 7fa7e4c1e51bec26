//! Object type registry: value shape and validator per operand object type.

use std::collections::HashMap;
use std::fmt;

use super::error::ViolationKind;
use super::model::Operand;
use super::rules;

/// Which half of an operand carries the clause for an object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueShape {
    /// "Member of this set of IDs" (`values`).
    Values,
    /// Keyed comparisons (`entry_values`).
    EntryValues,
}

/// Validates a single operand, stopping at its first violation.
pub type OperandValidator = Box<dyn Fn(&Operand) -> Result<(), ViolationKind> + Send + Sync>;

/// Shape descriptor plus optional validator for one object type.
pub struct ObjectTypeRule {
    shape: ValueShape,
    validator: Option<OperandValidator>,
}

impl ObjectTypeRule {
    /// A shape-only rule: any contents are accepted.
    #[must_use]
    pub fn new(shape: ValueShape) -> Self {
        Self {
            shape,
            validator: None,
        }
    }

    #[must_use]
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Operand) -> Result<(), ViolationKind> + Send + Sync + 'static,
    {
        self.validator = Some(Box::new(validator));
        self
    }

    #[must_use]
    pub fn shape(&self) -> ValueShape {
        self.shape
    }

    /// Run the validator, if any.
    ///
    /// # Errors
    ///
    /// Returns the first violation of the operand.
    pub fn validate(&self, operand: &Operand) -> Result<(), ViolationKind> {
        match &self.validator {
            Some(validate) => validate(operand),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ObjectTypeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectTypeRule")
            .field("shape", &self.shape)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

/// Maps object types to their [`ObjectTypeRule`].
///
/// Object types without an entry are accepted unvalidated and passed through
/// unchanged on read.
#[derive(Debug)]
pub struct ObjectTypeRegistry {
    rules: HashMap<String, ObjectTypeRule>,
}

impl ObjectTypeRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Registry with every built-in object type.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        rules::register_builtin(&mut registry);
        registry
    }

    /// Add or replace the rule for `object_type`.
    pub fn register(&mut self, object_type: impl Into<String>, rule: ObjectTypeRule) -> &mut Self {
        self.rules.insert(object_type.into(), rule);
        self
    }

    #[must_use]
    pub fn get(&self, object_type: &str) -> Option<&ObjectTypeRule> {
        self.rules.get(object_type)
    }

    #[must_use]
    pub fn shape_of(&self, object_type: &str) -> Option<ValueShape> {
        self.get(object_type).map(ObjectTypeRule::shape)
    }

    #[must_use]
    pub fn is_registered(&self, object_type: &str) -> bool {
        self.rules.contains_key(object_type)
    }
}

impl Default for ObjectTypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
