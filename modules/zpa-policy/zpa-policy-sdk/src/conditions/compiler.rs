//! Condition compiler: declared shape to remote shape and back, plus validation.
//!
//! All functions here are pure. Validation never mutates its input and
//! collects every violation in the tree instead of stopping at the first.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use super::error::{ConditionErrors, ConditionViolation, ViolationKind};
use super::model::{
    Condition, EntryValue, LegacyCondition, Operand, RemoteCondition, RemoteEntryValue,
    RemoteOperand,
};
use super::registry::{ObjectTypeRegistry, ValueShape};

/// Translate declared conditions into the remote payload shape.
///
/// Empty value lists are omitted from the payload.
#[must_use]
pub fn compile_conditions(conditions: &[Condition]) -> Vec<RemoteCondition> {
    conditions
        .iter()
        .map(|c| RemoteCondition {
            id: c.id.clone(),
            operator: c.operator,
            operands: c.operands.iter().map(compile_operand).collect(),
        })
        .collect()
}

fn compile_operand(op: &Operand) -> RemoteOperand {
    RemoteOperand {
        object_type: op.object_type.clone(),
        values: (!op.values.is_empty()).then(|| op.values.iter().cloned().collect()),
        entry_values: (!op.entry_values.is_empty()).then(|| {
            op.entry_values
                .iter()
                .map(|ev| RemoteEntryValue {
                    lhs: ev.lhs.clone(),
                    rhs: ev.rhs.clone(),
                })
                .collect()
        }),
    }
}

/// Translate a remote payload back into the declared shape.
///
/// Absent lists become empty sets. Unknown object types are kept as-is.
#[must_use]
pub fn decompile_conditions(remote: &[RemoteCondition]) -> Vec<Condition> {
    remote
        .iter()
        .map(|c| Condition {
            id: c.id.clone(),
            operator: c.operator,
            operands: c.operands.iter().map(decompile_operand).collect(),
        })
        .collect()
}

fn decompile_operand(op: &RemoteOperand) -> Operand {
    Operand {
        object_type: op.object_type.clone(),
        values: op.values.iter().flatten().cloned().collect(),
        entry_values: op
            .entry_values
            .iter()
            .flatten()
            .map(|ev| EntryValue::new(ev.lhs.clone(), ev.rhs.clone()))
            .collect(),
    }
}

/// Report every condition in which an object type appears in more than one
/// operand. Each repeated object type is reported once per condition.
#[must_use]
pub fn check_object_type_uniqueness(conditions: &[Condition]) -> Vec<ConditionViolation> {
    let mut violations = Vec::new();
    for (idx, condition) in conditions.iter().enumerate() {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut repeated = Vec::new();
        for op in &condition.operands {
            let count = counts.entry(op.object_type.as_str()).or_default();
            *count += 1;
            if *count == 2 {
                repeated.push(op.object_type.clone());
            }
        }
        violations.extend(repeated.into_iter().map(|object_type| ConditionViolation {
            condition: idx,
            object_type,
            kind: ViolationKind::DuplicateObjectType,
        }));
    }
    violations
}

/// Drop `id` from the `values` of every operand of `object_type`.
///
/// Operands left empty are removed, then conditions left without operands.
/// Returns whether anything changed.
pub fn remove_value(conditions: &mut Vec<Condition>, object_type: &str, id: &str) -> bool {
    let mut changed = false;
    conditions.retain_mut(|condition| {
        let mut touched = false;
        condition.operands.retain_mut(|op| {
            if op.object_type != object_type || !op.values.remove(id) {
                return true;
            }
            touched = true;
            !op.is_empty()
        });
        changed |= touched;
        !(touched && condition.operands.is_empty())
    });
    changed
}

fn check_shape(shape: ValueShape, op: &Operand) -> Result<(), ViolationKind> {
    match shape {
        ValueShape::Values if !op.entry_values.is_empty() => {
            Err(ViolationKind::WrongShape { field: "entry_values" })
        }
        ValueShape::EntryValues if !op.values.is_empty() => {
            Err(ViolationKind::WrongShape { field: "values" })
        }
        _ => Ok(()),
    }
}

/// Validates declared conditions against an [`ObjectTypeRegistry`].
#[derive(Debug, Clone)]
pub struct ConditionCompiler {
    registry: Arc<ObjectTypeRegistry>,
}

impl Default for ConditionCompiler {
    fn default() -> Self {
        Self::new(Arc::new(ObjectTypeRegistry::builtin()))
    }
}

impl ConditionCompiler {
    #[must_use]
    pub fn new(registry: Arc<ObjectTypeRegistry>) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &ObjectTypeRegistry {
        &self.registry
    }

    /// Run every registered validator over the tree.
    ///
    /// Each operand contributes at most one violation. A registered object
    /// type must leave the half its shape does not use empty; operands of
    /// unregistered object types are accepted.
    #[must_use]
    pub fn validate(&self, conditions: &[Condition]) -> Vec<ConditionViolation> {
        let mut violations = Vec::new();
        for (idx, condition) in conditions.iter().enumerate() {
            for op in &condition.operands {
                let Some(rule) = self.registry.get(&op.object_type) else {
                    continue;
                };
                if let Err(kind) = check_shape(rule.shape(), op).and_then(|()| rule.validate(op)) {
                    violations.push(ConditionViolation {
                        condition: idx,
                        object_type: op.object_type.clone(),
                        kind,
                    });
                }
            }
        }
        violations
    }

    /// Uniqueness check and validation together.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionErrors`] with every violation found.
    pub fn check(&self, conditions: &[Condition]) -> Result<(), ConditionErrors> {
        let mut violations = check_object_type_uniqueness(conditions);
        violations.extend(self.validate(conditions));
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConditionErrors(violations))
        }
    }

    /// Fold legacy one-pair-per-operand conditions into the current shape.
    ///
    /// Set-valued object types collect `rhs` into `values`; everything else,
    /// including unregistered object types, collects `(lhs, rhs)` into
    /// `entry_values`. Output operands are ordered by object type.
    #[must_use]
    pub fn aggregate_legacy_conditions(&self, legacy: &[LegacyCondition]) -> Vec<Condition> {
        legacy
            .iter()
            .map(|lc| {
                let mut grouped: BTreeMap<&str, Operand> = BTreeMap::new();
                for lo in &lc.operands {
                    let operand = grouped
                        .entry(lo.object_type.as_str())
                        .or_insert_with(|| Operand {
                            object_type: lo.object_type.clone(),
                            ..Operand::default()
                        });
                    match self.registry.shape_of(&lo.object_type) {
                        Some(ValueShape::Values) => {
                            operand.values.insert(lo.rhs.clone());
                        }
                        Some(ValueShape::EntryValues) => {
                            operand
                                .entry_values
                                .insert(EntryValue::new(lo.lhs.clone(), lo.rhs.clone()));
                        }
                        None => {
                            debug!(
                                object_type = %lo.object_type,
                                "passing through unregistered legacy operand"
                            );
                            operand
                                .entry_values
                                .insert(EntryValue::new(lo.lhs.clone(), lo.rhs.clone()));
                        }
                    }
                }
                Condition {
                    id: lc.id.clone(),
                    operator: lc.operator,
                    operands: grouped.into_values().collect(),
                }
            })
            .collect()
    }
}
