//! Rule order resolution and adjustment.
//!
//! `resolve` turns declared `(rule ID, order string)` pairs into positions
//! without touching the network. `adjust` folds in the pinned system rule
//! found in a fresh snapshot of the remote list.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};
use zpa_policy_sdk::{PolicyType, RemoteRule, RuleOrderRequest};

use super::error::DomainError;
use crate::config::{PinnedRuleConfig, PinnedRuleMoves};

/// Validated caller-declared positions for one policy type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredOrder {
    policy_type: PolicyType,
    positions: BTreeMap<String, u32>,
}

impl DesiredOrder {
    /// Parse and validate the declared orders of a request.
    ///
    /// # Errors
    ///
    /// - `NotReorderable` for policy types without bulk reorder
    /// - `EmptyRuleId` / `DuplicateRuleId` for bad rule IDs
    /// - `InvalidOrder` / `NonPositiveOrder` for bad order strings
    /// - `DuplicateOrder` when two rules share a position (smallest order reported)
    pub fn resolve(request: &RuleOrderRequest) -> Result<Self, DomainError> {
        if !request.policy_type.is_reorderable() {
            return Err(DomainError::NotReorderable(request.policy_type));
        }

        let mut positions = BTreeMap::new();
        for declared in &request.rules {
            if declared.id.trim().is_empty() {
                return Err(DomainError::EmptyRuleId);
            }
            let position = parse_order(&declared.id, &declared.order)?;
            if positions.insert(declared.id.clone(), position).is_some() {
                return Err(DomainError::DuplicateRuleId(declared.id.clone()));
            }
        }

        let mut by_position: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for (id, position) in &positions {
            by_position.entry(*position).or_default().push(id.clone());
        }
        if let Some((order, rule_ids)) = by_position.into_iter().find(|(_, ids)| ids.len() > 1) {
            return Err(DomainError::DuplicateOrder { order, rule_ids });
        }

        Ok(Self {
            policy_type: request.policy_type,
            positions,
        })
    }

    #[must_use]
    pub fn policy_type(&self) -> PolicyType {
        self.policy_type
    }

    #[must_use]
    pub fn positions(&self) -> &BTreeMap<String, u32> {
        &self.positions
    }

    #[must_use]
    pub fn get(&self, rule_id: &str) -> Option<u32> {
        self.positions.get(rule_id).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn rule_ids(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }
}

fn parse_order(rule_id: &str, raw: &str) -> Result<u32, DomainError> {
    let invalid = |reason: String| DomainError::InvalidOrder {
        rule_id: rule_id.to_owned(),
        value: raw.to_owned(),
        reason,
    };
    let order: i64 = raw
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
    if order <= 0 {
        return Err(DomainError::NonPositiveOrder {
            rule_id: rule_id.to_owned(),
            order,
        });
    }
    u32::try_from(order).map_err(|_| invalid(format!("must not exceed {}", u32::MAX)))
}

/// How the pinned rule was accounted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinnedRuleState {
    /// Unmanaged pinned rule, injected at the pinned position.
    Injected { rule_id: String },
    /// The caller manages the pinned rule; its declared position is used.
    Managed { rule_id: String, declared: u32 },
}

/// Final rule-ID to position map handed to the bulk reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustedOrder {
    pub orders: BTreeMap<String, u32>,
    pub pinned: Option<PinnedRuleState>,
}

/// Fold the pinned rule into the desired positions.
///
/// Only a matching rule currently at the pinned position counts.
///
/// - Not managed by the caller: it is added at that position and every
///   desired position at or after it moves down by one.
/// - Managed by the caller: desired positions are kept verbatim.
///   A declared position other than the pinned one is logged, or rejected
///   under [`PinnedRuleMoves::Reject`].
/// - Otherwise desired positions are kept verbatim.
///
/// # Errors
///
/// Returns `PinnedRuleMoved` when the caller moves the pinned rule and
/// `moves` is `Reject`.
pub fn adjust(
    desired: &DesiredOrder,
    snapshot: &[RemoteRule],
    pinned: Option<&PinnedRuleConfig>,
    moves: PinnedRuleMoves,
) -> Result<AdjustedOrder, DomainError> {
    let mut orders = desired.positions().clone();

    for rule in snapshot.iter().filter(|r| r.position().is_none()) {
        warn!(
            policy_type = %desired.policy_type(),
            rule_id = %rule.id,
            rule_order = %rule.rule_order,
            "remote rule has an unparseable position"
        );
    }

    let state = match pinned {
        None => None,
        Some(pin) => pin_rule(desired, snapshot, pin, moves, &mut orders)?,
    };

    debug!(
        policy_type = %desired.policy_type(),
        orders = ?orders,
        "computed final rule order"
    );

    Ok(AdjustedOrder {
        orders,
        pinned: state,
    })
}

fn pin_rule(
    desired: &DesiredOrder,
    snapshot: &[RemoteRule],
    pin: &PinnedRuleConfig,
    moves: PinnedRuleMoves,
    orders: &mut BTreeMap<String, u32>,
) -> Result<Option<PinnedRuleState>, DomainError> {
    let Some(rule) = snapshot
        .iter()
        .find(|r| r.position() == Some(pin.position) && pin.matcher.matches(r))
    else {
        return Ok(None);
    };

    if let Some(declared) = desired.get(&rule.id) {
        if declared != pin.position {
            if moves == PinnedRuleMoves::Reject {
                return Err(DomainError::PinnedRuleMoved {
                    rule_id: rule.id.clone(),
                    pinned_position: pin.position,
                    declared,
                });
            }
            warn!(
                policy_type = %desired.policy_type(),
                rule_id = %rule.id,
                position = declared,
                pinned_position = pin.position,
                "pinned rule declared away from its pinned position"
            );
        }
        return Ok(Some(PinnedRuleState::Managed {
            rule_id: rule.id.clone(),
            declared,
        }));
    }

    for position in orders.values_mut() {
        if *position >= pin.position {
            *position = position.saturating_add(1);
        }
    }
    orders.insert(rule.id.clone(), pin.position);

    Ok(Some(PinnedRuleState::Injected {
        rule_id: rule.id.clone(),
    }))
}

/// Managed rule IDs with no counterpart in the snapshot.
#[must_use]
pub fn missing_rules<'a>(
    managed: impl IntoIterator<Item = &'a str>,
    snapshot: &[RemoteRule],
) -> Vec<String> {
    let present: HashSet<&str> = snapshot.iter().map(|r| r.id.as_str()).collect();
    managed
        .into_iter()
        .filter(|id| !present.contains(id))
        .map(str::to_owned)
        .collect()
}
