//! Condition — a predicate over cached device state and/or time of day.

use std::cmp::Ordering;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::device::DeviceState;
use crate::id::DeviceId;

use super::context::EvaluationContext;

/// Attribute name that resolves to the primary state field instead of the
/// attribute map.
pub const STATE_ATTRIBUTE: &str = "state";

/// Comparison operator applied between a resolved device value and a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    #[default]
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

/// The `{operator, attribute, value}` triple carried by `device_state`
/// triggers and conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMatch {
    #[serde(default)]
    pub operator: CompareOp,
    #[serde(default = "default_attribute")]
    pub attribute: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

fn default_attribute() -> String {
    STATE_ATTRIBUTE.to_string()
}

impl StateMatch {
    /// Whether a device state satisfies this match.
    ///
    /// Fails closed: a missing or null attribute never matches, and ordered
    /// operators on non-comparable operands evaluate to `false`.
    #[must_use]
    pub fn matches(&self, state: &DeviceState) -> bool {
        let actual = if self.attribute == STATE_ATTRIBUTE {
            Some(serde_json::Value::String(state.state.clone()))
        } else {
            state.attributes.get(&self.attribute).cloned()
        };
        match actual {
            None | Some(serde_json::Value::Null) => false,
            Some(actual) => compare(&actual, &self.value, self.operator),
        }
    }
}

/// A single (leaf) condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Requires a device's current state to satisfy a [`StateMatch`].
    DeviceState {
        device_id: DeviceId,
        condition: StateMatch,
    },
    /// Requires the current clock-of-day to fall inside a window.
    ///
    /// Both bounds are inclusive. When `end` is earlier than `start` the
    /// window wraps past midnight (e.g. `22:00`–`06:00`).
    TimeRange {
        #[serde(with = "clock_time")]
        start: NaiveTime,
        #[serde(with = "clock_time")]
        end: NaiveTime,
    },
}

impl Condition {
    /// Evaluate this condition against an immutable snapshot.
    ///
    /// A `device_state` leaf referencing a device absent from the context
    /// evaluates to `false`; missing data never silently passes.
    #[must_use]
    pub fn evaluate(&self, context: &EvaluationContext) -> bool {
        match self {
            Self::DeviceState {
                device_id,
                condition,
            } => context
                .device_states
                .get(device_id)
                .is_some_and(|state| condition.matches(state)),
            Self::TimeRange { start, end } => {
                let now = context.current_time.time();
                if start <= end {
                    *start <= now && now <= *end
                } else {
                    now >= *start || now <= *end
                }
            }
        }
    }
}

/// Boolean combinator for a [`ConditionGroup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupOperator {
    And,
    Or,
}

/// A group of conditions combined with `and`/`or`.
///
/// Stored definitions write groups as `{operator, items}` with no type tag,
/// so the group form is recognised structurally rather than by tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    pub operator: GroupOperator,
    pub items: Vec<ConditionNode>,
}

impl ConditionGroup {
    /// Evaluate all children against the same context.
    ///
    /// Follows the all/any identities: `and` over an empty list is `true`,
    /// `or` over an empty list is `false`.
    #[must_use]
    pub fn evaluate(&self, context: &EvaluationContext) -> bool {
        match self.operator {
            GroupOperator::And => self.items.iter().all(|item| item.evaluate(context)),
            GroupOperator::Or => self.items.iter().any(|item| item.evaluate(context)),
        }
    }
}

/// A node in a condition tree: either a single condition or a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    Single(Condition),
    Group(ConditionGroup),
}

impl ConditionNode {
    /// Evaluate this node against an immutable snapshot.
    ///
    /// Children have no side effects, so group evaluation may short-circuit
    /// without changing the outcome.
    #[must_use]
    pub fn evaluate(&self, context: &EvaluationContext) -> bool {
        match self {
            Self::Single(condition) => condition.evaluate(context),
            Self::Group(group) => group.evaluate(context),
        }
    }

    /// Collect device ids referenced anywhere in this tree into `out`.
    pub fn collect_device_ids(&self, out: &mut std::collections::BTreeSet<DeviceId>) {
        match self {
            Self::Single(Condition::DeviceState { device_id, .. }) => {
                out.insert(device_id.clone());
            }
            Self::Single(Condition::TimeRange { .. }) => {}
            Self::Group(group) => {
                for item in &group.items {
                    item.collect_device_ids(out);
                }
            }
        }
    }
}

/// Evaluate an optional condition tree; an absent tree always holds.
#[must_use]
pub fn evaluate(node: Option<&ConditionNode>, context: &EvaluationContext) -> bool {
    node.is_none_or(|node| node.evaluate(context))
}

fn compare(actual: &serde_json::Value, expected: &serde_json::Value, operator: CompareOp) -> bool {
    match operator {
        CompareOp::Eq => values_equal(actual, expected),
        CompareOp::Ne => !values_equal(actual, expected),
        CompareOp::Gt => matches!(ordering(actual, expected), Some(Ordering::Greater)),
        CompareOp::Ge => matches!(
            ordering(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CompareOp::Lt => matches!(ordering(actual, expected), Some(Ordering::Less)),
        CompareOp::Le => matches!(
            ordering(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

/// Equality with numeric coercion, so `80` and `80.0` compare equal.
fn values_equal(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering for numbers (numeric) and strings (lexicographic); anything
/// else is unordered.
fn ordering(a: &serde_json::Value, b: &serde_json::Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        x.partial_cmp(&y)
    } else if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        Some(x.cmp(y))
    } else {
        None
    }
}

/// Serde helper for `HH:MM` clock-of-day strings.
mod clock_time {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(|err| {
            serde::de::Error::custom(format!("invalid clock time `{raw}`: {err}"))
        })
    }
}
