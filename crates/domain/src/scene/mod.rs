//! Scene — a named automation rule: triggers, conditions, and actions.
//!
//! A [`SceneDefinition`] is parsed from untrusted JSON into a validated,
//! immutable tree; updates replace the whole value. The [`Scene`] record
//! wraps a definition with identity and activation state.

mod action;
mod condition;
mod context;
mod trigger;

pub use action::Action;
pub use condition::{
    CompareOp, Condition, ConditionGroup, ConditionNode, GroupOperator, STATE_ATTRIBUTE,
    StateMatch, evaluate,
};
pub use context::EvaluationContext;
pub use trigger::Trigger;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{DefinitionError, NotFoundError};
use crate::id::{DeviceId, SceneId};
use crate::time::Timestamp;

/// Number of fields in a cron expression (`minute hour day month day_of_week`).
const CRON_FIELDS: usize = 5;

/// The validated trigger/condition/action tree of a scene.
///
/// Construct via [`SceneDefinition::parse`]; every other component treats
/// the value as immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDefinition {
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub conditions: Option<ConditionNode>,
    pub actions: Vec<Action>,
}

impl SceneDefinition {
    /// Validate an untrusted JSON value into a definition.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError`] on any structural or type violation:
    /// a missing `actions` list, an unknown `type` tag, a field of the
    /// wrong shape, a cron expression without exactly five fields, or a
    /// negative `seconds` value.
    pub fn parse(raw: serde_json::Value) -> Result<Self, DefinitionError> {
        let definition: Self =
            serde_json::from_value(raw).map_err(|err| DefinitionError::new(err.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    /// Check invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError`] when a `time` trigger does not carry a
    /// 5-field cron expression.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        for trigger in &self.triggers {
            if let Trigger::Time { cron } = trigger {
                let fields = cron.split_whitespace().count();
                if fields != CRON_FIELDS {
                    return Err(DefinitionError::new(format!(
                        "cron expression `{cron}` must have {CRON_FIELDS} fields, found {fields}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// The set of device ids referenced by triggers, conditions, and actions.
    ///
    /// Used to build the evaluation snapshot for one execution.
    #[must_use]
    pub fn referenced_device_ids(&self) -> BTreeSet<DeviceId> {
        let mut ids = BTreeSet::new();
        for trigger in &self.triggers {
            if let Trigger::DeviceState { device_id, .. } = trigger {
                ids.insert(device_id.clone());
            }
        }
        if let Some(conditions) = &self.conditions {
            conditions.collect_device_ids(&mut ids);
        }
        for action in &self.actions {
            if let Action::DeviceControl { device_id, .. } = action {
                ids.insert(device_id.clone());
            }
        }
        ids
    }
}

/// A stored automation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub definition: SceneDefinition,
    pub is_active: bool,
    pub created_at: Timestamp,
}

impl Scene {
    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError`] when `id` or `name` is empty.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.id.as_str().is_empty() {
            return Err(DefinitionError::new("scene id must not be empty"));
        }
        if self.name.is_empty() {
            return Err(DefinitionError::new("scene name must not be empty"));
        }
        Ok(())
    }

    /// Build a [`NotFoundError`] for this entity kind.
    #[must_use]
    pub fn not_found(id: &SceneId) -> NotFoundError {
        NotFoundError {
            entity: "Scene",
            id: id.to_string(),
        }
    }
}
