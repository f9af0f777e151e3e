//! Evaluation context — the immutable snapshot one execution evaluates
//! against.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::device::DeviceState;
use crate::id::{DeviceId, SceneId};

/// Snapshot of the device states a scene references, plus the wall-clock
/// instant of the evaluation.
///
/// Built once per execution and never mutated; devices with no cached state
/// are simply absent, which condition evaluation treats as "false" for any
/// leaf referencing them. `current_time` is already resolved to the
/// controller's local timezone.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub device_states: HashMap<DeviceId, DeviceState>,
    pub scene_id: SceneId,
    pub current_time: NaiveDateTime,
}
