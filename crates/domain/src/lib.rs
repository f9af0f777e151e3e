//! # scenehub-domain
//!
//! Pure domain model for the scenehub automation controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** (physical things reachable through the HAL) and
//!   their cached **DeviceState**
//! - Define **Scenes** (trigger / condition / action rules) and the
//!   validated [`scene::SceneDefinition`] tree parsed from untrusted JSON
//! - Evaluate condition trees against an immutable state snapshot
//! - Define **Events** (bus notifications) and their topic set
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod event;
pub mod scene;
