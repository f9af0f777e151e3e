//! Use-case services orchestrating domain objects through the ports.

pub mod device_service;
pub mod scene_service;
