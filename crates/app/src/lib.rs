//! # scenehub-app
//!
//! Application layer — the scene automation engine and **port definitions**
//! (traits).
//!
//! ## Responsibilities
//! - Provide the engine components that need no IO of their own:
//!   - [`state_store::StateStore`] — in-memory cache of the latest known
//!     state per device
//!   - [`event_bus::EventBus`] — fire-and-forget publish/subscribe
//!     dispatcher
//!   - [`scheduler::SceneScheduler`] — cron-keyed callback dispatcher
//!   - [`executor::SceneExecutor`] — evaluate-and-act engine for one scene
//!     run
//! - Define **port traits** that adapters implement (driven/outbound):
//!   - `SceneRepository` / `DeviceRepository` — persistence
//!   - `HalClient` — the device-control backend across the network boundary
//!   - `EventPublisher` — event emission
//! - Provide use-case services ([`services::scene_service::SceneService`],
//!   [`services::device_service::DeviceService`]) orchestrating the above
//!
//! ## Dependency rule
//! Depends on `scenehub-domain` only (plus `tokio` for tasks/channels and
//! the cron/timezone crates). Never imports adapter crates; adapters depend
//! on *this* crate, not the reverse.

pub mod event_bus;
pub mod executor;
pub mod ports;
pub mod scheduler;
pub mod services;
pub mod state_store;
