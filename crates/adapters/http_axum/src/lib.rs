//! # scenehub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the JSON REST API (`/api/devices`, `/api/scenes`,
//!   `/api/system/status`, …)
//! - Stream live bus events to clients over SSE (`/api/events/stream`)
//! - Map HTTP requests into application service calls (driving adapter)
//! - Map application errors into HTTP status codes
//!
//! ## Dependency rule
//! Depends on `scenehub-app` (for port traits and services) and
//! `scenehub-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
