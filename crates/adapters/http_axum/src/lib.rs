//! # synthetix-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** for device commands and state
//!   (`/api/devices/{id}/command`, `/api/devices/{id}/state`, …)
//! - Serve the **live observer feed** over WebSocket (`/api/ws/devices`):
//!   every connection is an observer of the notification hub
//! - Map HTTP requests into [`CommandService`](synthetix_app::services::command_service::CommandService)
//!   calls and device errors into status codes
//!
//! ## Dependency rule
//! Depends on `synthetix-app` (for port traits and services) and `synthetix-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
