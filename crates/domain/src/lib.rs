//! # synthetix-domain
//!
//! Pure domain model for the synthetix device broker.
//!
//! ## Responsibilities
//! - Foundational types: device and observer identifiers, timestamps
//! - Opaque key-value maps for driver configuration, device state and commands
//! - **Device records** as the external record store sees them
//! - **State-change events** pushed to observers
//! - The error taxonomy shared by every layer
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
