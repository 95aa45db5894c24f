//! Storekeeper Core - Shared types library.
//!
//! This crate provides common types used across all Storekeeper components:
//! - `engine` - Store lifecycle, quota and notification engine
//! - `cli` - Command-line tools for inspecting fixtures and running sweeps
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no clocks. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, locales, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
