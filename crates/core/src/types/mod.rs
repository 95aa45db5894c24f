//! Core types for Storekeeper.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod locale;
pub mod price;
pub mod status;

pub use id::*;
pub use locale::{Locale, LocaleError};
pub use price::{CurrencyCode, Price};
pub use status::*;
