//! CLI subcommands.

pub mod fixture;
pub mod inspect;
pub mod plans;
pub mod sweep;
