//! Domain model module declarations.

pub mod command;
pub mod log;
pub mod snapshot;
