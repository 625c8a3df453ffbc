//! CLI command implementations.

pub mod backups;
pub mod common;
pub mod install;
pub mod list;
pub mod profile;
pub mod validate;
