//! Package model types.
//!
//! This module provides the core data structures describing configuration
//! packages:
//!
//! - **Package**: immutable descriptor of a named, versioned bundle
//! - **PackageFile**: one declared file (source, target, kind, required)
//! - **PlayerKind / ProfileKind / FileKind**: closed enums shared across
//!   manifests, validation, and the persisted indexes
//!
//! A `Package` is constructed once (normally by [`crate::manifest`]) and
//! borrowed read-only by the validator and installer.

mod core;
mod file;
mod types;

pub use self::core::Package;
pub use file::{is_safe_relative, PackageFile};
pub use types::{FileKind, PlayerKind, ProfileKind, UnknownName};
