//! Centralized constants for the vault-crd project.
//!
//! All project-wide constant values live here.
//! Change a value in one place and it applies everywhere.

pub mod annotations;
pub mod network;
pub mod paths;
pub mod refresh;
pub mod state;
