//! Core shared library for the Tagline platform.
//!
//! This crate exposes the reusable primitives the tagging services depend
//! on: common errors, configuration loading, serde helpers and logging
//! setup.

pub mod config;
pub mod errors;
pub mod logging;
pub mod serde_utils;

pub use config::{CoreConfig, Environment};
pub use errors::{Result as CoreResult, TaglineError};
