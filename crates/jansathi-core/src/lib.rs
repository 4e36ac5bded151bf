//! Core types, configuration, and errors shared across the JanSathi crates.
//!
//! This crate is dependency-light on purpose: it defines the domain
//! vocabulary (roles, sources, display messages), the TOML configuration
//! schema, and the top-level error type that subsystem crates convert into.

pub mod config;
pub mod error;
pub mod types;

pub use config::JanSathiConfig;
pub use error::{JanSathiError, Result};
pub use types::{DisplayMessage, Role, Source};
