//! # Cadence App
//!
//! Application layer - wiring and command-line entry point.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - Command handlers shared by the `cadence` binary
//! - Logging setup
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod utils;

pub use context::AppContext;
