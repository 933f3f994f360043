//! # Cadence Domain
//!
//! Business domain types and models for Cadence.
//!
//! This crate contains:
//! - Timer configuration and phases
//! - Session records and their wire projection
//! - Remote payloads and combined statistics
//! - Domain error types and Result definitions
//! - Configuration structures and constants
//!
//! ## Architecture
//! - No dependencies on other Cadence crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
