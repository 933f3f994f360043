//! Configuration loading.
//!
//! Environment variables win over config files; without either the built-in
//! defaults apply.

pub mod loader;

pub use loader::{load, load_from_env, load_from_file, find_config_file};
