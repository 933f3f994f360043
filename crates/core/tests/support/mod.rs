//! Shared test helpers for `cadence-core` integration tests.
//!
//! In-memory fakes for the core ports so repository and timer tests can focus
//! on behaviour instead of storage or network plumbing.

#![allow(dead_code)]

pub mod remote;
pub mod repositories;
