//! HTTP transport shared by the live remote client

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
