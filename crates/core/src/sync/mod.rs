//! Session persistence and remote sync

pub mod ports;
pub mod push_queue;
pub mod repository;

pub use push_queue::{PushOutcome, PushQueue};
pub use repository::SyncRepository;
