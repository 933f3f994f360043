//! Remote session service clients

pub mod factory;
pub mod live;
pub mod stub;

pub use factory::build_remote_client;
pub use live::LiveRemoteClient;
pub use stub::{StubConfig, StubRemoteClient};
