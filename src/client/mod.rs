//! High-level client API

mod config;
mod endpoint;
mod secure_client;

pub use config::{ClientConfig, ClientConfigBuilder};
pub use endpoint::Endpoint;
pub use secure_client::SecureStreamClient;
