//! Data models and structures for region ping

pub mod config;
pub mod endpoint;
pub mod metrics;

// Re-export main model types
pub use config::{Config, ServerConfig};
pub use endpoint::{EndpointDescriptor, EndpointDirectory};
pub use metrics::{ProbeRequest, ProbeResult};
