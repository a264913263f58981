//! Region Ping
//!
//! Measures HTTP round-trip latency to a directory of regional endpoints,
//! ranks the regions by median latency, and serves the endpoint directory
//! from a lightweight ping service with a fresh/stale cache.

pub mod cli;
pub mod client;
pub mod config;
pub mod directory;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod server;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Config, ServerConfig, EndpointDescriptor, EndpointDirectory, ProbeRequest, ProbeResult};
pub use client::{Prober, HttpProber};
pub use directory::{DirectoryCache, DirectorySource, RemoteDirectory, StaticDirectory, CacheStatus};
pub use executor::{ProbePlan, WorkerPool, PoolConfig};
pub use stats::{SampleAggregator, RegionAggregate};
pub use output::Reporter;
pub use types::OutputMode;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_REPETITIONS: u32 = 10;
    pub const DEFAULT_CONCURRENCY: usize = 10;
    /// Zero means the probe has no timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::ZERO;
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    /// Path appended to every endpoint URL when probing.
    pub const PING_PATH: &str = "/ping";
    /// Region id of the load-balanced anycast endpoint.
    pub const GLOBAL_REGION: &str = "global";

    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_SERVER_REGION: &str = "pong";
    pub const DEFAULT_STATIC_ROOT: &str = "/var/run/ko/";
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
    pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);
}
