//! Probe work items and outcomes

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One unit of work for the worker pool
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeRequest {
    pub region: String,
    /// Endpoint base URL, without the ping path
    pub url: String,
}

impl ProbeRequest {
    pub fn new<S: Into<String>>(region: S, url: S) -> Self {
        Self {
            region: region.into(),
            url: url.into(),
        }
    }
}

/// Outcome of one probe.
///
/// `latency` is the elapsed wall time even when `failed` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub region: String,
    pub url: String,
    pub latency: Duration,
    pub failed: bool,
    /// Why the probe failed, unset on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn success(request: &ProbeRequest, latency: Duration) -> Self {
        Self {
            region: request.region.clone(),
            url: request.url.clone(),
            latency,
            failed: false,
            error: None,
        }
    }

    pub fn failure<S: Into<String>>(request: &ProbeRequest, latency: Duration, reason: S) -> Self {
        Self {
            failed: true,
            error: Some(reason.into()),
            ..Self::success(request, latency)
        }
    }

    pub fn latency_ns(&self) -> u128 {
        self.latency.as_nanos()
    }
}
