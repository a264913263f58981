//! HTTP probe implementation and timing measurements


use crate::{
    error::{AppError, Result},
    models::{ProbeRequest, ProbeResult},
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tokio::time::timeout;

/// One latency measurement against one endpoint.
///
/// Implementations never fail: problems are folded into
/// [`ProbeResult::failed`] and the elapsed time is still reported.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, request: &ProbeRequest) -> ProbeResult;
}

/// Probes `GET <url>/ping` over reqwest
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    timeout: Duration,
}

impl HttpProber {
    /// Create a prober; a zero `timeout` means requests may wait forever
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Single round trip, body included; anything but 200 is an error
    pub async fn ping(&self, url: &str) -> Result<()> {
        let round_trip = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            response.bytes().await
                .map_err(|e| AppError::http_request(format!("Failed to read response body: {}", e)))?;

            if status != StatusCode::OK {
                return Err(AppError::http_request(format!("{} returned {}", url, status)));
            }
            Ok::<(), AppError>(())
        };

        if self.timeout > Duration::ZERO {
            timeout(self.timeout, round_trip).await
                .map_err(|_| AppError::timeout(format!("{} did not answer within {:?}", url, self.timeout)))?
        } else {
            round_trip.await
        }
    }
}

/// `<base>/ping`, tolerating a trailing slash on the base
pub fn ping_url(base: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), crate::defaults::PING_PATH)
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, request: &ProbeRequest) -> ProbeResult {
        let url = ping_url(&request.url);
        let start = Instant::now();
        let outcome = self.ping(&url).await;
        let elapsed = start.elapsed();

        match outcome {
            Ok(()) => ProbeResult::success(request, elapsed),
            Err(error) => ProbeResult::failure(request, elapsed, error.to_string()),
        }
    }
}
