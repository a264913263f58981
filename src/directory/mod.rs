//! Endpoint directory sources
//!
//! A [`DirectorySource`] produces the region table: either the builtin
//! table compiled into the binary or a JSON document fetched from a
//! remote server. The serving side wraps a source in a [`DirectoryCache`].

pub mod cache;

pub use cache::{CacheStatus, DirectoryCache};

use crate::models::{EndpointDescriptor, EndpointDirectory};
use crate::{AppError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Region id, URL, display name, optional (lat, lng)
type BuiltinRow = (&'static str, &'static str, &'static str, Option<(f64, f64)>);

const BUILTIN_ENDPOINTS: &[BuiltinRow] = &[
    ("global", "https://global.gcping.com", "Global HTTP Load Balancer", None),
    ("asia-east1", "https://asia-east1-5tkroniexa-de.a.run.app", "Taiwan", Some((23.69781, 120.960515))),
    ("asia-east2", "https://asia-east2-5tkroniexa-df.a.run.app", "Hong Kong", Some((22.3193039, 114.1693611))),
    ("asia-northeast1", "https://asia-northeast1-5tkroniexa-an.a.run.app", "Tokyo", Some((35.6761919, 139.6503106))),
    ("asia-northeast2", "https://asia-northeast2-5tkroniexa-dt.a.run.app", "Osaka", Some((34.6937249, 135.5022535))),
    ("asia-northeast3", "https://asia-northeast3-5tkroniexa-du.a.run.app", "Seoul", Some((37.566535, 126.9779692))),
    ("asia-south1", "https://asia-south1-5tkroniexa-el.a.run.app", "Mumbai", Some((19.0759837, 72.8776559))),
    ("asia-south2", "https://asia-south2-5tkroniexa-em.a.run.app", "Delhi", Some((28.7040592, 77.1024902))),
    ("asia-southeast1", "https://asia-southeast1-5tkroniexa-as.a.run.app", "Singapore", Some((1.352083, 103.819836))),
    ("asia-southeast2", "https://asia-southeast2-5tkroniexa-et.a.run.app", "Jakarta", Some((-6.2087634, 106.845599))),
    ("australia-southeast1", "https://australia-southeast1-5tkroniexa-ts.a.run.app", "Sydney", Some((-33.8688197, 151.2092955))),
    ("australia-southeast2", "https://australia-southeast2-5tkroniexa-km.a.run.app", "Melbourne", Some((-37.8136276, 144.9630576))),
    ("europe-central2", "https://europe-central2-5tkroniexa-lm.a.run.app", "Warsaw", Some((52.2329172, 20.9911553))),
    ("europe-north1", "https://europe-north1-5tkroniexa-lz.a.run.app", "Finland", Some((61.92411, 25.7481511))),
    ("europe-west1", "https://europe-west1-5tkroniexa-ew.a.run.app", "Belgium", Some((50.503887, 4.469936))),
    ("europe-west2", "https://europe-west2-5tkroniexa-nw.a.run.app", "London", Some((51.5073509, -0.1277583))),
    ("europe-west3", "https://europe-west3-5tkroniexa-ey.a.run.app", "Frankfurt", Some((50.1109221, 8.6821267))),
    ("europe-west4", "https://europe-west4-5tkroniexa-ez.a.run.app", "Netherlands", Some((52.132633, 5.291266))),
    ("europe-west6", "https://europe-west6-5tkroniexa-oa.a.run.app", "Zurich", Some((47.3768866, 8.541694))),
    ("northamerica-northeast1", "https://northamerica-northeast1-5tkroniexa-nn.a.run.app", "Montréal", Some((45.5016889, -73.567256))),
    ("northamerica-northeast2", "https://northamerica-northeast2-5tkroniexa-pd.a.run.app", "Toronto", None),
    ("southamerica-east1", "https://southamerica-east1-5tkroniexa-rj.a.run.app", "São Paulo", Some((-21.2922457, -50.3428431))),
    ("us-central1", "https://us-central1-5tkroniexa-uc.a.run.app", "Iowa", Some((41.8780025, -93.097702))),
    ("us-east1", "https://us-east1-5tkroniexa-ue.a.run.app", "South Carolina", Some((33.836081, -81.1637245))),
    ("us-east4", "https://us-east4-5tkroniexa-uk.a.run.app", "North Virginia", Some((32.817108, -96.949448))),
    ("us-west1", "https://us-west1-5tkroniexa-uw.a.run.app", "Oregon", Some((34.0522342, -118.2436849))),
    ("us-west2", "https://us-west2-5tkroniexa-wl.a.run.app", "Los Angeles", Some((34.0522342, -118.2436849))),
    ("us-west3", "https://us-west3-5tkroniexa-wm.a.run.app", "Salt Lake City", Some((40.7607793, -111.8910474))),
    ("us-west4", "https://us-west4-5tkroniexa-wn.a.run.app", "Las Vegas", Some((36.1699412, -115.1398296))),
];

/// The region table compiled into the binary
pub fn builtin() -> EndpointDirectory {
    BUILTIN_ENDPOINTS
        .iter()
        .map(|&(region, url, name, location)| {
            let endpoint = EndpointDescriptor::new(region, url, name);
            match location {
                Some((lat, lng)) => endpoint.with_location(lat, lng),
                None => endpoint,
            }
        })
        .collect()
}

/// Anything that can produce an endpoint directory
#[async_trait]
pub trait DirectorySource: Send + Sync {
    async fn fetch(&self) -> Result<EndpointDirectory>;

    /// Short label used in log lines
    fn describe(&self) -> String;
}

/// A fixed directory, the builtin table unless told otherwise
#[derive(Debug, Clone)]
pub struct StaticDirectory {
    directory: EndpointDirectory,
}

impl StaticDirectory {
    pub fn new(directory: EndpointDirectory) -> Self {
        Self { directory }
    }

    pub fn builtin() -> Self {
        Self::new(builtin())
    }
}

#[async_trait]
impl DirectorySource for StaticDirectory {
    async fn fetch(&self) -> Result<EndpointDirectory> {
        Ok(self.directory.clone())
    }

    fn describe(&self) -> String {
        format!("builtin table ({} regions)", self.directory.len())
    }
}

/// Directory served as JSON by another instance's `/api/endpoints`
pub struct RemoteDirectory {
    client: Client,
    url: String,
}

impl RemoteDirectory {
    /// Create a source for `url`; `timeout` bounds each request
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        url::Url::parse(url)?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::directory_fetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl DirectorySource for RemoteDirectory {
    async fn fetch(&self) -> Result<EndpointDirectory> {
        let response = self.client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::directory_fetch(format!("Request to '{}' failed: {}", self.url, e)))?;

        if response.status() != StatusCode::OK {
            return Err(AppError::directory_fetch(format!(
                "HTTP {} from '{}'",
                response.status(),
                self.url
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::directory_fetch(format!("Failed to read body from '{}': {}", self.url, e)))?;

        if body.is_empty() {
            return Err(AppError::directory_fetch(format!("Empty response from '{}'", self.url)));
        }

        serde_json::from_slice(&body)
            .map_err(|e| AppError::directory_fetch(format!("Invalid directory JSON from '{}': {}", self.url, e)))
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}
