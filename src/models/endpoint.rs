//! Endpoint directory data model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One regional endpoint.
///
/// Field names follow the JSON served by `/api/endpoints`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// HTTPS base URL, probed at `<url>/ping`
    #[serde(rename = "URL")]
    pub url: String,

    /// Programmatic region id, e.g. `us-central1`
    #[serde(rename = "Region")]
    pub region: String,

    /// Geographic name, e.g. `Iowa`
    #[serde(rename = "RegionName", default)]
    pub display_name: String,

    #[serde(rename = "Lat", default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[serde(rename = "Lng", default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl EndpointDescriptor {
    pub fn new<S: Into<String>>(region: S, url: S, display_name: S) -> Self {
        Self {
            url: url.into(),
            region: region.into(),
            display_name: display_name.into(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }
}

/// Immutable mapping of region id to endpoint, ordered by region id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointDirectory {
    endpoints: BTreeMap<String, EndpointDescriptor>,
}

impl EndpointDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, region: &str) -> Option<&EndpointDescriptor> {
        self.endpoints.get(region)
    }

    pub fn contains(&self, region: &str) -> bool {
        self.endpoints.contains_key(region)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Region ids in alphabetical order
    pub fn sorted_regions(&self) -> Vec<&str> {
        self.endpoints.keys().map(String::as_str).collect()
    }

    /// Iterate `(region, descriptor)` pairs in region order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EndpointDescriptor)> {
        self.endpoints.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<EndpointDescriptor> for EndpointDirectory {
    fn from_iter<I: IntoIterator<Item = EndpointDescriptor>>(iter: I) -> Self {
        Self {
            endpoints: iter.into_iter().map(|e| (e.region.clone(), e)).collect(),
        }
    }
}
