//! Address geocoding seam.
//!
//! Coordinates are looked up opportunistically when a listing's address
//! changes; a lookup failure never fails the catalog operation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::GeoConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoder transport failure: {0}")]
    Transport(String),
    #[error("unexpected geocoder response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve "city, address" to coordinates; `None` when the lookup is
    /// disabled or the address is unknown to the provider.
    async fn geocode(&self, city: &str, address: &str) -> Result<Option<GeoPoint>, GeocodeError>;
}

/// HTTP client for a Yandex-style geocoder API.
///
/// Without an API key every lookup short-circuits to `None` with a warning,
/// so deployments may simply leave the key unset.
pub struct GeoClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl GeoClient {
    pub fn from_config(config: &GeoConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl Geocoder for GeoClient {
    async fn geocode(&self, city: &str, address: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("geocoder api key is not configured; skipping lookup");
            return Ok(None);
        };

        let full_address = format!("{city}, {address}");
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("apikey", api_key),
                ("geocode", full_address.as_str()),
                ("format", "json"),
                ("results", "1"),
            ])
            .send()
            .await
            .map_err(|err| GeocodeError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            return Err(GeocodeError::Transport(format!(
                "geocoder answered {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|err| GeocodeError::InvalidResponse(err.to_string()))?;

        // The provider answers with "lon lat" in `Point.pos`.
        let pos = body
            .pointer("/response/GeoObjectCollection/featureMember/0/GeoObject/Point/pos")
            .and_then(serde_json::Value::as_str);

        let Some(pos) = pos else {
            return Ok(None);
        };

        let mut parts = pos.split_whitespace();
        let longitude = parts.next().and_then(|raw| raw.parse::<f64>().ok());
        let latitude = parts.next().and_then(|raw| raw.parse::<f64>().ok());

        match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Ok(Some(GeoPoint {
                latitude,
                longitude,
            })),
            _ => Err(GeocodeError::InvalidResponse(format!(
                "unparseable point '{pos}'"
            ))),
        }
    }
}

/// Fixed-answer geocoder for tests and the CLI demo.
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    pub point: Option<GeoPoint>,
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, _city: &str, _address: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        Ok(self.point)
    }
}
