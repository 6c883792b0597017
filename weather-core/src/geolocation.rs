//! Single-shot location lookup.
//!
//! The host has no browser geolocation, so the default adapter asks an IP
//! geolocation service. Fixed and disabled adapters cover explicit
//! coordinates and opting out.

use std::{fmt::Debug, sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{Config, error::GeolocationError, model::Coordinates};

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, GeolocationError>;
}

/// Resolves the caller's approximate position from their public IP.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    url: String,
    http: Client,
}

impl IpGeolocator {
    pub fn new(url: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for geolocation")?;

        Ok(Self { url, http })
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    message: Option<String>,
}

#[async_trait]
impl Geolocator for IpGeolocator {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| GeolocationError::Unavailable(e.to_string()))?;

        let parsed: IpApiResponse = res
            .json()
            .await
            .map_err(|e| GeolocationError::Unavailable(e.to_string()))?;

        if parsed.status != "success" {
            return Err(GeolocationError::Denied(
                parsed.message.unwrap_or(parsed.status),
            ));
        }

        match (parsed.lat, parsed.lon) {
            (Some(lat), Some(lon)) => {
                debug!(lat, lon, "Resolved location from IP");
                Ok(Coordinates::new(lat, lon))
            }
            _ => Err(GeolocationError::Unavailable(
                "response carried no coordinates".to_string(),
            )),
        }
    }
}

/// Always yields the same coordinates.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// Behaves like a user who refused the location prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeolocator;

#[async_trait]
impl Geolocator for DisabledGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Denied("geolocation disabled".to_string()))
    }
}

/// Pick a geolocator from config; explicit coordinates win over everything.
pub fn geolocator_from_config(
    config: &Config,
    fixed: Option<Coordinates>,
) -> anyhow::Result<Arc<dyn Geolocator>> {
    if let Some(coords) = fixed {
        return Ok(Arc::new(FixedGeolocator(coords)));
    }

    if !config.geolocate {
        return Ok(Arc::new(DisabledGeolocator));
    }

    let ip = IpGeolocator::new(
        config.geolocation_url.clone(),
        Duration::from_secs(config.timeout_secs),
    )?;
    Ok(Arc::new(ip))
}
