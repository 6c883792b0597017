use std::{fmt, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::ProviderError,
    model::{Condition, Coordinates, WeatherQuery, WeatherSnapshot},
};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn query_params(&self, query: &WeatherQuery) -> Vec<(&'static str, String)> {
        let mut params = match query {
            WeatherQuery::ByName(city) => vec![("q", city.clone())],
            WeatherQuery::ByCoordinates(coords) => vec![
                ("lat", coords.lat.to_string()),
                ("lon", coords.lon.to_string()),
            ],
        };
        params.push(("units", "metric".to_string()));
        params.push(("appid", self.api_key.clone()));
        params
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self), fields(query = %query))]
    async fn current(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, ProviderError> {
        let url = format!("{}/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&self.query_params(query))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        debug!(%status, bytes = body.len(), "OpenWeather responded");

        parse_current(&body)
    }
}

/// The `cod` field arrives as a number on success and as a string on errors.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OwCode {
    Number(i64),
    Text(String),
}

impl OwCode {
    fn is_success(&self) -> bool {
        match self {
            OwCode::Number(n) => *n == 200,
            OwCode::Text(s) => s.trim() == "200",
        }
    }
}

impl fmt::Display for OwCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwCode::Number(n) => write!(f, "{n}"),
            OwCode::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwEnvelope {
    cod: Option<OwCode>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    coord: OwCoord,
    #[serde(default)]
    weather: Vec<OwWeather>,
    main: OwMain,
    wind: OwWind,
    sys: Option<OwSys>,
}

fn parse_current(body: &str) -> Result<WeatherSnapshot, ProviderError> {
    let envelope: OwEnvelope = serde_json::from_str(body).map_err(|e| {
        ProviderError::Parse(format!("{e}; body: {}", truncate_body(body)))
    })?;

    match envelope.cod {
        Some(code) if code.is_success() => {}
        code => {
            return Err(ProviderError::NotFound {
                code: code.map_or_else(|| "missing".to_string(), |c| c.to_string()),
                message: envelope.message.unwrap_or_default(),
            });
        }
    }

    let parsed: OwCurrentResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Parse(e.to_string()))?;

    let condition = parsed
        .weather
        .first()
        .map(|w| Condition::from(w.main.as_str()));

    let country = parsed
        .sys
        .and_then(|s| s.country)
        .filter(|c| !c.is_empty());

    Ok(WeatherSnapshot {
        city: parsed.name,
        country,
        condition,
        temperature_c: parsed.main.temp,
        humidity_pct: parsed.main.humidity,
        wind_speed_mps: parsed.wind.speed,
        coordinates: Coordinates::new(parsed.coord.lat, parsed.coord.lon),
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
