use anyhow::{anyhow, Result};
use log::*;
use reqwest::Client;
use serde::Deserialize;

/// Open-Elevation lookup client
pub struct OpenElevationAPI {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Debug, Deserialize)]
struct LookupResult {
    elevation: f64,
}

/// Parse `results[0].elevation` (meters) out of a lookup response
pub fn parse_elevation(body: &str) -> Result<f64> {
    let response: LookupResponse = serde_json::from_str(body)?;
    response
        .results
        .first()
        .map(|r| r.elevation)
        .ok_or_else(|| anyhow!("elevation response has no results"))
}

impl OpenElevationAPI {
    /// Create a new client against the public endpoint
    pub fn new() -> Result<Self> {
        Self::with_base_url("https://api.open-elevation.com/api/v1/lookup")
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: base_url.to_string(),
        })
    }

    /// Build the lookup URL; the service takes `locations=<lat>,<lon>`
    fn build_url(&self, lat: f64, lon: f64) -> String {
        format!("{}?locations={},{}", self.base_url, lat, lon)
    }

    /// Fetch ground elevation in meters for a single point
    pub async fn fetch_elevation(&self, lat: f64, lon: f64) -> Result<f64> {
        let url = self.build_url(lat, lon);
        debug!("Fetching elevation from: {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to fetch elevation: HTTP {} - URL: {}",
                response.status(),
                url
            ));
        }

        let body = response.text().await?;
        parse_elevation(&body)
    }
}
