use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Result};
use log::*;
use serde::{Deserialize, Serialize};

use crate::region::RegionId;

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_elevation_url() -> String {
    "https://api.open-elevation.com/api/v1/lookup".to_string()
}

fn default_advisory_url() -> String {
    "https://www.gdacs.org/xml/rss.xml".to_string()
}

fn default_timezone() -> String {
    "Asia/Manila".to_string()
}

fn default_grid_lats() -> Vec<f64> {
    vec![8.0, 12.0, 16.0, 20.0]
}

fn default_grid_lons() -> Vec<f64> {
    vec![118.0, 123.0, 128.0, 133.0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    #[serde(default = "default_elevation_url")]
    pub elevation_url: String,
    #[serde(default = "default_advisory_url")]
    pub advisory_url: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Synoptic sample rows
    #[serde(default = "default_grid_lats")]
    pub grid_lats: Vec<f64>,
    /// Synoptic sample columns
    #[serde(default = "default_grid_lons")]
    pub grid_lons: Vec<f64>,
    /// Fixes the track heuristic's randomness when set
    #[serde(default)]
    pub cyclone_seed: Option<u64>,
    #[serde(default)]
    pub palette: HashMap<RegionId, String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            forecast_url: default_forecast_url(),
            elevation_url: default_elevation_url(),
            advisory_url: default_advisory_url(),
            timezone: default_timezone(),
            grid_lats: default_grid_lats(),
            grid_lons: default_grid_lons(),
            cyclone_seed: None,
            palette: HashMap::new(),
        }
    }
}

impl OverlayConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| anyhow!("invalid overlay config: {}", e))
    }

    /// Reads `path`, or returns the defaults when the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| anyhow!("cannot read {}: {}", path.display(), e))?;
        let config = Self::from_json(&text)?;
        info!("config: loaded {}", path.display());
        Ok(config)
    }

    /// Every (lat, lon) pair of the synoptic grid
    pub fn grid_points(&self) -> Vec<(f64, f64)> {
        self.grid_lats
            .iter()
            .flat_map(|&lat| self.grid_lons.iter().map(move |&lon| (lat, lon)))
            .collect()
    }
}
