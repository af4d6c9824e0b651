//! Seams to the external data services. The engine only talks to these
//! traits; the API crates implement them for production and tests supply
//! in-memory fakes.

use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;

use gdacs::{AdvisoryFeed, AdvisoryItem};
use open_elevation::OpenElevationAPI;
use open_meteo::{HeatConditions, OpenMeteoAPI, RainConditions, SynopticSample, WeatherConditions};

use crate::config::OverlayConfig;

pub trait ElevationSource: Send + Sync {
    fn elevation(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<f64>>;
}

pub trait ConditionsSource: Send + Sync {
    fn weather(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<WeatherConditions>>;
    fn heat(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<HeatConditions>>;
    fn rain(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<RainConditions>>;
    fn synoptic(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<SynopticSample>>;
}

pub trait AdvisorySource: Send + Sync {
    fn advisories(&self) -> BoxFuture<'_, Result<Vec<AdvisoryItem>>>;
}

impl ElevationSource for OpenElevationAPI {
    fn elevation(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<f64>> {
        self.fetch_elevation(lat, lon).boxed()
    }
}

impl ConditionsSource for OpenMeteoAPI {
    fn weather(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<WeatherConditions>> {
        self.get_weather(lat, lon).boxed()
    }

    fn heat(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<HeatConditions>> {
        self.get_heat(lat, lon).boxed()
    }

    fn rain(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<RainConditions>> {
        self.get_rain(lat, lon).boxed()
    }

    fn synoptic(&self, lat: f64, lon: f64) -> BoxFuture<'_, Result<SynopticSample>> {
        self.get_synoptic(lat, lon).boxed()
    }
}

impl AdvisorySource for AdvisoryFeed {
    fn advisories(&self) -> BoxFuture<'_, Result<Vec<AdvisoryItem>>> {
        self.fetch_items().boxed()
    }
}

/// The set of collaborators the engine fetches from
#[derive(Clone)]
pub struct DataSources {
    pub elevation: Arc<dyn ElevationSource>,
    pub conditions: Arc<dyn ConditionsSource>,
    pub advisories: Arc<dyn AdvisorySource>,
}

impl DataSources {
    /// Production clients pointed at the configured endpoints
    pub fn from_config(config: &OverlayConfig) -> Result<Self> {
        Ok(Self {
            elevation: Arc::new(OpenElevationAPI::with_base_url(&config.elevation_url)?),
            conditions: Arc::new(OpenMeteoAPI::with_base_url(&config.forecast_url, &config.timezone)?),
            advisories: Arc::new(AdvisoryFeed::with_url(&config.advisory_url)?),
        })
    }
}
