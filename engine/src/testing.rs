//! In-memory collaborators shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use futures::future::BoxFuture;
use futures::FutureExt;
use geojson::Value;
use parking_lot::Mutex;

use gdacs::AdvisoryItem;
use open_meteo::{HeatConditions, RainConditions, SynopticSample, WeatherConditions};

use crate::geometry;
use crate::region::Region;
use crate::sources::{AdvisorySource, ConditionsSource, DataSources, ElevationSource};
use crate::surface::{MapCommand, MapSurface};

/// A small square barangay centred on `(lon, lat)`
pub fn region_at(psgc: &str, lon: f64, lat: f64) -> Region {
    let h = 0.005;
    let ring = vec![
        [lon - h, lat - h],
        [lon + h, lat - h],
        [lon + h, lat + h],
        [lon - h, lat + h],
        [lon - h, lat - h],
    ];
    let geometry = Value::Polygon(vec![ring.iter().map(|p| p.to_vec()).collect()]);
    Region {
        psgc: psgc.to_string(),
        name: format!("Barangay {}", psgc),
        geometry,
        centroid: geometry::label_point(&ring),
        ring,
    }
}

pub fn sample_regions(n: usize) -> Vec<Region> {
    (0..n)
        .map(|i| region_at(&format!("13815000{:02}", i + 1), 121.0 + i as f64 * 0.02, 14.5))
        .collect()
}

async fn delay(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

pub struct FakeElevation {
    meters: f64,
    latency: Duration,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl FakeElevation {
    pub fn new(meters: f64) -> Self {
        Self::with_latency(meters, Duration::ZERO)
    }

    pub fn with_latency(meters: f64, latency: Duration) -> Self {
        Self {
            meters,
            latency,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        let fake = Self::new(0.0);
        fake.fail.store(true, Ordering::SeqCst);
        fake
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ElevationSource for FakeElevation {
    fn elevation(&self, _lat: f64, _lon: f64) -> BoxFuture<'_, Result<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        async move {
            delay(self.latency).await;
            if self.fail.load(Ordering::SeqCst) {
                Err(anyhow!("elevation service unavailable"))
            } else {
                Ok(self.meters)
            }
        }
        .boxed()
    }
}

pub struct FakeConditions {
    apparent_temp: f64,
    synoptic: SynopticSample,
    latency: Duration,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl Default for FakeConditions {
    fn default() -> Self {
        Self {
            apparent_temp: 30.0,
            synoptic: SynopticSample { surface_pressure: 1012.0, wind_speed_kn: 5.0 },
            latency: Duration::ZERO,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakeConditions {
    pub fn failing() -> Self {
        let fake = Self::default();
        fake.set_failing(true);
        fake
    }

    pub fn with_apparent_temp(mut self, apparent_temp: f64) -> Self {
        self.apparent_temp = apparent_temp;
        self
    }

    pub fn with_synoptic(mut self, surface_pressure: f64, wind_speed_kn: f64) -> Self {
        self.synoptic = SynopticSample { surface_pressure, wind_speed_kn };
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond<T: Send + 'static>(&self, value: T) -> BoxFuture<'_, Result<T>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        async move {
            delay(self.latency).await;
            if self.fail.load(Ordering::SeqCst) {
                Err(anyhow!("forecast service unavailable"))
            } else {
                Ok(value)
            }
        }
        .boxed()
    }
}

impl ConditionsSource for FakeConditions {
    fn weather(&self, _lat: f64, _lon: f64) -> BoxFuture<'_, Result<WeatherConditions>> {
        self.respond(WeatherConditions {
            temperature: 29.0,
            humidity: 70.0,
            precipitation: 0.0,
            wind_speed: 12.0,
            weather_code: 2,
        })
    }

    fn heat(&self, _lat: f64, _lon: f64) -> BoxFuture<'_, Result<HeatConditions>> {
        self.respond(HeatConditions {
            temperature: 31.0,
            humidity: 65.0,
            apparent_temperature: self.apparent_temp,
        })
    }

    fn rain(&self, _lat: f64, _lon: f64) -> BoxFuture<'_, Result<RainConditions>> {
        self.respond(RainConditions {
            temperature: 26.0,
            precipitation: 3.0,
            rain: 2.0,
            showers: 1.0,
            weather_code: 61,
        })
    }

    fn synoptic(&self, _lat: f64, _lon: f64) -> BoxFuture<'_, Result<SynopticSample>> {
        self.respond(self.synoptic)
    }
}

#[derive(Default)]
pub struct FakeAdvisories {
    items: Vec<AdvisoryItem>,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeAdvisories {
    pub fn with_items(items: Vec<AdvisoryItem>) -> Self {
        Self { items, ..Self::default() }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AdvisorySource for FakeAdvisories {
    fn advisories(&self) -> BoxFuture<'_, Result<Vec<AdvisoryItem>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.fail {
            Err(anyhow!("feed unreachable"))
        } else {
            Ok(self.items.clone())
        };
        async move { result }.boxed()
    }
}

/// Keeps every command it receives
#[derive(Default)]
pub struct RecordingSurface {
    commands: Mutex<Vec<MapCommand>>,
}

impl RecordingSurface {
    pub fn commands(&self) -> Vec<MapCommand> {
        self.commands.lock().clone()
    }

    pub fn clear(&self) {
        self.commands.lock().clear();
    }

    pub fn count(&self, name: &str) -> usize {
        self.commands.lock().iter().filter(|c| c.name() == name).count()
    }

    pub fn last(&self, name: &str) -> Option<MapCommand> {
        self.commands.lock().iter().rev().find(|c| c.name() == name).cloned()
    }
}

impl MapSurface for RecordingSurface {
    fn apply(&self, command: MapCommand) {
        self.commands.lock().push(command);
    }
}

/// The fakes behind a [`DataSources`], kept so tests can inspect them
pub struct Fakes {
    pub elevation: Arc<FakeElevation>,
    pub conditions: Arc<FakeConditions>,
    pub advisories: Arc<FakeAdvisories>,
}

impl Fakes {
    pub fn new(elevation: FakeElevation, conditions: FakeConditions, advisories: FakeAdvisories) -> Self {
        Self {
            elevation: Arc::new(elevation),
            conditions: Arc::new(conditions),
            advisories: Arc::new(advisories),
        }
    }

    pub fn sources(&self) -> DataSources {
        DataSources {
            elevation: self.elevation.clone(),
            conditions: self.conditions.clone(),
            advisories: self.advisories.clone(),
        }
    }
}

impl Default for Fakes {
    fn default() -> Self {
        Self::new(FakeElevation::new(20.0), FakeConditions::default(), FakeAdvisories::default())
    }
}
