//! Storm markers for the area-of-responsibility view.
//!
//! Two independent sources feed the list: the advisory feed and a scan of
//! synoptic grid points. Each accepted system gets a five-day projected
//! track from a [`TrackForecaster`]. The projection is a display heuristic.

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use log::*;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use gdacs::AdvisoryItem;

use crate::geometry::LonLat;
use crate::region::PAR_BOX;
use crate::sources::{AdvisorySource, ConditionsSource};

pub const KNOTS_TO_KMH: f64 = 1.852;
/// A grid point below this surface pressure (hPa) is a candidate
pub const PRESSURE_THRESHOLD_HPA: f64 = 1008.0;
/// ...when its wind (knots) is also above this
pub const WIND_THRESHOLD_KN: f64 = 15.0;
/// Records closer than this in both axes are the same system
pub const DEDUP_DEGREES: f64 = 2.0;
pub const TRACK_DAYS: u32 = 5;
const TRACK_SPEED_DEG_PER_DAY: f64 = 0.5;
const TRACK_BEARING_DEG: f64 = 315.0;
const TRACK_BEARING_SPREAD_DEG: f64 = 30.0;
const TRACK_WIND_STEP_KMH: f64 = 10.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum DevelopmentStage {
    LowPressureArea,
    TropicalDepression,
    TropicalStorm,
    SevereTropicalStorm,
    Typhoon,
    SuperTyphoon,
}

/// (exclusive upper bound in km/h, stage)
const STAGE_LADDER: [(f64, DevelopmentStage); 6] = [
    (30.0, DevelopmentStage::LowPressureArea),
    (62.0, DevelopmentStage::TropicalDepression),
    (88.0, DevelopmentStage::TropicalStorm),
    (118.0, DevelopmentStage::SevereTropicalStorm),
    (184.0, DevelopmentStage::Typhoon),
    (f64::INFINITY, DevelopmentStage::SuperTyphoon),
];

impl DevelopmentStage {
    pub fn classify(wind_kmh: f64) -> Self {
        STAGE_LADDER
            .iter()
            .find(|(below, _)| wind_kmh < *below)
            .map(|(_, stage)| *stage)
            .unwrap_or(DevelopmentStage::SuperTyphoon)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DevelopmentStage::LowPressureArea => "LPA",
            DevelopmentStage::TropicalDepression => "Tropical Depression",
            DevelopmentStage::TropicalStorm => "Tropical Storm",
            DevelopmentStage::SevereTropicalStorm => "Severe Tropical Storm",
            DevelopmentStage::Typhoon => "Typhoon",
            DevelopmentStage::SuperTyphoon => "Super Typhoon",
        }
    }
}

/// Title keywords that mark a storm advisory, with the wind assumed when the
/// text carries no speed
const STORM_KEYWORDS: [(&str, f64); 6] = [
    ("tropical cyclone", 65.0),
    ("typhoon", 150.0),
    ("hurricane", 150.0),
    ("tropical storm", 75.0),
    ("tropical depression", 45.0),
    ("low pressure", 25.0),
];

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum CycloneSource {
    Advisory,
    GridScan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPoint {
    pub day: u32,
    pub lat: f64,
    pub lon: f64,
    pub wind_speed_kmh: f64,
    pub stage: DevelopmentStage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycloneRecord {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub stage: DevelopmentStage,
    pub wind_speed_kmh: f64,
    pub source: CycloneSource,
    pub track: Vec<TrackPoint>,
}

impl CycloneRecord {
    pub fn new(name: &str, lat: f64, lon: f64, wind_speed_kmh: f64, source: CycloneSource) -> Self {
        Self {
            name: name.to_string(),
            lat,
            lon,
            stage: DevelopmentStage::classify(wind_speed_kmh),
            wind_speed_kmh,
            source,
            track: Vec::new(),
        }
    }

    pub fn is_near(&self, other: &CycloneRecord) -> bool {
        (self.lat - other.lat).abs() < DEDUP_DEGREES && (self.lon - other.lon).abs() < DEDUP_DEGREES
    }
}

fn storm_keyword(title: &str) -> Option<(&'static str, f64)> {
    let lower = title.to_lowercase();
    STORM_KEYWORDS.iter().copied().find(|(keyword, _)| lower.contains(keyword))
}

/// The number written just before "km/h", e.g. "winds of 120 km/h"
pub fn wind_from_text(text: &str) -> Option<f64> {
    let lower = text.to_lowercase();
    let end = lower.find("km/h")?;
    lower[..end]
        .split_whitespace()
        .last()
        .and_then(|token| token.trim_matches(|c: char| !c.is_ascii_digit() && c != '.').parse().ok())
}

/// Storm advisories positioned inside the area of responsibility
pub fn advisory_records(items: &[AdvisoryItem]) -> Vec<CycloneRecord> {
    items
        .iter()
        .filter_map(|item| {
            let (_, default_wind) = storm_keyword(&item.title)?;
            let (lat, lon) = item.point?;
            if !PAR_BOX.contains(LonLat::new(lon, lat)) {
                debug!("cyclone: advisory '{}' outside the area of responsibility", item.title);
                return None;
            }
            let wind = wind_from_text(&item.description)
                .or_else(|| wind_from_text(&item.title))
                .unwrap_or(default_wind);
            Some(CycloneRecord::new(item.title.trim(), lat, lon, wind, CycloneSource::Advisory))
        })
        .collect()
}

/// A grid sample that looks like a developing system
pub fn grid_candidate(lat: f64, lon: f64, pressure_hpa: f64, wind_kn: f64) -> Option<CycloneRecord> {
    if pressure_hpa < PRESSURE_THRESHOLD_HPA && wind_kn > WIND_THRESHOLD_KN {
        let name = format!("Low pressure near {:.1}N {:.1}E", lat, lon);
        Some(CycloneRecord::new(&name, lat, lon, wind_kn * KNOTS_TO_KMH, CycloneSource::GridScan))
    } else {
        None
    }
}

/// Advisory records first, then any grid record not near one already kept
pub fn deduplicate(advisory: Vec<CycloneRecord>, grid: Vec<CycloneRecord>) -> Vec<CycloneRecord> {
    let mut kept: Vec<CycloneRecord> = Vec::with_capacity(advisory.len() + grid.len());
    for record in advisory.into_iter().chain(grid) {
        if kept.iter().any(|existing| existing.is_near(&record)) {
            debug!("cyclone: dropping duplicate '{}'", record.name);
            continue;
        }
        kept.push(record);
    }
    kept
}

pub trait TrackForecaster: Send + Sync {
    fn project(&self, record: &CycloneRecord) -> Vec<TrackPoint>;
}

/// Constant-speed drift on a jittered north-west bearing with a widening
/// random walk on wind speed
pub struct HeuristicForecaster {
    rng: Mutex<StdRng>,
}

impl HeuristicForecaster {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng: Mutex::new(rng) }
    }
}

impl TrackForecaster for HeuristicForecaster {
    fn project(&self, record: &CycloneRecord) -> Vec<TrackPoint> {
        let mut rng = self.rng.lock();
        let bearing = (TRACK_BEARING_DEG + rng.gen_range(-TRACK_BEARING_SPREAD_DEG..=TRACK_BEARING_SPREAD_DEG)).to_radians();
        let (dlat, dlon) = (bearing.cos() * TRACK_SPEED_DEG_PER_DAY, bearing.sin() * TRACK_SPEED_DEG_PER_DAY);

        (1..=TRACK_DAYS)
            .map(|day| {
                let d = day as f64;
                let jitter = rng.gen_range(-TRACK_WIND_STEP_KMH..=TRACK_WIND_STEP_KMH) * d;
                let wind = (record.wind_speed_kmh + jitter).max(0.0);
                TrackPoint {
                    day,
                    lat: record.lat + dlat * d,
                    lon: record.lon + dlon * d,
                    wind_speed_kmh: wind,
                    stage: DevelopmentStage::classify(wind),
                }
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct CycloneDetector {
    advisories: Arc<dyn AdvisorySource>,
    conditions: Arc<dyn ConditionsSource>,
    grid: Vec<(f64, f64)>,
    forecaster: Arc<dyn TrackForecaster>,
}

impl CycloneDetector {
    pub fn new(
        advisories: Arc<dyn AdvisorySource>,
        conditions: Arc<dyn ConditionsSource>,
        grid: Vec<(f64, f64)>,
        forecaster: Arc<dyn TrackForecaster>,
    ) -> Self {
        Self {
            advisories,
            conditions,
            grid,
            forecaster,
        }
    }

    async fn scan_advisories(&self) -> Result<Vec<CycloneRecord>> {
        let items = self.advisories.advisories().await?;
        Ok(advisory_records(&items))
    }

    async fn scan_grid(&self) -> Vec<CycloneRecord> {
        let samples = join_all(self.grid.iter().map(|&(lat, lon)| async move {
            (lat, lon, self.conditions.synoptic(lat, lon).await)
        }))
        .await;

        let mut failures = 0;
        let candidates: Vec<CycloneRecord> = samples
            .into_iter()
            .filter_map(|(lat, lon, sample)| match sample {
                Ok(s) => grid_candidate(lat, lon, s.surface_pressure, s.wind_speed_kn),
                Err(e) => {
                    failures += 1;
                    debug!("cyclone: grid point {},{} failed: {}", lat, lon, e);
                    None
                }
            })
            .collect();

        if failures > 0 {
            warn!("cyclone: {} of {} grid points failed", failures, self.grid.len());
        }
        candidates
    }

    /// One fresh run over both sources; never fails, an unreachable source
    /// just contributes nothing
    pub async fn detect(&self) -> Vec<CycloneRecord> {
        let (advisory, grid) = futures::join!(self.scan_advisories(), self.scan_grid());

        let advisory = advisory.unwrap_or_else(|e| {
            warn!("cyclone: advisory feed unavailable: {}", e);
            Vec::new()
        });

        let mut records = deduplicate(advisory, grid);
        for record in records.iter_mut() {
            record.track = self.forecaster.project(record);
        }

        info!("cyclone: {} systems in the area of responsibility", records.len());
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeAdvisories, FakeConditions};

    fn item(title: &str, description: &str, point: Option<(f64, f64)>) -> AdvisoryItem {
        AdvisoryItem {
            title: title.to_string(),
            description: description.to_string(),
            link: String::new(),
            point,
        }
    }

    #[test]
    fn test_stage_ladder() {
        assert_eq!(DevelopmentStage::classify(29.9), DevelopmentStage::LowPressureArea);
        assert_eq!(DevelopmentStage::classify(30.0), DevelopmentStage::TropicalDepression);
        assert_eq!(DevelopmentStage::classify(61.9), DevelopmentStage::TropicalDepression);
        assert_eq!(DevelopmentStage::classify(62.0), DevelopmentStage::TropicalStorm);
        assert_eq!(DevelopmentStage::classify(88.0), DevelopmentStage::SevereTropicalStorm);
        assert_eq!(DevelopmentStage::classify(118.0), DevelopmentStage::Typhoon);
        assert_eq!(DevelopmentStage::classify(184.0), DevelopmentStage::SuperTyphoon);
        assert_eq!(DevelopmentStage::SuperTyphoon.label(), "Super Typhoon");
    }

    #[test]
    fn test_advisory_filtering() {
        let items = vec![
            item("Typhoon KONG-REY", "Maximum wind speed of 160 km/h", Some((18.0, 125.0))),
            item("Tropical Storm far away", "", Some((30.0, 140.0))),
            item("Earthquake M6.1 Mindanao", "", Some((7.0, 126.0))),
            item("Tropical Depression ONE", "no speed given", Some((10.0, 130.0))),
            item("Low Pressure Area", "", None),
        ];

        let records = advisory_records(&items);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].wind_speed_kmh, 160.0);
        assert_eq!(records[0].stage, DevelopmentStage::Typhoon);
        assert_eq!(records[1].wind_speed_kmh, 45.0);
        assert_eq!(records[1].source, CycloneSource::Advisory);
    }

    #[test]
    fn test_wind_from_text() {
        assert_eq!(wind_from_text("winds up to 95 km/h near the center"), Some(95.0));
        assert_eq!(wind_from_text("gusts (130km/h)"), Some(130.0));
        assert_eq!(wind_from_text("no numbers here"), None);
    }

    #[test]
    fn test_grid_candidate_thresholds() {
        let c = grid_candidate(12.0, 128.0, 1002.0, 20.0).unwrap();
        assert!((c.wind_speed_kmh - 37.04).abs() < 1e-9);
        assert_eq!(c.stage, DevelopmentStage::TropicalDepression);

        assert!(grid_candidate(12.0, 128.0, 1008.0, 20.0).is_none());
        assert!(grid_candidate(12.0, 128.0, 1000.0, 15.0).is_none());
    }

    #[test]
    fn test_dedup_keeps_advisory() {
        let advisory = vec![CycloneRecord::new("Typhoon A", 15.0, 125.0, 150.0, CycloneSource::Advisory)];
        let grid = vec![
            CycloneRecord::new("grid near", 16.5, 126.5, 40.0, CycloneSource::GridScan),
            CycloneRecord::new("grid far", 8.0, 118.0, 40.0, CycloneSource::GridScan),
            CycloneRecord::new("grid one axis", 15.5, 128.0, 40.0, CycloneSource::GridScan),
        ];

        let records = deduplicate(advisory, grid);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Typhoon A", "grid far", "grid one axis"]);
    }

    #[test]
    fn test_track_projection() {
        let forecaster = HeuristicForecaster::new(Some(42));
        let record = CycloneRecord::new("Typhoon A", 15.0, 125.0, 150.0, CycloneSource::Advisory);
        let track = forecaster.project(&record);

        assert_eq!(track.len(), 5);
        for (i, point) in track.iter().enumerate() {
            let day = (i + 1) as f64;
            let moved = ((point.lat - record.lat).powi(2) + (point.lon - record.lon).powi(2)).sqrt();
            assert!((moved - 0.5 * day).abs() < 1e-9);
            assert!(point.lat > record.lat);
            assert!(point.lon < record.lon);
            assert!((point.wind_speed_kmh - record.wind_speed_kmh).abs() <= 10.0 * day + 1e-9);
            assert_eq!(point.stage, DevelopmentStage::classify(point.wind_speed_kmh));
        }
    }

    #[tokio::test]
    async fn test_detect_survives_source_failures() {
        let detector = CycloneDetector::new(
            Arc::new(FakeAdvisories::failing()),
            Arc::new(FakeConditions::failing()),
            vec![(12.0, 128.0), (16.0, 123.0)],
            Arc::new(HeuristicForecaster::new(Some(1))),
        );
        assert!(detector.detect().await.is_empty());
    }

    #[tokio::test]
    async fn test_detect_merges_sources() {
        let advisories = FakeAdvisories::with_items(vec![item("Typhoon B", "185 km/h", Some((12.5, 128.5)))]);
        let conditions = FakeConditions::default().with_synoptic(1000.0, 25.0);
        let detector = CycloneDetector::new(
            Arc::new(advisories),
            Arc::new(conditions),
            vec![(12.0, 128.0), (20.0, 118.0)],
            Arc::new(HeuristicForecaster::new(Some(3))),
        );

        let records = detector.detect().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source, CycloneSource::Advisory);
        assert_eq!(records[0].stage, DevelopmentStage::SuperTyphoon);
        assert_eq!(records[1].source, CycloneSource::GridScan);
        assert_eq!(records[1].lat, 20.0);
        assert!(records.iter().all(|r| r.track.len() == 5));
    }
}
