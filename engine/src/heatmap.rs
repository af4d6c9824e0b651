use std::collections::HashMap;

use serde::Serialize;

use crate::records::HeatIndexRecord;
use crate::region::{Region, RegionId};

/// Apparent temperature mapped to zero intensity
const INTENSITY_FLOOR_C: f64 = 20.0;
/// Degrees above the floor that saturate the intensity
const INTENSITY_SPAN_C: f64 = 25.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatPoint {
    pub psgc: RegionId,
    pub lon: f64,
    pub lat: f64,
    pub intensity: f64,
}

pub fn intensity(apparent_temp: f64) -> f64 {
    ((apparent_temp - INTENSITY_FLOOR_C) / INTENSITY_SPAN_C).clamp(0.0, 1.0)
}

/// One point per region with a cached heat-index value, in region order
pub fn build_points(regions: &[Region], heat_index: &HashMap<RegionId, HeatIndexRecord>) -> Vec<HeatPoint> {
    regions
        .iter()
        .filter_map(|region| {
            let record = heat_index.get(&region.psgc)?;
            Some(HeatPoint {
                psgc: region.psgc.clone(),
                lon: region.centroid.lon,
                lat: region.centroid.lat,
                intensity: intensity(record.apparent_temp),
            })
        })
        .collect()
}
