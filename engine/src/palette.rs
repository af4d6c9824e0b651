use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::mode::Mode;
use crate::records::{ElevationRecord, HeatIndexRecord};
use crate::region::{Region, RegionId};
use crate::surface::MapCommand;

/// Vertical exaggeration applied to elevation in data modes
pub const HEIGHT_SCALE: f64 = 15.0;
/// Extrusion used when no elevation is known
pub const FLAT_HEIGHT: f64 = 150.0;

pub const NEUTRAL_COLOR: &str = "#FF0000";
pub const UNKNOWN_REGION_COLOR: &str = "#808080";
pub const WEATHER_COLOR: &str = "#1E90FF";
pub const RAIN_COLOR: &str = "#4A6FA5";
pub const HEAT_PENDING_COLOR: &str = "#D3D3D3";

/// Colors handed out to regions in load order
const BASE_COLORS: [&str; 12] = [
    "#E6194B", "#3CB44B", "#FFE119", "#4363D8", "#F58231", "#911EB4",
    "#46F0F0", "#F032E6", "#BCF60C", "#FABEBE", "#008080", "#E6BEFF",
];

/// Region id to base color, fixed once the boundary set is loaded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionPalette {
    colors: HashMap<RegionId, String>,
}

impl RegionPalette {
    pub fn build(regions: &[Region], overrides: &HashMap<RegionId, String>) -> Self {
        let colors = regions
            .iter()
            .enumerate()
            .map(|(i, region)| {
                let color = overrides
                    .get(&region.psgc)
                    .cloned()
                    .unwrap_or_else(|| BASE_COLORS[i % BASE_COLORS.len()].to_string());
                (region.psgc.clone(), color)
            })
            .collect();
        Self { colors }
    }

    pub fn color(&self, id: &str) -> &str {
        self.colors.get(id).map(String::as_str).unwrap_or(UNKNOWN_REGION_COLOR)
    }
}

/// Borrowed view of the enrichment caches
#[derive(Clone, Copy)]
pub struct Enrichment<'a> {
    pub elevation: &'a HashMap<RegionId, ElevationRecord>,
    pub heat_index: &'a HashMap<RegionId, HeatIndexRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paint {
    pub color: String,
    pub height: f64,
    pub opacity: f64,
}

/// Per-region paint plus the value applied to any region not listed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaintSet {
    pub entries: BTreeMap<RegionId, Paint>,
    pub fallback: Paint,
}

impl PaintSet {
    pub fn get(&self, id: &str) -> &Paint {
        self.entries.get(id).unwrap_or(&self.fallback)
    }

    pub fn into_command(self) -> MapCommand {
        MapCommand::Paint {
            entries: self.entries,
            fallback: self.fallback,
        }
    }
}

pub fn height_for(id: &str, elevation: &HashMap<RegionId, ElevationRecord>) -> f64 {
    elevation
        .get(id)
        .map(|record| record.meters * HEIGHT_SCALE)
        .unwrap_or(FLAT_HEIGHT)
}

pub fn color_for(mode: Mode, id: &str, palette: &RegionPalette, enrichment: Enrichment<'_>) -> String {
    match mode {
        Mode::Elevation => palette.color(id).to_string(),
        Mode::Weather => WEATHER_COLOR.to_string(),
        Mode::HeatIndex => enrichment
            .heat_index
            .get(id)
            .map(|record| record.color.clone())
            .unwrap_or_else(|| HEAT_PENDING_COLOR.to_string()),
        Mode::Rain => RAIN_COLOR.to_string(),
        Mode::Par | Mode::None => NEUTRAL_COLOR.to_string(),
    }
}

fn base_height(mode: Mode, id: &str, enrichment: Enrichment<'_>) -> f64 {
    if mode.is_data_mode() {
        height_for(id, enrichment.elevation)
    } else {
        FLAT_HEIGHT
    }
}

/// The mode's resting paint for one region
pub fn base_paint_for(mode: Mode, id: &str, palette: &RegionPalette, enrichment: Enrichment<'_>) -> Paint {
    Paint {
        color: color_for(mode, id, palette, enrichment),
        height: base_height(mode, id, enrichment),
        opacity: mode.baseline_opacity(),
    }
}

pub fn base_paint(mode: Mode, regions: &[Region], palette: &RegionPalette, enrichment: Enrichment<'_>) -> PaintSet {
    let entries = regions
        .iter()
        .map(|region| (region.psgc.clone(), base_paint_for(mode, &region.psgc, palette, enrichment)))
        .collect();

    let fallback = Paint {
        color: match mode {
            Mode::Elevation => UNKNOWN_REGION_COLOR.to_string(),
            other => color_for(other, "", palette, enrichment),
        },
        height: FLAT_HEIGHT,
        opacity: mode.baseline_opacity(),
    };

    PaintSet { entries, fallback }
}
