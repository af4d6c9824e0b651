//! Commands sent to the map renderer.

use std::collections::BTreeMap;

use log::*;
use serde::Serialize;

use crate::cyclone::CycloneRecord;
use crate::geometry::{Bounds, LonLat};
use crate::heatmap::HeatPoint;
use crate::palette::Paint;
use crate::region::RegionId;

pub const FIT_PADDING: f64 = 40.0;
pub const FOCUS_ZOOM: f64 = 15.0;
pub const FOCUS_PITCH: f64 = 60.0;
pub const FOCUS_BEARING: f64 = -17.6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MapCommand {
    Paint {
        entries: BTreeMap<RegionId, Paint>,
        fallback: Paint,
    },
    CreateHeatmapLayer,
    SetHeatmapPoints { points: Vec<HeatPoint> },
    SetHeatmapVisible { visible: bool },
    FitBounds {
        bounds: Bounds,
        padding: f64,
        pitch: f64,
        bearing: f64,
    },
    EaseTo {
        center: LonLat,
        zoom: f64,
        pitch: f64,
        bearing: f64,
    },
    SetCycloneMarkers { cyclones: Vec<CycloneRecord> },
    ClearCycloneMarkers,
}

impl MapCommand {
    /// Framing for the loaded regions, tilted
    pub fn fit_default(bounds: Bounds) -> Self {
        MapCommand::FitBounds {
            bounds,
            padding: FIT_PADDING,
            pitch: FOCUS_PITCH,
            bearing: FOCUS_BEARING,
        }
    }

    /// Flat framing for the area of responsibility
    pub fn fit_wide(bounds: Bounds) -> Self {
        MapCommand::FitBounds {
            bounds,
            padding: FIT_PADDING,
            pitch: 0.0,
            bearing: 0.0,
        }
    }

    pub fn focus(center: LonLat) -> Self {
        MapCommand::EaseTo {
            center,
            zoom: FOCUS_ZOOM,
            pitch: FOCUS_PITCH,
            bearing: FOCUS_BEARING,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MapCommand::Paint { .. } => "paint",
            MapCommand::CreateHeatmapLayer => "create_heatmap_layer",
            MapCommand::SetHeatmapPoints { .. } => "set_heatmap_points",
            MapCommand::SetHeatmapVisible { .. } => "set_heatmap_visible",
            MapCommand::FitBounds { .. } => "fit_bounds",
            MapCommand::EaseTo { .. } => "ease_to",
            MapCommand::SetCycloneMarkers { .. } => "set_cyclone_markers",
            MapCommand::ClearCycloneMarkers => "clear_cyclone_markers",
        }
    }
}

pub trait MapSurface: Send + Sync {
    fn apply(&self, command: MapCommand);
}

/// Writes every command to the log as JSON
pub struct LoggingSurface;

impl MapSurface for LoggingSurface {
    fn apply(&self, command: MapCommand) {
        match serde_json::to_string(&command) {
            Ok(json) => info!("map: {}", json),
            Err(e) => error!("map: could not serialize {} command: {}", command.name(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let bounds = Bounds::new(115.0, 135.0, 5.0, 25.0);
        match MapCommand::fit_wide(bounds) {
            MapCommand::FitBounds { padding, pitch, bearing, .. } => {
                assert_eq!(padding, 40.0);
                assert_eq!(pitch, 0.0);
                assert_eq!(bearing, 0.0);
            }
            other => panic!("unexpected {:?}", other),
        }

        let json = serde_json::to_value(MapCommand::focus(LonLat::new(121.0, 14.5))).unwrap();
        assert_eq!(json["command"], "ease_to");
        assert_eq!(json["zoom"], 15.0);
        assert_eq!(json["bearing"], -17.6);
    }
}
