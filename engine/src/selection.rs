use std::collections::HashMap;

use log::*;
use once_cell::sync::Lazy;

use crate::engine::OverlayEngine;
use crate::geometry::LonLat;
use crate::mode::Mode;
use crate::palette::{color_for, Enrichment, Paint, PaintSet, RegionPalette};
use crate::records::{DisplayRecord, DisplayState, HeatIndexRecord, RainRecord, WeatherRecord};
use crate::region::{Region, RegionId};
use crate::surface::MapCommand;

pub const SELECTED_HEIGHT_SCALE: f64 = 50.0;
pub const SELECTED_FALLBACK_HEIGHT: f64 = 1500.0;
pub const SELECTED_OPACITY: f64 = 0.8;
pub const FADED_OPACITY: f64 = 0.2;

static HIGHLIGHT_TINTS: Lazy<HashMap<Mode, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (Mode::Elevation, "#FFD700"),
        (Mode::Weather, "#00BFFF"),
        (Mode::HeatIndex, "#FF00FF"),
        (Mode::Rain, "#00FFFF"),
        (Mode::Par, "#FFFFFF"),
    ])
});

pub fn highlight_tint(mode: Mode) -> Option<&'static str> {
    HIGHLIGHT_TINTS.get(&mode).copied()
}

/// Emphasise `selected` and fade everything else
pub fn highlight_paint(
    mode: Mode,
    selected: &str,
    regions: &[Region],
    palette: &RegionPalette,
    enrichment: Enrichment<'_>,
) -> PaintSet {
    let faded = |id: &str| Paint {
        color: color_for(mode, id, palette, enrichment),
        height: 0.0,
        opacity: FADED_OPACITY,
    };

    let entries = regions
        .iter()
        .map(|region| {
            let paint = if region.psgc == selected {
                Paint {
                    color: highlight_tint(mode)
                        .map(str::to_string)
                        .unwrap_or_else(|| color_for(mode, selected, palette, enrichment)),
                    height: enrichment
                        .elevation
                        .get(selected)
                        .map(|record| record.meters * SELECTED_HEIGHT_SCALE)
                        .unwrap_or(SELECTED_FALLBACK_HEIGHT),
                    opacity: SELECTED_OPACITY,
                }
            } else {
                faded(&region.psgc)
            };
            (region.psgc.clone(), paint)
        })
        .collect();

    PaintSet {
        entries,
        fallback: faded(""),
    }
}

/// A click whose data is still to be fetched
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSelection {
    pub token: u64,
    pub mode: Mode,
    pub psgc: RegionId,
    pub name: String,
    pub centroid: LonLat,
}

impl OverlayEngine {
    /// Select a region. Visual emphasis and camera move happen now; the
    /// returned value, if any, is the fetch for the display record.
    pub fn select(&self, id: &str) -> Option<PendingSelection> {
        let region = match self.region(id) {
            Some(region) => region,
            None => {
                warn!("selection: unknown region {}", id);
                return None;
            }
        };

        let mut state = self.state.lock();
        let mode = state.mode;
        if mode == Mode::None {
            debug!("selection: ignoring click on {} with no active mode", id);
            return None;
        }

        state.selection = Some(region.psgc.clone());
        state.selection_token += 1;
        let token = state.selection_token;

        let pending = match mode {
            Mode::Elevation => {
                let meters = self.elevation.get(id).map(|r| r.meters).unwrap_or(0.0);
                state.display = Some(DisplayState::ready(&region.name, DisplayRecord::Elevation { meters }));
                None
            }
            Mode::Weather | Mode::HeatIndex | Mode::Rain => {
                state.display = Some(DisplayState::Loading { barangay: region.name.clone() });
                Some(PendingSelection {
                    token,
                    mode,
                    psgc: region.psgc.clone(),
                    name: region.name.clone(),
                    centroid: region.centroid,
                })
            }
            Mode::Par | Mode::None => {
                state.display = None;
                None
            }
        };

        let mut commands = vec![self.paint_for(&state).into_command()];
        if mode.is_data_mode() {
            commands.push(MapCommand::focus(region.centroid));
        }
        self.apply_all(commands);

        info!("selection: {} ({}) in {} mode", region.name, region.psgc, mode.name());
        pending
    }

    /// Fetch the display record for a click and publish it if the click is
    /// still the latest one
    pub async fn resolve_selection(&self, pending: PendingSelection) {
        let at = pending.centroid;
        let result = match pending.mode {
            Mode::Weather => self
                .sources
                .conditions
                .weather(at.lat, at.lon)
                .await
                .map(|c| DisplayRecord::Weather(WeatherRecord::from(c))),
            Mode::Rain => self
                .sources
                .conditions
                .rain(at.lat, at.lon)
                .await
                .map(|c| DisplayRecord::Rain(RainRecord::from(c))),
            Mode::HeatIndex => match self.sources.conditions.heat(at.lat, at.lon).await {
                Ok(conditions) => {
                    let record = HeatIndexRecord::from(conditions);
                    self.heat_index.insert(&pending.psgc, record.clone());
                    Ok(DisplayRecord::HeatIndex(record))
                }
                Err(e) => Err(e),
            },
            Mode::Elevation | Mode::Par | Mode::None => return,
        };

        {
            let mut state = self.state.lock();
            if state.selection_token != pending.token || state.mode != pending.mode {
                debug!("selection: dropping stale result for {} (token {})", pending.psgc, pending.token);
                return;
            }

            state.display = Some(match result {
                Ok(record) => DisplayState::ready(&pending.name, record),
                Err(e) => {
                    error!("selection: {} lookup for {} failed: {}", pending.mode.name(), pending.name, e);
                    DisplayState::Failed {
                        barangay: pending.name.clone(),
                        error: e.to_string(),
                    }
                }
            });
        }

        if pending.mode == Mode::HeatIndex {
            self.refresh_heat_index();
        }
    }

    pub async fn click_region(&self, id: &str) {
        if let Some(pending) = self.select(id) {
            self.resolve_selection(pending).await;
        }
    }

    /// Drop the selection and return to the mode's resting paint
    pub fn reset_selection(&self) {
        let mut state = self.state.lock();
        state.selection = None;
        state.display = None;
        state.selection_token += 1;
        self.apply_all(vec![self.paint_for(&state).into_command()]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverlayConfig;
    use crate::palette;
    use crate::records::ElevationRecord;
    use crate::testing::{sample_regions, FakeAdvisories, FakeConditions, FakeElevation, Fakes, RecordingSurface};
    use std::sync::Arc;
    use std::time::Duration;

    fn engine_with(fakes: &Fakes) -> (OverlayEngine, Arc<RecordingSurface>) {
        let surface = Arc::new(RecordingSurface::default());
        let engine = OverlayEngine::new(sample_regions(3), &OverlayConfig::default(), fakes.sources(), surface.clone());
        (engine, surface)
    }

    fn ids(engine: &OverlayEngine) -> Vec<RegionId> {
        engine.regions().iter().map(|r| r.psgc.clone()).collect()
    }

    #[test]
    fn test_highlight_paint() {
        let regions = sample_regions(3);
        let palette = RegionPalette::build(&regions, &HashMap::new());
        let mut elevation = HashMap::new();
        elevation.insert(regions[0].psgc.clone(), ElevationRecord { meters: 8.0 });
        let heat_index = HashMap::new();
        let enrichment = Enrichment { elevation: &elevation, heat_index: &heat_index };

        let paint = highlight_paint(Mode::Elevation, &regions[0].psgc, &regions, &palette, enrichment);
        let selected = paint.get(&regions[0].psgc);
        assert_eq!(selected.color, "#FFD700");
        assert_eq!(selected.height, 400.0);
        assert_eq!(selected.opacity, 0.8);

        let other = paint.get(&regions[1].psgc);
        assert_eq!(other.height, 0.0);
        assert_eq!(other.opacity, 0.2);
        assert_eq!(other.color, palette.color(&regions[1].psgc));

        let without_elevation = highlight_paint(Mode::Weather, &regions[2].psgc, &regions, &palette, enrichment);
        assert_eq!(without_elevation.get(&regions[2].psgc).height, 1500.0);
        assert_eq!(without_elevation.get(&regions[0].psgc).color, palette::WEATHER_COLOR);
    }

    #[tokio::test]
    async fn test_click_ignored_without_mode() {
        let fakes = Fakes::default();
        let (engine, surface) = engine_with(&fakes);

        assert!(engine.select(&ids(&engine)[0]).is_none());
        assert_eq!(engine.selection(), None);
        assert!(surface.commands().is_empty());
    }

    #[tokio::test]
    async fn test_elevation_click_uses_cache_only() {
        let fakes = Fakes::new(FakeElevation::new(12.0), FakeConditions::default(), FakeAdvisories::default());
        let (engine, surface) = engine_with(&fakes);
        let id = ids(&engine)[0].clone();

        engine.toggle(Mode::Elevation);
        assert!(engine.select(&id).is_none());
        assert_eq!(engine.display().and_then(|d| d.record().cloned()), Some(DisplayRecord::Elevation { meters: 0.0 }));
        assert_eq!(fakes.elevation.calls(), 0);

        engine.warm_up_elevation().await;
        engine.click_region(&id).await;
        assert_eq!(engine.display().and_then(|d| d.record().cloned()), Some(DisplayRecord::Elevation { meters: 12.0 }));
        assert_eq!(fakes.elevation.calls(), 3);
        assert_eq!(surface.count("ease_to"), 2);
    }

    #[tokio::test]
    async fn test_weather_click_fills_display() {
        let fakes = Fakes::default();
        let (engine, surface) = engine_with(&fakes);
        let id = ids(&engine)[1].clone();

        engine.toggle(Mode::Weather);
        let pending = engine.select(&id).unwrap();
        assert!(matches!(engine.display(), Some(DisplayState::Loading { .. })));

        engine.resolve_selection(pending).await;
        let display = engine.display().unwrap();
        assert_eq!(display.barangay(), engine.regions()[1].name);
        assert!(matches!(display.record(), Some(DisplayRecord::Weather(w)) if w.weather_code == 2));

        let center = engine.regions()[1].centroid;
        assert_eq!(surface.last("ease_to"), Some(MapCommand::focus(center)));
    }

    #[tokio::test]
    async fn test_reclick_is_idempotent() {
        let fakes = Fakes::default();
        let (engine, _) = engine_with(&fakes);
        let id = ids(&engine)[0].clone();

        engine.toggle(Mode::Rain);
        engine.click_region(&id).await;
        let first = engine.paint();
        engine.click_region(&id).await;

        assert_eq!(engine.selection(), Some(id));
        assert_eq!(engine.paint(), first);
        assert_eq!(fakes.conditions.calls(), 2);
    }

    #[tokio::test]
    async fn test_stale_click_discarded() {
        let fakes = Fakes::new(
            FakeElevation::new(5.0),
            FakeConditions::default().with_latency(Duration::from_millis(10)),
            FakeAdvisories::default(),
        );
        let (engine, _) = engine_with(&fakes);
        let ids = ids(&engine);

        engine.toggle(Mode::Rain);
        let first = engine.select(&ids[0]).unwrap();
        let second = engine.select(&ids[1]).unwrap();

        engine.resolve_selection(second).await;
        engine.resolve_selection(first).await;

        let display = engine.display().unwrap();
        assert_eq!(display.barangay(), engine.regions()[1].name);
        assert_eq!(engine.selection(), Some(ids[1].clone()));
    }

    #[tokio::test]
    async fn test_surfaced_error_leaves_cache_clean() {
        let fakes = Fakes::new(FakeElevation::new(5.0), FakeConditions::failing(), FakeAdvisories::default());
        let (engine, _) = engine_with(&fakes);
        let id = ids(&engine)[0].clone();

        engine.toggle(Mode::HeatIndex);
        engine.click_region(&id).await;
        assert!(engine.display().unwrap().is_error());
        assert!(!engine.heat_index_cache().contains(&id));

        fakes.conditions.set_failing(false);
        engine.click_region(&id).await;
        let display = engine.display().unwrap();
        assert!(!display.is_error());
        assert!(matches!(display.record(), Some(DisplayRecord::HeatIndex(h)) if h.apparent_temp == 30.0));
        assert!(engine.heat_index_cache().contains(&id));
        assert_eq!(fakes.conditions.calls(), 2);
    }

    #[tokio::test]
    async fn test_heat_click_after_failed_warm_up() {
        let fakes = Fakes::new(FakeElevation::new(5.0), FakeConditions::failing(), FakeAdvisories::default());
        let (engine, _) = engine_with(&fakes);
        let id = ids(&engine)[0].clone();

        engine.activate(Mode::HeatIndex).await;
        assert_eq!(engine.heat_index_cache().get(&id), Some(HeatIndexRecord::fallback()));
        let warm_up_calls = fakes.conditions.calls();

        engine.click_region(&id).await;
        assert!(engine.display().unwrap().is_error());
        assert_eq!(fakes.conditions.calls(), warm_up_calls + 1);
        assert_eq!(engine.heat_index_cache().get(&id), Some(HeatIndexRecord::fallback()));

        fakes.conditions.set_failing(false);
        engine.click_region(&id).await;
        let display = engine.display().unwrap();
        assert!(!display.is_error());
        match display.record() {
            Some(DisplayRecord::HeatIndex(h)) => {
                assert_eq!(h.apparent_temp, 30.0);
                assert_eq!(h.temperature, Some(31.0));
            }
            other => panic!("unexpected record {:?}", other),
        }
        assert_eq!(fakes.conditions.calls(), warm_up_calls + 2);
        assert_eq!(engine.heat_index_cache().get(&id).map(|h| h.apparent_temp), Some(30.0));
        assert_eq!(engine.paint().get(&ids(&engine)[1]).color, "#FFFF00");
    }

    #[tokio::test]
    async fn test_par_click_highlights_only() {
        let fakes = Fakes::default();
        let (engine, surface) = engine_with(&fakes);
        let id = ids(&engine)[2].clone();

        engine.toggle(Mode::Par);
        surface.clear();
        assert!(engine.select(&id).is_none());

        assert_eq!(engine.selection(), Some(id.clone()));
        assert_eq!(engine.display(), None);
        assert_eq!(surface.count("ease_to"), 0);
        assert_eq!(engine.paint().get(&id).opacity, 0.8);
    }

    #[tokio::test]
    async fn test_reset_selection_restores_baseline() {
        let fakes = Fakes::default();
        let (engine, _) = engine_with(&fakes);
        let ids = ids(&engine);

        engine.toggle(Mode::Weather);
        let baseline = engine.paint();
        engine.click_region(&ids[0]).await;
        assert_ne!(engine.paint(), baseline);

        engine.reset_selection();
        assert_eq!(engine.mode(), Mode::Weather);
        assert_eq!(engine.selection(), None);
        assert_eq!(engine.display(), None);
        assert_eq!(engine.paint(), baseline);
    }
}
