use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;
use log::*;
use parking_lot::Mutex;

use crate::cache::EnrichmentCache;
use crate::config::OverlayConfig;
use crate::cyclone::{CycloneDetector, CycloneRecord, HeuristicForecaster, TrackForecaster};
use crate::geometry::LonLat;
use crate::heatmap::{self, HeatPoint};
use crate::mode::{next_mode, Mode};
use crate::palette::{self, Enrichment, PaintSet, RegionPalette};
use crate::records::{DisplayState, ElevationRecord, HeatIndexRecord};
use crate::region::{Region, RegionId, ViewBounds};
use crate::selection;
use crate::sources::DataSources;
use crate::surface::{MapCommand, MapSurface};

/// Everything that changes on a mode switch or a click
#[derive(Debug, Default)]
pub(crate) struct OverlayState {
    pub(crate) mode: Mode,
    pub(crate) selection: Option<RegionId>,
    pub(crate) display: Option<DisplayState>,
    pub(crate) cyclones: Vec<CycloneRecord>,
    pub(crate) heatmap_created: bool,
    pub(crate) heatmap_visible: bool,
    /// Bumped on every click, reset and mode switch
    pub(crate) selection_token: u64,
    /// Bumped on every mode switch; a cyclone scan only lands if it still matches
    pub(crate) par_generation: u64,
}

/// Data loads started by a mode switch that finish after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingLoad {
    ElevationWarmUp,
    HeatIndexWarmUp,
    CycloneScan { generation: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: Mode,
    pub to: Mode,
    pub pending: Vec<PendingLoad>,
}

/// The overlay controller. Cheap to clone; clones share state, caches and
/// the map surface.
#[derive(Clone)]
pub struct OverlayEngine {
    pub(crate) regions: Arc<Vec<Region>>,
    pub(crate) view: ViewBounds,
    pub(crate) palette: Arc<RegionPalette>,
    pub(crate) elevation: EnrichmentCache<ElevationRecord>,
    pub(crate) heat_index: EnrichmentCache<HeatIndexRecord>,
    pub(crate) sources: DataSources,
    pub(crate) detector: CycloneDetector,
    pub(crate) surface: Arc<dyn MapSurface>,
    pub(crate) state: Arc<Mutex<OverlayState>>,
}

impl OverlayEngine {
    pub fn new(regions: Vec<Region>, config: &OverlayConfig, sources: DataSources, surface: Arc<dyn MapSurface>) -> Self {
        let forecaster: Arc<dyn TrackForecaster> = Arc::new(HeuristicForecaster::new(config.cyclone_seed));
        Self::with_forecaster(regions, config, sources, surface, forecaster)
    }

    pub fn with_forecaster(
        regions: Vec<Region>,
        config: &OverlayConfig,
        sources: DataSources,
        surface: Arc<dyn MapSurface>,
        forecaster: Arc<dyn TrackForecaster>,
    ) -> Self {
        let view = ViewBounds::compute(&regions);
        let palette = RegionPalette::build(&regions, &config.palette);
        let detector = CycloneDetector::new(
            sources.advisories.clone(),
            sources.conditions.clone(),
            config.grid_points(),
            forecaster,
        );

        Self {
            regions: Arc::new(regions),
            view,
            palette: Arc::new(palette),
            elevation: EnrichmentCache::new("elevation"),
            heat_index: EnrichmentCache::new("heat_index"),
            sources,
            detector,
            surface,
            state: Arc::new(Mutex::new(OverlayState::default())),
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.psgc == id)
    }

    pub fn view_bounds(&self) -> ViewBounds {
        self.view
    }

    pub fn mode(&self) -> Mode {
        self.state.lock().mode
    }

    pub fn selection(&self) -> Option<RegionId> {
        self.state.lock().selection.clone()
    }

    pub fn display(&self) -> Option<DisplayState> {
        self.state.lock().display.clone()
    }

    pub fn cyclones(&self) -> Vec<CycloneRecord> {
        self.state.lock().cyclones.clone()
    }

    pub fn elevation_cache(&self) -> &EnrichmentCache<ElevationRecord> {
        &self.elevation
    }

    pub fn heat_index_cache(&self) -> &EnrichmentCache<HeatIndexRecord> {
        &self.heat_index
    }

    pub fn heatmap_points(&self) -> Vec<HeatPoint> {
        heatmap::build_points(&self.regions, &self.heat_index.snapshot())
    }

    /// The paint the map should currently show
    pub fn paint(&self) -> PaintSet {
        let state = self.state.lock();
        self.paint_for(&state)
    }

    pub(crate) fn paint_for(&self, state: &OverlayState) -> PaintSet {
        let elevation = self.elevation.snapshot();
        let heat_index = self.heat_index.snapshot();
        let enrichment = Enrichment {
            elevation: &elevation,
            heat_index: &heat_index,
        };

        match &state.selection {
            Some(selected) if state.mode != Mode::None => {
                selection::highlight_paint(state.mode, selected, &self.regions, &self.palette, enrichment)
            }
            _ => palette::base_paint(state.mode, &self.regions, &self.palette, enrichment),
        }
    }

    /// Callers hold the state lock so commands reach the surface in the
    /// order the state changed
    pub(crate) fn apply_all(&self, commands: Vec<MapCommand>) {
        for command in commands {
            self.surface.apply(command);
        }
    }

    /// Initial framing and paint
    pub fn present(&self) {
        let state = self.state.lock();
        self.apply_all(vec![MapCommand::fit_default(self.view.default), self.paint_for(&state).into_command()]);
    }

    /// Switch modes. State and visuals change immediately; data the new
    /// mode needs is listed in the returned [`Transition`] for [`load`](Self::load).
    pub fn toggle(&self, requested: Mode) -> Transition {
        let mut state = self.state.lock();
        let from = state.mode;
        let to = next_mode(from, requested);

        state.mode = to;
        state.selection = None;
        state.display = None;
        state.selection_token += 1;
        state.par_generation += 1;

        let mut commands = Vec::new();
        let mut pending = Vec::new();

        if from == Mode::Par && to != Mode::Par {
            state.cyclones.clear();
            commands.push(MapCommand::ClearCycloneMarkers);
            commands.push(MapCommand::fit_default(self.view.default));
        }

        match to {
            Mode::HeatIndex => {
                if !state.heatmap_created {
                    commands.push(MapCommand::CreateHeatmapLayer);
                    state.heatmap_created = true;
                }
                commands.push(MapCommand::SetHeatmapPoints { points: self.heatmap_points() });
                commands.push(MapCommand::SetHeatmapVisible { visible: true });
                state.heatmap_visible = true;
                if !self.heat_index.covers(&self.regions) {
                    pending.push(PendingLoad::HeatIndexWarmUp);
                }
            }
            Mode::Par => {
                commands.push(MapCommand::fit_wide(self.view.wide));
                pending.push(PendingLoad::CycloneScan { generation: state.par_generation });
            }
            Mode::Elevation => {
                if !self.elevation.covers(&self.regions) {
                    pending.push(PendingLoad::ElevationWarmUp);
                }
            }
            Mode::Weather | Mode::Rain | Mode::None => {}
        }

        if to != Mode::HeatIndex && state.heatmap_visible {
            commands.push(MapCommand::SetHeatmapVisible { visible: false });
            state.heatmap_visible = false;
        }

        commands.push(self.paint_for(&state).into_command());
        self.apply_all(commands);

        info!("overlay: mode {} -> {}", from.name(), to.name());
        Transition { from, to, pending }
    }

    /// Run the loads a transition asked for
    pub async fn load(&self, transition: Transition) {
        for pending in transition.pending {
            match pending {
                PendingLoad::ElevationWarmUp => self.warm_up_elevation().await,
                PendingLoad::HeatIndexWarmUp => self.warm_up_heat_index().await,
                PendingLoad::CycloneScan { generation } => self.scan_cyclones(generation).await,
            }
        }
    }

    /// Toggle and wait for the mode's data
    pub async fn activate(&self, requested: Mode) -> Mode {
        let transition = self.toggle(requested);
        let to = transition.to;
        self.load(transition).await;
        to
    }

    pub(crate) fn elevation_fetch(&self, at: LonLat) -> BoxFuture<'static, Result<ElevationRecord>> {
        let source = self.sources.elevation.clone();
        async move {
            let meters = source.elevation(at.lat, at.lon).await?;
            Ok(ElevationRecord { meters })
        }
        .boxed()
    }

    pub(crate) fn heat_index_fetch(&self, at: LonLat) -> BoxFuture<'static, Result<HeatIndexRecord>> {
        let source = self.sources.conditions.clone();
        async move {
            let conditions = source.heat(at.lat, at.lon).await?;
            Ok(HeatIndexRecord::from(conditions))
        }
        .boxed()
    }

    pub async fn warm_up_elevation(&self) {
        self.elevation
            .warm_up(&self.regions, |r| self.elevation_fetch(r.centroid), ElevationRecord::fallback)
            .await;
        self.refresh_paint(|mode| mode.is_data_mode());
    }

    pub async fn warm_up_heat_index(&self) {
        self.heat_index
            .warm_up(&self.regions, |r| self.heat_index_fetch(r.centroid), HeatIndexRecord::fallback)
            .await;
        self.refresh_heat_index();
    }

    /// Re-send the heatmap batch and paint if heat index is still showing
    pub(crate) fn refresh_heat_index(&self) {
        let state = self.state.lock();
        if state.mode != Mode::HeatIndex {
            debug!("overlay: heat-index data arrived after leaving the mode");
            return;
        }
        self.apply_all(vec![
            MapCommand::SetHeatmapPoints { points: self.heatmap_points() },
            self.paint_for(&state).into_command(),
        ]);
    }

    /// Repaint for fresh cache data when the active mode wants it
    pub(crate) fn refresh_paint(&self, wants: impl Fn(Mode) -> bool) {
        let state = self.state.lock();
        if wants(state.mode) {
            self.apply_all(vec![self.paint_for(&state).into_command()]);
        }
    }

    fn scan_is_current(&self, state: &OverlayState, generation: u64) -> bool {
        state.par_generation == generation && state.mode == Mode::Par
    }

    async fn scan_cyclones(&self, generation: u64) {
        if !self.scan_is_current(&self.state.lock(), generation) {
            debug!("overlay: skipping cyclone scan #{} superseded by a mode change", generation);
            return;
        }

        let records = self.detector.detect().await;

        let mut state = self.state.lock();
        if !self.scan_is_current(&state, generation) {
            debug!("overlay: discarding cyclone scan #{} after mode change", generation);
            return;
        }
        state.cyclones = records.clone();
        self.apply_all(vec![MapCommand::SetCycloneMarkers { cyclones: records }]);
    }
}
