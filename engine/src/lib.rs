//! Overlay controller for the barangay environmental map: mutually exclusive
//! data modes, per-region enrichment caches, paint and heatmap derivation,
//! selection emphasis and storm markers.

pub mod cache;
pub mod config;
pub mod cyclone;
pub mod engine;
pub mod geometry;
pub mod heatmap;
pub mod mode;
pub mod palette;
pub mod records;
pub mod region;
pub mod selection;
pub mod sources;
pub mod surface;

#[cfg(test)]
pub(crate) mod testing;

pub use config::OverlayConfig;
pub use engine::{OverlayEngine, PendingLoad, Transition};
pub use mode::Mode;
pub use region::{load_regions, load_regions_from_file, Region};
pub use sources::DataSources;
pub use surface::{LoggingSurface, MapCommand, MapSurface};
