use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    None,
    Elevation,
    Weather,
    HeatIndex,
    Par,
    Rain,
}

pub const ALL_MODES: [Mode; 6] = [Mode::None, Mode::Elevation, Mode::Weather, Mode::HeatIndex, Mode::Par, Mode::Rain];

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::None => "none",
            Mode::Elevation => "elevation",
            Mode::Weather => "weather",
            Mode::HeatIndex => "heat_index",
            Mode::Par => "par",
            Mode::Rain => "rain",
        }
    }

    pub fn from_name(name: &str) -> Option<Mode> {
        ALL_MODES.iter().copied().find(|m| m.name() == name.to_lowercase())
    }

    /// Modes that show per-region data and move the camera on selection
    pub fn is_data_mode(&self) -> bool {
        matches!(self, Mode::Elevation | Mode::Weather | Mode::HeatIndex | Mode::Rain)
    }

    pub fn baseline_opacity(&self) -> f64 {
        match self {
            Mode::HeatIndex => 0.6,
            Mode::Elevation | Mode::Weather | Mode::Rain => 0.5,
            Mode::Par | Mode::None => 0.4,
        }
    }
}

/// Toggle rule: requesting the active mode turns everything off
pub fn next_mode(current: Mode, requested: Mode) -> Mode {
    if current == requested {
        Mode::None
    } else {
        requested
    }
}
