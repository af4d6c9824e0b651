use chrono::{DateTime, Utc};
use open_meteo::{rain_effect, weather_description, HeatConditions, RainConditions, RainEffect, WeatherConditions};
use serde::{Deserialize, Serialize};

/// Elevation used when the lookup fails
pub const FALLBACK_ELEVATION_M: f64 = 10.0;
/// Apparent temperature used when the heat-index lookup fails
pub const FALLBACK_APPARENT_TEMP_C: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeatCategory {
    Caution,
    ExtremeCaution,
    Danger,
    ExtremeDanger,
}

pub struct HeatTier {
    /// Exclusive upper bound in °C; the last tier is open-ended
    pub below: f64,
    pub category: HeatCategory,
    pub label: &'static str,
    pub color: &'static str,
    pub level: u8,
}

pub static HEAT_TIERS: [HeatTier; 4] = [
    HeatTier { below: 27.0, category: HeatCategory::Caution, label: "Caution", color: "#FFFF00", level: 1 },
    HeatTier { below: 32.0, category: HeatCategory::ExtremeCaution, label: "Extreme Caution", color: "#FFA500", level: 2 },
    HeatTier { below: 41.0, category: HeatCategory::Danger, label: "Danger", color: "#FF4500", level: 3 },
    HeatTier { below: f64::INFINITY, category: HeatCategory::ExtremeDanger, label: "Extreme Danger", color: "#8B0000", level: 4 },
];

fn tier_for(apparent_temp: f64) -> &'static HeatTier {
    HEAT_TIERS
        .iter()
        .find(|tier| apparent_temp < tier.below)
        .unwrap_or(&HEAT_TIERS[HEAT_TIERS.len() - 1])
}

impl HeatCategory {
    pub fn classify(apparent_temp: f64) -> Self {
        tier_for(apparent_temp).category
    }

    fn tier(&self) -> &'static HeatTier {
        HEAT_TIERS
            .iter()
            .find(|tier| tier.category == *self)
            .unwrap_or(&HEAT_TIERS[0])
    }

    pub fn label(&self) -> &'static str {
        self.tier().label
    }

    pub fn color(&self) -> &'static str {
        self.tier().color
    }

    pub fn level(&self) -> u8 {
        self.tier().level
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElevationRecord {
    pub meters: f64,
}

impl ElevationRecord {
    pub fn fallback() -> Self {
        Self { meters: FALLBACK_ELEVATION_M }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatIndexRecord {
    pub apparent_temp: f64,
    pub category: HeatCategory,
    pub color: String,
    pub level: u8,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

impl HeatIndexRecord {
    pub fn from_apparent(apparent_temp: f64) -> Self {
        let category = HeatCategory::classify(apparent_temp);
        Self {
            apparent_temp,
            category,
            color: category.color().to_string(),
            level: category.level(),
            temperature: None,
            humidity: None,
        }
    }

    pub fn fallback() -> Self {
        Self::from_apparent(FALLBACK_APPARENT_TEMP_C)
    }
}

impl From<HeatConditions> for HeatIndexRecord {
    fn from(c: HeatConditions) -> Self {
        Self {
            temperature: Some(c.temperature),
            humidity: Some(c.humidity),
            ..Self::from_apparent(c.apparent_temperature)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub temperature: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    pub weather_code: u16,
}

impl From<WeatherConditions> for WeatherRecord {
    fn from(c: WeatherConditions) -> Self {
        Self {
            temperature: c.temperature,
            humidity: c.humidity,
            precipitation: c.precipitation,
            wind_speed: c.wind_speed,
            weather_code: c.weather_code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainRecord {
    pub temperature: f64,
    pub precipitation: f64,
    pub rain: f64,
    pub showers: f64,
    pub weather_code: u16,
    pub description: String,
    pub effect: RainEffect,
}

impl From<RainConditions> for RainRecord {
    fn from(c: RainConditions) -> Self {
        Self {
            temperature: c.temperature,
            precipitation: c.precipitation,
            rain: c.rain,
            showers: c.showers,
            weather_code: c.weather_code,
            description: weather_description(c.weather_code).to_string(),
            effect: rain_effect(c.precipitation, c.weather_code),
        }
    }
}

/// Per-mode payload shown for the selected barangay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayRecord {
    Elevation { meters: f64 },
    Weather(WeatherRecord),
    HeatIndex(HeatIndexRecord),
    Rain(RainRecord),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DisplayState {
    Loading { barangay: String },
    Ready {
        barangay: String,
        record: DisplayRecord,
        fetched_at: DateTime<Utc>,
    },
    Failed { barangay: String, error: String },
}

impl DisplayState {
    pub fn ready(barangay: &str, record: DisplayRecord) -> Self {
        DisplayState::Ready {
            barangay: barangay.to_string(),
            record,
            fetched_at: Utc::now(),
        }
    }

    pub fn barangay(&self) -> &str {
        match self {
            DisplayState::Loading { barangay }
            | DisplayState::Ready { barangay, .. }
            | DisplayState::Failed { barangay, .. } => barangay,
        }
    }

    pub fn record(&self) -> Option<&DisplayRecord> {
        match self {
            DisplayState::Ready { record, .. } => Some(record),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DisplayState::Failed { .. })
    }
}
