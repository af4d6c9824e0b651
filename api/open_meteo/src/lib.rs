use anyhow::{anyhow, Result};
use log::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Open-Meteo forecast API client for current surface conditions
pub struct OpenMeteoAPI {
    client: Client,
    base_url: String,
    timezone: String,
}

/// Fields of the `current=` block understood by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurrentField {
    Temperature,
    RelativeHumidity,
    ApparentTemperature,
    Precipitation,
    Rain,
    Showers,
    WeatherCode,
    WindSpeed,
    SurfacePressure,
}

impl CurrentField {
    /// Get the query/response name for this field
    pub fn name(&self) -> &'static str {
        match self {
            CurrentField::Temperature => "temperature_2m",
            CurrentField::RelativeHumidity => "relative_humidity_2m",
            CurrentField::ApparentTemperature => "apparent_temperature",
            CurrentField::Precipitation => "precipitation",
            CurrentField::Rain => "rain",
            CurrentField::Showers => "showers",
            CurrentField::WeatherCode => "weather_code",
            CurrentField::WindSpeed => "wind_speed_10m",
            CurrentField::SurfacePressure => "surface_pressure",
        }
    }
}

pub const WEATHER_FIELDS: &[CurrentField] = &[
    CurrentField::Temperature,
    CurrentField::RelativeHumidity,
    CurrentField::Precipitation,
    CurrentField::WeatherCode,
    CurrentField::WindSpeed,
];

pub const HEAT_FIELDS: &[CurrentField] = &[
    CurrentField::Temperature,
    CurrentField::RelativeHumidity,
    CurrentField::ApparentTemperature,
];

pub const RAIN_FIELDS: &[CurrentField] = &[
    CurrentField::Temperature,
    CurrentField::Precipitation,
    CurrentField::WeatherCode,
    CurrentField::Rain,
    CurrentField::Showers,
];

pub const SYNOPTIC_FIELDS: &[CurrentField] = &[CurrentField::SurfacePressure, CurrentField::WindSpeed];

/// Raw `current` block; every field is optional because only requested fields come back
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CurrentConditions {
    pub temperature_2m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub rain: Option<f64>,
    pub showers: Option<f64>,
    pub weather_code: Option<u16>,
    pub wind_speed_10m: Option<f64>,
    pub surface_pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: Option<CurrentConditions>,
}

/// General weather snapshot for a point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherConditions {
    pub temperature: f64,
    pub humidity: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    pub weather_code: u16,
}

/// Inputs for heat-index classification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeatConditions {
    pub temperature: f64,
    pub humidity: f64,
    pub apparent_temperature: f64,
}

/// Rain snapshot; precipitation amounts are in mm
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RainConditions {
    pub temperature: f64,
    pub precipitation: f64,
    pub rain: f64,
    pub showers: f64,
    pub weather_code: u16,
}

/// Surface pressure (hPa) and wind speed (knots) at a grid point
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SynopticSample {
    pub surface_pressure: f64,
    pub wind_speed_kn: f64,
}

fn required(value: Option<f64>, field: CurrentField) -> Result<f64> {
    value.ok_or_else(|| anyhow!("missing current.{} in response", field.name()))
}

impl CurrentConditions {
    pub fn weather(&self) -> Result<WeatherConditions> {
        Ok(WeatherConditions {
            temperature: required(self.temperature_2m, CurrentField::Temperature)?,
            humidity: required(self.relative_humidity_2m, CurrentField::RelativeHumidity)?,
            precipitation: self.precipitation.unwrap_or(0.0),
            wind_speed: required(self.wind_speed_10m, CurrentField::WindSpeed)?,
            weather_code: self
                .weather_code
                .ok_or_else(|| anyhow!("missing current.weather_code in response"))?,
        })
    }

    pub fn heat(&self) -> Result<HeatConditions> {
        Ok(HeatConditions {
            temperature: required(self.temperature_2m, CurrentField::Temperature)?,
            humidity: required(self.relative_humidity_2m, CurrentField::RelativeHumidity)?,
            apparent_temperature: required(self.apparent_temperature, CurrentField::ApparentTemperature)?,
        })
    }

    pub fn rain(&self) -> Result<RainConditions> {
        Ok(RainConditions {
            temperature: required(self.temperature_2m, CurrentField::Temperature)?,
            precipitation: self.precipitation.unwrap_or(0.0),
            rain: self.rain.unwrap_or(0.0),
            showers: self.showers.unwrap_or(0.0),
            weather_code: self
                .weather_code
                .ok_or_else(|| anyhow!("missing current.weather_code in response"))?,
        })
    }

    pub fn synoptic(&self) -> Result<SynopticSample> {
        Ok(SynopticSample {
            surface_pressure: required(self.surface_pressure, CurrentField::SurfacePressure)?,
            wind_speed_kn: required(self.wind_speed_10m, CurrentField::WindSpeed)?,
        })
    }
}

/// Parse a forecast response body into its `current` block
pub fn parse_current(body: &str) -> Result<CurrentConditions> {
    let response: ForecastResponse = serde_json::from_str(body)?;
    response
        .current
        .ok_or_else(|| anyhow!("forecast response has no `current` block"))
}

impl OpenMeteoAPI {
    /// Create a new Open-Meteo client against the public endpoint
    pub fn new() -> Result<Self> {
        Self::with_base_url("https://api.open-meteo.com/v1/forecast", "Asia/Manila")
    }

    pub fn with_base_url(base_url: &str, timezone: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: base_url.to_string(),
            timezone: timezone.to_string(),
        })
    }

    /// Build the query pairs for a `current=` request
    pub fn build_query(&self, lat: f64, lon: f64, fields: &[CurrentField], knots: bool) -> Vec<(&'static str, String)> {
        let current = fields.iter().map(|f| f.name()).collect::<Vec<_>>().join(",");

        let mut params = vec![
            ("latitude", format!("{:.4}", lat)),
            ("longitude", format!("{:.4}", lon)),
            ("current", current),
            ("timezone", self.timezone.clone()),
        ];
        if knots {
            params.push(("wind_speed_unit", "kn".to_string()));
        }
        params
    }

    /// Fetch the `current` block for the requested fields
    pub async fn get_current(&self, lat: f64, lon: f64, fields: &[CurrentField], knots: bool) -> Result<CurrentConditions> {
        let params = self.build_query(lat, lon, fields, knots);
        debug!("Requesting current conditions at ({:.4}, {:.4})", lat, lon);

        let response = self.client.get(&self.base_url).query(&params).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Forecast request failed: {} - URL: {}", response.status(),
                format!("{}?{}", self.base_url, serde_urlencoded::to_string(&params).unwrap_or_default())));
        }

        let body = response.text().await?;
        parse_current(&body)
    }

    pub async fn get_weather(&self, lat: f64, lon: f64) -> Result<WeatherConditions> {
        self.get_current(lat, lon, WEATHER_FIELDS, false).await?.weather()
    }

    pub async fn get_heat(&self, lat: f64, lon: f64) -> Result<HeatConditions> {
        self.get_current(lat, lon, HEAT_FIELDS, false).await?.heat()
    }

    pub async fn get_rain(&self, lat: f64, lon: f64) -> Result<RainConditions> {
        self.get_current(lat, lon, RAIN_FIELDS, false).await?.rain()
    }

    /// Pressure and wind for cyclone scanning; wind is requested in knots
    pub async fn get_synoptic(&self, lat: f64, lon: f64) -> Result<SynopticSample> {
        self.get_current(lat, lon, SYNOPTIC_FIELDS, true).await?.synoptic()
    }
}

/// WMO weather interpretation codes
const WEATHER_CODES: &[(u16, &str)] = &[
    (0, "Clear sky"),
    (1, "Mainly clear"),
    (2, "Partly cloudy"),
    (3, "Overcast"),
    (45, "Fog"),
    (48, "Depositing rime fog"),
    (51, "Light drizzle"),
    (53, "Moderate drizzle"),
    (55, "Dense drizzle"),
    (56, "Light freezing drizzle"),
    (57, "Dense freezing drizzle"),
    (61, "Slight rain"),
    (63, "Moderate rain"),
    (65, "Heavy rain"),
    (66, "Light freezing rain"),
    (67, "Heavy freezing rain"),
    (71, "Slight snow fall"),
    (73, "Moderate snow fall"),
    (75, "Heavy snow fall"),
    (77, "Snow grains"),
    (80, "Slight rain showers"),
    (81, "Moderate rain showers"),
    (82, "Violent rain showers"),
    (85, "Slight snow showers"),
    (86, "Heavy snow showers"),
    (95, "Thunderstorm"),
    (96, "Thunderstorm with slight hail"),
    (99, "Thunderstorm with heavy hail"),
];

pub fn weather_description(code: u16) -> &'static str {
    WEATHER_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, text)| *text)
        .unwrap_or("Unknown")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RainIntensity {
    Light,
    Moderate,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RainEffect {
    pub intensity: RainIntensity,
    pub is_thunderstorm: bool,
}

/// Classify current rain for display: heavy above 10 mm, light below 2.5 mm
pub fn rain_effect(precipitation: f64, weather_code: u16) -> RainEffect {
    let intensity = if precipitation > 10.0 {
        RainIntensity::Heavy
    } else if precipitation > 0.0 && precipitation < 2.5 {
        RainIntensity::Light
    } else {
        RainIntensity::Moderate
    };

    RainEffect {
        intensity,
        is_thunderstorm: weather_code >= 95,
    }
}
