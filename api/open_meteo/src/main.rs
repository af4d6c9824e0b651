extern crate pretty_env_logger;
#[macro_use] extern crate log;

use open_meteo::{rain_effect, weather_description, OpenMeteoAPI};
use std::env;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    pretty_env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 4 {
        eprintln!("Usage: {} <command> <lat> <lon>", args[0]);
        eprintln!("Commands:");
        eprintln!("  weather   - Temperature, humidity, precipitation, wind, condition");
        eprintln!("  heat      - Temperature, humidity and apparent temperature");
        eprintln!("  rain      - Precipitation, rain and showers");
        eprintln!("  synoptic  - Surface pressure and wind speed (knots)");
        eprintln!("");
        eprintln!("Examples:");
        eprintln!("  {} heat 14.5176 121.0527", args[0]);
        eprintln!("  {} synoptic 12.0 128.0", args[0]);
        std::process::exit(1);
    }

    let command = &args[1];
    let lat: f64 = args[2].parse()?;
    let lon: f64 = args[3].parse()?;

    let api = OpenMeteoAPI::new()?;
    info!("Querying {} at ({}, {})", command, lat, lon);

    match command.as_str() {
        "weather" => {
            let w = api.get_weather(lat, lon).await?;
            println!("Temperature: {}°C", w.temperature);
            println!("Humidity: {}%", w.humidity);
            println!("Precipitation: {} mm", w.precipitation);
            println!("Wind speed: {} km/h", w.wind_speed);
            println!("Condition: {}", weather_description(w.weather_code));
        }
        "heat" => {
            let h = api.get_heat(lat, lon).await?;
            println!("Temperature: {}°C", h.temperature);
            println!("Humidity: {}%", h.humidity);
            println!("Apparent temperature: {}°C", h.apparent_temperature);
        }
        "rain" => {
            let r = api.get_rain(lat, lon).await?;
            let effect = rain_effect(r.precipitation, r.weather_code);
            println!("Condition: {}", weather_description(r.weather_code));
            println!("Precipitation: {} mm (rain {} mm, showers {} mm)", r.precipitation, r.rain, r.showers);
            println!("Intensity: {:?}, thunderstorm: {}", effect.intensity, effect.is_thunderstorm);
        }
        "synoptic" => {
            let s = api.get_synoptic(lat, lon).await?;
            println!("Surface pressure: {} hPa", s.surface_pressure);
            println!("Wind speed: {} kn", s.wind_speed_kn);
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }

    Ok(())
}
