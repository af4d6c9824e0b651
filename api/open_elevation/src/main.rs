extern crate pretty_env_logger;
#[macro_use] extern crate log;

use open_elevation::OpenElevationAPI;
use std::env;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    pretty_env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <lat> <lon>", args[0]);
        eprintln!("");
        eprintln!("Examples:");
        eprintln!("  {} 14.5176 121.0527", args[0]);
        std::process::exit(1);
    }

    let lat: f64 = match args[1].parse() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("Invalid latitude: {}", args[1]);
            std::process::exit(1);
        }
    };
    let lon: f64 = match args[2].parse() {
        Ok(v) => v,
        Err(_) => {
            eprintln!("Invalid longitude: {}", args[2]);
            std::process::exit(1);
        }
    };

    let api = OpenElevationAPI::new()?;

    info!("Looking up elevation at ({}, {})", lat, lon);
    let elevation = api.fetch_elevation(lat, lon).await?;

    println!("Elevation: {:.2} meters", elevation);

    Ok(())
}
