extern crate pretty_env_logger;
#[macro_use] extern crate log;

use std::env;
use std::sync::Arc;

use overlay_engine::mode::ALL_MODES;
use overlay_engine::{load_regions_from_file, DataSources, LoggingSurface, Mode, OverlayConfig, OverlayEngine};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    pretty_env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <boundary.geojson> [overlay.json]", args[0]);
        eprintln!("");
        eprintln!("Loads the barangay boundaries, warms the elevation cache and walks");
        eprintln!("through every overlay mode, logging the map commands produced.");
        eprintln!("Set RUST_LOG=info to see them.");
        std::process::exit(1);
    }

    let config = OverlayConfig::load(args.get(2).map(String::as_str).unwrap_or("overlay.json"))?;
    let regions = load_regions_from_file(&args[1])?;
    if regions.is_empty() {
        error!("No usable regions in {}", args[1]);
        std::process::exit(1);
    }

    let sources = DataSources::from_config(&config)?;
    let engine = OverlayEngine::new(regions, &config, sources, Arc::new(LoggingSurface));

    info!("Starting overlay walkthrough for {} regions...", engine.regions().len());
    engine.present();
    engine.warm_up_elevation().await;

    let first = engine.regions()[0].psgc.clone();
    for mode in ALL_MODES.iter().copied().filter(|m| *m != Mode::None) {
        engine.activate(mode).await;
        engine.click_region(&first).await;

        match engine.display() {
            Some(display) => println!("{:<10} {}", mode.name(), serde_json::to_string(&display)?),
            None => println!("{:<10} (no display record)", mode.name()),
        }
        if mode == Mode::Par {
            for cyclone in engine.cyclones() {
                println!(
                    "           {} [{:.2}, {:.2}] {} {:.0} km/h",
                    cyclone.name,
                    cyclone.lat,
                    cyclone.lon,
                    cyclone.stage.label(),
                    cyclone.wind_speed_kmh
                );
            }
        }

        engine.reset_selection();
        engine.activate(mode).await;
    }

    info!("Walkthrough finished in mode {}", engine.mode().name());
    Ok(())
}
