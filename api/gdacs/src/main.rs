extern crate pretty_env_logger;
#[macro_use] extern crate log;

use gdacs::AdvisoryFeed;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let feed = match std::env::args().nth(1) {
        Some(url) => AdvisoryFeed::with_url(&url)?,
        None => AdvisoryFeed::new()?,
    };

    info!("🌀 Fetching advisory feed...");
    match feed.fetch_items().await {
        Ok(items) => {
            info!("✅ Advisory feed: {} items", items.len());
            for item in &items {
                match item.point {
                    Some((lat, lon)) => println!("[{:>7.2}, {:>7.2}] {}", lat, lon, item.title),
                    None => println!("[   --   ,   --   ] {}", item.title),
                }
            }
        }
        Err(e) => error!("❌ Advisory feed failed: {}", e),
    }

    Ok(())
}
