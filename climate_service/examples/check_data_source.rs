use climate_service::analysis::window::window_start;
use climate_service::db::{self, DataSourceUrl};
use climate_service::store::ClimateStore;
use std::env;

fn main() {
    dotenv::dotenv().ok();
    let db_url = env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:///Resources/hawaii.sqlite".to_string());

    let url = DataSourceUrl::parse(&db_url).expect("DATABASE_URL should be a postgres or sqlite URL");
    println!("Connecting to {} data source", url.backend());

    let mut store = match db::connect_and_verify(&url) {
        Ok(store) => store,
        Err(e) => {
            println!("✗ {}", e);
            std::process::exit(1);
        }
    };
    println!("✓ Connected, station and measurement tables present");

    let result = store.snapshot(|q| {
        let stations = q.station_ids()?;
        let latest = q.latest_date()?;
        let most_active = q.most_active_station()?;
        Ok((stations, latest, most_active))
    });

    match result {
        Ok((stations, latest, most_active)) => {
            println!("✓ {} stations", stations.len());
            for station in &stations {
                println!("  - {}", station);
            }

            match latest {
                Some(latest) => {
                    println!("✓ Latest measurement: {}", latest);
                    match window_start(&latest) {
                        Ok(start) => println!("✓ Rolling window: {} .. {}", start, latest),
                        Err(e) => println!("✗ {}", e),
                    }
                }
                None => println!("✗ No measurements recorded"),
            }

            if let Some(station) = most_active {
                println!("✓ Most active station: {}", station);
            }
        }
        Err(e) => println!("✗ Query failed: {}", e),
    }
}
