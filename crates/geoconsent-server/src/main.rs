//! geoconsent — edge interceptor that tells the consent banner whether to hide.

use std::path::PathBuf;
use std::sync::Arc;

use geoconsent_core::{classify_with_rule, ConsentTables, GatewayConfig};
use geoconsent_server::{routes, AppState, HttpOrigin};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Output of `geoconsent check`.
#[derive(Serialize)]
struct CheckReport<'a> {
    location: String,
    rule: &'a str,
    hide: &'a str,
}

/// Tables for the offline subcommands; no origin needs to be configured.
fn load_tables() -> anyhow::Result<ConsentTables> {
    match std::env::var("GEOCONSENT_TABLES_FILE") {
        Ok(path) => Ok(ConsentTables::load(&PathBuf::from(path))?),
        Err(_) => Ok(ConsentTables::default()),
    }
}

fn print_help() {
    println!("geoconsent — consent-banner geolocation cookie gateway");
    println!();
    println!("Usage: geoconsent [command]");
    println!();
    println!("Commands:");
    println!("  (none)                   Start the gateway");
    println!("  check <COUNTRY> [REGION] Print the decision for a location");
    println!("  debug-locations          List debug override tokens");
    println!("  help                     Show this help message");
    println!();
    println!("Environment:");
    println!("  GEOCONSENT_ORIGIN              Origin base URL (required to serve)");
    println!("  PORT                           Listen port (default 8787)");
    println!("  GEOCONSENT_TABLES_FILE         JSON jurisdiction tables");
    println!("  GEOCONSENT_TRUST_GEO_HEADERS   Honour edge geolocation headers");
    println!("  GEOCONSENT_COUNTRY_HEADER      Country header (default cf-ipcountry)");
    println!("  GEOCONSENT_REGION_HEADER       Region header (default cf-region-code)");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "check" => {
                if args.len() < 3 {
                    eprintln!("Usage: geoconsent check <COUNTRY> [REGION]");
                    std::process::exit(1);
                }
                let tables = load_tables()?;
                let country = args[2].to_uppercase();
                let region = args.get(3).map(|r| r.to_uppercase()).unwrap_or_default();
                let (decision, rule) =
                    classify_with_rule(&country, &region, &tables.policy, &tables.eu_countries);
                let report = CheckReport {
                    location: geoconsent_core::GeoContext::new(country, region).location_label(),
                    rule: rule.name(),
                    hide: decision.as_str(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            "debug-locations" => {
                let tables = load_tables()?;
                for (token, geo) in tables.debug_locations.iter() {
                    println!("{:<16} {}", token, geo.location_label());
                }
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'geoconsent help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal gateway startup
    let config = GatewayConfig::from_env()?;
    let tables = config.load_tables()?;
    let origin = HttpOrigin::new(&config.origin_url)?;
    let port = config.port;

    info!("Forwarding to origin {}", origin.base_url());
    if config.trust_geo_headers {
        info!(
            "Trusting edge geolocation headers {} / {}",
            config.country_header, config.region_header
        );
    } else {
        info!("Edge geolocation headers not trusted; visitors default to US");
    }

    let state = Arc::new(AppState::new(config, tables, Arc::new(origin)));
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("geoconsent listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
