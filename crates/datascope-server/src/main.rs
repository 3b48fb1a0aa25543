//! DataScope — sensitive-data discovery and privacy-module catalog server.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use datascope_core::DataScopeConfig;
use datascope_store::{Fixture, SqliteStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("DATASCOPE_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()));
            if let Some(dir) = exe_dir {
                let parent_data = dir.join("../data");
                if parent_data.exists() {
                    return parent_data;
                }
            }
            PathBuf::from("data")
        })
}

fn open_state() -> anyhow::Result<Arc<AppState>> {
    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = DataScopeConfig::from_env(&data_dir)?;
    let store = SqliteStore::open(&config.data_paths.db)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;
    let state = AppState::new(config, Arc::new(store))?;
    Ok(Arc::new(state))
}

fn print_help() {
    println!("DataScope — sensitive data discovery server");
    println!();
    println!("Usage: datascope [command]");
    println!();
    println!("Commands:");
    println!("  (none)                   Start the server");
    println!("  scan [connectionID...]   Print sensitive data found (JSON)");
    println!("  import <fixture.json>    Load namespaces, modules and records");
    println!("  help                     Show this help message");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    // Handle CLI subcommands
    if args.len() > 1 {
        match args[1].as_str() {
            "scan" => {
                let state = open_state()?;
                let payload = state.privacy.sensitive_data_list(&args[2..])?;
                println!("{}", serde_json::to_string_pretty(&payload)?);
                return Ok(());
            }
            "import" => {
                let Some(path) = args.get(2) else {
                    eprintln!("Usage: datascope import <fixture.json>");
                    std::process::exit(1);
                };
                let state = open_state()?;
                let fixture = Fixture::load(std::path::Path::new(path))
                    .with_context(|| format!("Failed to read fixture {}", path))?;
                let summary = fixture.import(&state.store)?;
                println!(
                    "Imported {} connections, {} namespaces, {} modules, {} records",
                    summary.connections, summary.namespaces, summary.modules, summary.records
                );
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("Unknown command: {}. Use 'datascope help' for usage.", args[1]);
                std::process::exit(1);
            }
        }
    }

    // Normal server startup
    let state = open_state()?;
    let port = state.config.port;

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("DataScope server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
