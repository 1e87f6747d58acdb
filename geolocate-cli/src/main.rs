use anyhow::{Context, Result};
use geolocate_core::{CoordinateCache, Resolver, ResolverConfig, RetryPolicy};
use std::time::Duration;

mod cli;
mod names;
mod output;

#[tokio::main]
async fn main() -> Result<()> {
    // Settings may come from a .env file next to the input data
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {}", e);
        }
    }

    let args = cli::parse_args();
    init_logger(args.verbose);

    let names = names::read_names(&args.input, &args.column)?;

    let config = ResolverConfig {
        requests_per_second: args.qps,
        max_in_flight: args.max_in_flight(),
        request_timeout: Duration::from_secs(args.timeout),
        retry: RetryPolicy::default(),
    };

    let cache = CoordinateCache::new(args.cache_path.clone());
    let resolver = Resolver::with_places_api(args.url.clone(), args.api_key.clone(), cache, &config)
        .context("Failed to set up geocoding client")?;

    let report = resolver.resolve_until(&names, shutdown_signal()).await;

    output::write_csv(&report, &args.output)?;
    if let Some(json_path) = &args.json {
        output::write_json(&report, json_path)?;
    }

    log::info!("Processing complete!");
    Ok(())
}

/// Initialize logging; RUST_LOG wins, otherwise -v selects debug
fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .filter_module("reqwest", log::LevelFilter::Warn)
        .filter_module("hyper", log::LevelFilter::Warn)
        .filter_module("rustls", log::LevelFilter::Warn)
        .init();
}

/// Completes on Ctrl-C. Never completes if the handler cannot be installed.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => log::warn!("Received Ctrl-C, stopping outstanding lookups"),
        Err(e) => {
            log::warn!("Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
