//! dxcore-probe - print the WDDM adapters and driver stores visible to WSL.
//!
//! Runs a single discovery pass and reports what a container runtime would
//! mount. Logs go to stderr; results go to stdout.

use anyhow::{Context, Result};
use clap::Parser;
use dxcore::{DiscoveryOptions, DxcoreConfig};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "dxcore-probe")]
#[command(about = "Discover WDDM adapters and their driver store paths via libdxcore")]
struct Args {
    /// Enumeration library name or path
    #[arg(long, default_value = DxcoreConfig::LIBRARY_NAME)]
    library: String,

    /// Minimum WDDM version code (2700 = WDDM 2.7)
    #[arg(long, default_value_t = DxcoreConfig::MIN_WDDM_VERSION)]
    min_wddm_version: u32,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Only print the directories to search for driver components
    #[arg(long)]
    paths: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Serialize)]
struct ProbeReport {
    adapters: Vec<dxcore::AdapterSummary>,
    mount_search_paths: Vec<PathBuf>,
    required_files: &'static [&'static str],
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let options = DiscoveryOptions::default()
        .with_library(&args.library)
        .with_min_wddm_version(args.min_wddm_version);

    let mut session = dxcore::discover(&options)
        .with_context(|| format!("failed to initialize dxcore from {}", options.library))?;

    if session.adapter_count() == 0 {
        warn!("No qualifying WDDM adapters found");
    } else {
        info!("Found {} qualifying WDDM adapters", session.adapter_count());
    }

    let report = ProbeReport {
        adapters: session.adapters().iter().map(|a| a.summary()).collect(),
        mount_search_paths: session.mount_search_paths(),
        required_files: dxcore::REQUIRED_DRIVER_STORE_FILES,
    };
    session.deinit_context();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if args.paths {
        for path in &report.mount_search_paths {
            println!("{}", path.display());
        }
    } else {
        for adapter in &report.adapters {
            println!(
                "hAdapter={} luid={} wddm={} driver_store={}",
                adapter.handle, adapter.luid, adapter.wddm_version, adapter.driver_store_path
            );
        }
    }

    Ok(())
}
