//! Application entry point for the cave generation viewer.
//!
//! This binary parses the command line, loads the configuration and hands
//! everything else to [`Viewer`] from the `viewer` module.

mod viewer;

use std::{fs, path::PathBuf};

use anyhow::{Context, anyhow};
use cave_core::CaveConfig;
use clap::Parser;

use viewer::Viewer;

#[derive(Parser, Debug)]
#[command(name = "cave-view", about = "Interactive procedural cave viewer")]
struct Args {
    /// RON file with a `CaveConfig`; missing fields take their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured seed.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Generation attempts per pass, each with the next seed.
    #[arg(short, long, default_value_t = 5)]
    retries: usize,

    /// Prints the effective configuration as RON and exits.
    #[arg(long)]
    print_config: bool,
}

fn load_config(args: &Args) -> anyhow::Result<CaveConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            CaveConfig::from_ron_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => CaveConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    Ok(cfg)
}

/// Starts the native eframe application.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if the configuration cannot be loaded or eframe fails to create
///   the native window or event loop.
fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let cfg = load_config(&args)?;

    if args.print_config {
        println!("{}", cfg.to_ron_string()?);
        return Ok(());
    }

    let options = eframe::NativeOptions::default();
    let retries = args.retries;
    eframe::run_native(
        "Cave Generator",
        options,
        Box::new(move |_cc| Ok(Box::new(Viewer::new(cfg, retries)))),
    )
    .map_err(|e| anyhow!("viewer failed: {e}"))
}
