use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::Parser;
use tracing::Level;

use pixel_editor::{config::Config, ui};

/// Load an image and watch its colors crawl.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); overrides the config file.
    #[arg(short, long)]
    log_level: Option<String>,

    /// Image to load at startup.
    image: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(fname) => Config::load(fname)
            .with_context(|| format!("unable to configure from {}", fname.display()))?,
        None => Config::default(),
    };

    let level = cli.log_level.as_deref().unwrap_or(&cfg.log_level);
    let level = Level::from_str(level)
        .with_context(|| format!("bad log level {:?}", level))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    ui::run(&cfg, cli.image);
    Ok(())
}
