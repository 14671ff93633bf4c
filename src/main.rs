// Entry point: read the optional config, run the pipeline once, print previews.
use anyhow::{Context, Result};
use ev_charging_eda::config::{load_config, CONFIG_FILE};
use ev_charging_eda::pipeline;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config =
        load_config(CONFIG_FILE).with_context(|| format!("failed to load config {CONFIG_FILE}"))?;
    let run = pipeline::run(&config).context("EV charging analysis failed")?;
    pipeline::print_report(&config, &run);
    Ok(())
}
