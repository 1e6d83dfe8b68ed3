use std::{env, path::PathBuf};

use adcs_core::simulation::{Scenario, ScenarioConfig};
use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

/// Run the attitude estimator against a simulated spacecraft
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Scenario TOML file
    #[arg(short, long, default_value = "config/scenario.toml")]
    config: PathBuf,
}

fn main() -> Result<()> {
    // Default log level to "info"
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    pretty_env_logger::init();
    let args = Args::parse();

    let config = ScenarioConfig::from_file(&args.config)
        .with_context(|| format!("Cannot load scenario {}", args.config.display()))?;
    info!(
        "Scenario: {:.1} s at {:.3} s ticks, update interval {:.3} s, seed {}",
        config.duration, config.tick_period, config.adcs.update_interval, config.seed
    );

    let mut scenario = Scenario::new(config)?;
    let report = scenario.run();

    info!("Ticks:                {}", report.ticks);
    info!("Updates:              {}", report.updates);
    info!("  sun:                {}", report.sun_updates);
    info!("  magnetometer:       {}", report.magnetometer_updates);
    info!("TRIAD failures:       {}", report.triad_failures);
    info!("Degraded MEKF steps:  {}", report.degraded_updates);
    info!("Final error:          {:.3e} rad", report.final_error);
    info!("Max settled error:    {:.3e} rad", report.max_error_after_settling);

    if report.degraded_updates > 0 {
        warn!("{} updates skipped the MEKF correction", report.degraded_updates);
    }

    Ok(())
}
