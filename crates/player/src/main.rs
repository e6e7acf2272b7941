//! `learnpath-player` -- replays a scripted learning session.
//!
//! Loads a catalog and a list of playback / progress steps from a JSON
//! scenario file, drives a simulated media resource through them, and
//! prints the resulting progress report.
//!
//! # Environment variables
//!
//! | Variable                   | Required | Default  | Description                         |
//! |----------------------------|----------|----------|-------------------------------------|
//! | `LEARNPATH_SCENARIO`       | yes      | --       | Path to the scenario JSON file      |
//! | `LEARNPATH_OUTPUT`         | no       | `pretty` | Report format: `pretty` or `json`   |
//! | `LEARNPATH_ECHO_SNAPSHOTS` | no       | `false`  | Log every playback snapshot at info |

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use learnpath_player::config::{OutputFormat, PlayerConfig};
use learnpath_player::replay;
use learnpath_player::scenario::Scenario;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = PlayerConfig::from_env();
    let json_logs = matches!(&config, Ok(c) if c.output == OutputFormat::Json);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "learnpath_player=info,learnpath_playback=info,learnpath_progress=info".into()
            }),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json_logs).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    let result = match config {
        Ok(config) => run(config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        tracing::error!("learnpath-player failed: {e:#}");
        std::process::exit(1);
    }
}

async fn run(config: PlayerConfig) -> anyhow::Result<()> {
    tracing::info!(
        scenario = %config.scenario.display(),
        output = config.output.as_str(),
        "Starting learnpath-player",
    );

    let raw = tokio::fs::read_to_string(&config.scenario)
        .await
        .with_context(|| format!("reading scenario {}", config.scenario.display()))?;
    let scenario = Scenario::from_json(&raw).context("parsing scenario")?;

    let report = replay::run(scenario, config.echo_snapshots)?;

    match config.output {
        OutputFormat::Pretty => print!("{}", report.render_pretty()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}
