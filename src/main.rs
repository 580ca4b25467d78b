// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Terminal front-end for the live aircraft view.

mod config;
mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use tokio::sync::broadcast::error::RecvError;

use config::AppConfig;
use live_tracks::{
    filter_recent, AircraftSource, HttpSource, LiveFrame, LiveView, Now, TrackBuffers, TrackConfig,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Debug, Parser)]
#[command(name = "airjedi-live", version, about = "Live aircraft positions and track history")]
struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long)]
    server: Option<String>,

    /// Poll interval in seconds (overrides the config file)
    #[arg(long)]
    interval: Option<u64>,

    /// Minutes after which an aircraft is no longer live (overrides the config file)
    #[arg(long)]
    max_age: Option<u32>,

    /// Use this config file instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Persist the effective settings back to the config file
    #[arg(long)]
    save: bool,

    /// Hide track history in reports
    #[arg(long)]
    no_tracks: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Poll continuously and print a report after every update (default)
    Watch,
    /// Fetch a single snapshot and print it
    Once {
        /// Print the live aircraft as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the detailed server-side track of one aircraft
    Track {
        /// ICAO 24-bit address
        icao: String,
    },
    /// Print the location of the config file
    ConfigPath,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Some(Command::ConfigPath) = cli.command {
        let path = cli.config.map_or_else(AppConfig::get_config_path, Ok)?;
        println!("{}", path.display());
        return Ok(());
    }

    let config = effective_config(&cli)?;
    config.validate()?;
    if cli.save {
        config.save(cli.config.as_deref())?;
        info!("Configuration saved");
    }

    let source = HttpSource::new(&config.server_url, config.request_timeout())?;
    info!("Using backend {}", source.base_url());

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => watch(source, &config).await,
        Command::Once { json } => once(&source, &config, json).await?,
        Command::Track { icao } => {
            let samples = source.fetch_track(&icao).await?;
            print!("{}", report::render_track(&icao, &samples));
        }
        Command::ConfigPath => {}
    }

    Ok(())
}

/// Load the config file and apply command line overrides
fn effective_config(cli: &Cli) -> Result<AppConfig, config::ConfigError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(server) = &cli.server {
        config.server_url.clone_from(server);
    }
    if let Some(interval) = cli.interval {
        config.poll_interval_secs = interval;
    }
    if let Some(max_age) = cli.max_age {
        config.max_age_minutes = max_age;
    }
    if cli.no_tracks {
        config.show_tracks = false;
    }
    Ok(config)
}

async fn watch(source: HttpSource, config: &AppConfig) {
    let view = LiveView::spawn(source, config.live_config());
    let mut frames = view.watch_frames();
    let mut events = view.subscribe();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    warn!("Live view stopped");
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                print!("{}", report::render_frame(&frame, config.show_tracks));
            }
            event = events.recv() => match event {
                Ok(event) => debug!("{:?}", event),
                Err(RecvError::Lagged(skipped)) => debug!("Skipped {} track events", skipped),
                Err(RecvError::Closed) => {}
            },
            _ = &mut ctrl_c => {
                info!("Interrupted, shutting down");
                break;
            }
        }
    }

    view.shutdown();
}

async fn once(
    source: &HttpSource,
    config: &AppConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = source.fetch_aircraft().await?;
    let now = Now::utc();
    let max_age_minutes = f64::from(config.max_age_minutes);

    let live = filter_recent(&snapshot, now.seconds(), max_age_minutes);
    if json {
        println!("{}", serde_json::to_string_pretty(&live)?);
        return Ok(());
    }

    let tracks = TrackBuffers::new()
        .update(&snapshot, now, max_age_minutes, &TrackConfig::default())
        .buffers;
    let frame = LiveFrame {
        snapshot,
        live,
        tracks,
        last_updated: now.to_datetime(),
        max_age_minutes,
        computed_at: Some(now),
        generation: 1,
        ..LiveFrame::default()
    };
    print!("{}", report::render_frame(&frame, config.show_tracks));
    Ok(())
}
